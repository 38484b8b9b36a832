//! Configuration management

use crate::error::Result;
use crate::search::SearchOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Where the reference pages live (URL or local directory)
    #[serde(default)]
    pub source: SourceConfig,

    /// Candidate probing
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Index building
    #[serde(default)]
    pub index: IndexConfig,

    /// Default search options
    #[serde(default)]
    pub search: SearchConfig,

    /// Cross-device synchronization
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Document source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL (`http://`, `https://`) or path to a local site root
    pub location: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            location: std::env::var("MEDFINDER_SOURCE")
                .unwrap_or_else(|_| "http://localhost:8080/".to_string()),
        }
    }
}

impl SourceConfig {
    /// True when the source should be fetched over HTTP
    pub fn is_remote(&self) -> bool {
        self.location.starts_with("http://") || self.location.starts_with("https://")
    }
}

/// Candidate probing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Timeout for existence checks and metadata fetches
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Try a directory listing before falling back to candidate names
    #[serde(default = "default_true")]
    pub use_directory_listing: bool,

    /// Extension of probed documents
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            use_directory_listing: true,
            extension: default_extension(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Index build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Documents fetched concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    #[serde(default = "default_batch_pause")]
    pub batch_pause_ms: u64,

    /// Timeout for one document fetch
    #[serde(default = "default_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_pause_ms: default_batch_pause(),
            fetch_timeout_secs: default_timeout(),
        }
    }
}

impl IndexConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Search defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_true")]
    pub fuzzy_enabled: bool,

    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    #[serde(default = "default_max_fuzzy_checks")]
    pub max_fuzzy_checks: usize,

    #[serde(default = "default_true")]
    pub include_excerpts: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            fuzzy_enabled: true,
            fuzzy_threshold: default_fuzzy_threshold(),
            max_fuzzy_checks: default_max_fuzzy_checks(),
            include_excerpts: true,
        }
    }
}

impl SearchConfig {
    /// Search options seeded from these defaults
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.max_results,
            category: None,
            fuzzy_enabled: self.fuzzy_enabled,
            include_excerpts: self.include_excerpts,
            fuzzy_threshold: self.fuzzy_threshold,
            max_fuzzy_checks: self.max_fuzzy_checks,
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval for periodic full syncs
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    /// Number of sync events kept in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Ask the offline cache to store newly discovered documents
    #[serde(default)]
    pub precache: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            history_limit: default_history_limit(),
            precache: false,
        }
    }
}

impl SyncConfig {
    /// Period between syncs, never shorter than one second
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_extension() -> String {
    "html".to_string()
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_pause() -> u64 {
    100
}

fn default_max_results() -> usize {
    20
}

fn default_fuzzy_threshold() -> f64 {
    0.7
}

fn default_max_fuzzy_checks() -> usize {
    1000
}

fn default_sync_interval() -> u64 {
    300
}

fn default_history_limit() -> usize {
    50
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from a specific path, defaults when the file is absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}
