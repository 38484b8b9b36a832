//! Error types for medfinder

use thiserror::Error;

/// Result type alias using MedfinderError
pub type Result<T> = std::result::Result<T, MedfinderError>;

/// Error type alias for convenience
pub type Error = MedfinderError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for medfinder
#[derive(Debug, Error)]
pub enum MedfinderError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Timed out after {secs}s: {path}")]
    Timeout { path: String, secs: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid backup: {0}")]
    InvalidBackup(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl MedfinderError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::DocumentNotFound(_) | Self::ModuleNotFound(_) => exit_codes::NOT_FOUND,
            Self::UnknownCategory(_)
            | Self::InvalidBackup(_)
            | Self::InvalidInput(_)
            | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// True for failures that mean "this document is not there right now"
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::DocumentNotFound(_) | Self::Fetch(_) | Self::Timeout { .. } | Self::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            MedfinderError::ModuleNotFound("x".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            MedfinderError::InvalidBackup("missing version".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            MedfinderError::Parse("bad".into()).exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = MedfinderError::Timeout {
            path: "diagnostik/index.html".into(),
            secs: 10,
        };
        assert_eq!(err.to_string(), "Timed out after 10s: diagnostik/index.html");
        assert!(err.is_absent());
    }
}
