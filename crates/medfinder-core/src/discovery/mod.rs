//! Document discovery
//!
//! The site has no directory API, so every category folder is probed:
//! first for a server-generated listing, then for a fixed set of likely
//! filenames. A candidate that fails for any reason simply does not exist.

use crate::category::{Category, ALL_CATEGORIES, GENERIC_CANDIDATES};
use crate::config::ProbeConfig;
use crate::error::{MedfinderError, Result};
use crate::extract::extract_metadata;
use crate::fetch::{join_path, DocumentFetcher};
use crate::html::HtmlDocument;
use crate::registry::{ModuleRecord, ModuleRegistry};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Discovery result for one category
#[derive(Debug, Clone)]
pub struct CategoryScan {
    pub category: Category,
    pub modules: Vec<ModuleRecord>,
    pub candidates_checked: usize,
    pub used_listing: bool,
}

/// Per-category counts reported after a scan
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub modules: usize,
    pub candidates_checked: usize,
    pub used_listing: bool,
}

/// Outcome of a full scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub registry: ModuleRegistry,
    pub categories: Vec<CategorySummary>,
    pub candidates_checked: usize,
    pub duration: Duration,
}

impl ScanReport {
    pub fn total_modules(&self) -> usize {
        self.registry.total_modules()
    }
}

/// Probes category folders for documents
pub struct DocumentProbe {
    fetcher: Arc<dyn DocumentFetcher>,
    config: ProbeConfig,
}

impl DocumentProbe {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, config: ProbeConfig) -> Self {
        Self { fetcher, config }
    }

    async fn with_timeout<T>(&self, path: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(MedfinderError::Timeout {
                path: path.to_string(),
                secs: self.config.timeout_secs,
            }),
        }
    }

    fn is_document(&self, name: &str) -> bool {
        let suffix = format!(".{}", self.config.extension.to_lowercase());
        name.to_lowercase().ends_with(&suffix)
    }

    /// Generic names followed by the category's own names, deduplicated
    pub fn fallback_candidates(&self, category: Category) -> Vec<String> {
        let mut seen = HashSet::new();
        GENERIC_CANDIDATES
            .iter()
            .chain(category.candidates().iter())
            .map(|stem| format!("{}.{}", stem, self.config.extension))
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// File names from a directory listing, `None` when no usable listing exists
    pub async fn list_directory(&self, category: Category) -> Option<Vec<String>> {
        let folder = format!("{}/", category.folder());
        let listing = self
            .with_timeout(&folder, self.fetcher.get(&folder))
            .await
            .ok()?;
        let doc = HtmlDocument::parse(&listing.body).ok()?;

        let mut seen = HashSet::new();
        let files: Vec<String> = doc
            .links()
            .into_iter()
            .filter_map(|href| {
                let href = href.split(['?', '#']).next().unwrap_or("").to_string();
                let name = href.rsplit('/').next().unwrap_or("").to_string();
                (!name.is_empty() && self.is_document(&name)).then_some(name)
            })
            .filter(|name| seen.insert(name.clone()))
            .collect();

        (!files.is_empty()).then_some(files)
    }

    /// Candidate file names for a category and whether they came from a listing
    pub async fn candidates(&self, category: Category) -> (Vec<String>, bool) {
        if self.config.use_directory_listing {
            if let Some(files) = self.list_directory(category).await {
                debug!(category = %category, files = files.len(), "using directory listing");
                return (files, true);
            }
        }
        (self.fallback_candidates(category), false)
    }

    /// Check one path and build its record; every failure means "absent"
    pub async fn probe(&self, path: &str, category: Category) -> Option<ModuleRecord> {
        match self.try_probe(path, category).await {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(path, error = %e, "candidate absent");
                None
            }
        }
    }

    async fn try_probe(&self, path: &str, category: Category) -> Result<ModuleRecord> {
        let head = self.with_timeout(path, self.fetcher.head(path)).await?;
        let doc = self.with_timeout(path, self.fetcher.get(path)).await?;
        let html = HtmlDocument::parse(&doc.body)?;
        let metadata = extract_metadata(&html, path);

        let last_modified = doc
            .last_modified
            .or(head.last_modified)
            .unwrap_or_else(Utc::now);
        Ok(ModuleRecord::from_metadata(
            path,
            category,
            metadata,
            last_modified,
            doc.size(),
        ))
    }

    /// Probe every candidate of one category concurrently
    pub async fn discover(&self, category: Category) -> CategoryScan {
        let (files, used_listing) = self.candidates(category).await;
        let paths: Vec<String> = files
            .iter()
            .map(|f| join_path(category.folder(), f))
            .collect();

        let probes = paths.iter().map(|path| self.probe(path, category));
        let modules: Vec<ModuleRecord> = join_all(probes).await.into_iter().flatten().collect();

        debug!(
            category = %category,
            found = modules.len(),
            checked = paths.len(),
            "category probed"
        );
        CategoryScan {
            category,
            modules,
            candidates_checked: paths.len(),
            used_listing,
        }
    }

    /// Probe all categories concurrently and assemble a fresh registry
    pub async fn scan_all(&self) -> ScanReport {
        let started = Instant::now();
        let scans = join_all(ALL_CATEGORIES.iter().map(|c| self.discover(*c))).await;

        let categories: Vec<CategorySummary> = scans
            .iter()
            .map(|s| CategorySummary {
                category: s.category,
                modules: s.modules.len(),
                candidates_checked: s.candidates_checked,
                used_listing: s.used_listing,
            })
            .collect();
        let candidates_checked = scans.iter().map(|s| s.candidates_checked).sum();
        let registry = ModuleRegistry::from_records(scans.into_iter().flat_map(|s| s.modules));

        info!(
            modules = registry.total_modules(),
            candidates = candidates_checked,
            "scan complete"
        );
        ScanReport {
            registry,
            categories,
            candidates_checked,
            duration: started.elapsed(),
        }
    }
}
