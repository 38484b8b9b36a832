//! Document fetching
//!
//! Provides a unified interface for retrieving reference pages:
//! - HTTP(S) origins via reqwest
//! - A static site root on the local file system
//! - An in-memory map (tests, fixtures, offline bundles)

mod file;
mod http;

pub use file::FileFetcher;
pub use http::HttpFetcher;

use crate::config::SourceConfig;
use crate::error::{MedfinderError, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Result of an existence-only request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentHead {
    pub last_modified: Option<DateTime<Utc>>,
    pub content_length: Option<u64>,
}

/// A fully retrieved document
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub path: String,
    pub body: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_length: Option<u64>,
}

impl FetchedDocument {
    /// Declared length, or the body length when the source did not say
    pub fn size(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }
}

/// Source of documents addressed by site-relative paths
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetcher type identifier (e.g., "http", "file", "memory")
    fn fetcher_type(&self) -> &'static str;

    /// Check that `path` exists without downloading it
    async fn head(&self, path: &str) -> Result<DocumentHead>;

    /// Download `path`
    async fn get(&self, path: &str) -> Result<FetchedDocument>;
}

/// Build the fetcher matching a configured source
pub fn fetcher_for(source: &SourceConfig) -> Result<Arc<dyn DocumentFetcher>> {
    if source.is_remote() {
        Ok(Arc::new(HttpFetcher::new(&source.location)?))
    } else {
        Ok(Arc::new(FileFetcher::new(&source.location)))
    }
}

/// Join a folder and a file name with exactly one slash
pub fn join_path(folder: &str, file: &str) -> String {
    format!(
        "{}/{}",
        folder.trim_end_matches('/'),
        file.trim_start_matches('/')
    )
}

#[derive(Debug, Clone)]
struct MemoryDocument {
    body: String,
    last_modified: DateTime<Utc>,
}

/// In-memory document source
#[derive(Default)]
pub struct MemoryFetcher {
    documents: RwLock<HashMap<String, MemoryDocument>>,
    failing: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    requests: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryFetcher::insert`]
    pub fn with_document(self, path: &str, body: &str) -> Self {
        self.insert(path, body);
        self
    }

    /// Add or replace a document; its modification time becomes "now"
    pub fn insert(&self, path: &str, body: &str) {
        self.insert_at(path, body, Utc::now());
    }

    /// Add or replace a document with an explicit modification time
    pub fn insert_at(&self, path: &str, body: &str, last_modified: DateTime<Utc>) {
        if let Ok(mut docs) = self.documents.write() {
            docs.insert(
                normalize(path),
                MemoryDocument {
                    body: body.to_string(),
                    last_modified,
                },
            );
        }
    }

    pub fn remove(&self, path: &str) {
        if let Ok(mut docs) = self.documents.write() {
            docs.remove(&normalize(path));
        }
    }

    /// Make every request for `path` fail with a fetch error
    pub fn fail(&self, path: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert(normalize(path));
        }
    }

    /// Delay every request for `path`
    pub fn delay(&self, path: &str, delay: Duration) {
        if let Ok(mut delays) = self.delays.write() {
            delays.insert(normalize(path), delay);
        }
    }

    /// Number of head/get requests served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn lookup(&self, path: &str) -> Result<MemoryDocument> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let key = normalize(path);

        let delay = self.delays.read().ok().and_then(|d| d.get(&key).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing
            .read()
            .map(|f| f.contains(&key))
            .unwrap_or(false);
        if failing {
            return Err(MedfinderError::Fetch(format!("simulated failure: {}", path)));
        }

        self.documents
            .read()
            .ok()
            .and_then(|docs| docs.get(&key).cloned())
            .ok_or_else(|| MedfinderError::DocumentNotFound(path.to_string()))
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

#[async_trait::async_trait]
impl DocumentFetcher for MemoryFetcher {
    fn fetcher_type(&self) -> &'static str {
        "memory"
    }

    async fn head(&self, path: &str) -> Result<DocumentHead> {
        let doc = self.lookup(path).await?;
        Ok(DocumentHead {
            last_modified: Some(doc.last_modified),
            content_length: Some(doc.body.len() as u64),
        })
    }

    async fn get(&self, path: &str) -> Result<FetchedDocument> {
        let doc = self.lookup(path).await?;
        Ok(FetchedDocument {
            path: path.to_string(),
            content_length: Some(doc.body.len() as u64),
            last_modified: Some(doc.last_modified),
            body: doc.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("diagnostik/", "/index.html"), "diagnostik/index.html");
        assert_eq!(join_path("diagnostik", "index.html"), "diagnostik/index.html");
    }

    #[tokio::test]
    async fn test_memory_fetcher() {
        let fetcher = MemoryFetcher::new().with_document("/a/b.html", "<p>x</p>");
        assert!(fetcher.head("a/b.html").await.is_ok());
        assert_eq!(fetcher.get("a/b.html").await.unwrap().size(), 8);

        let missing = fetcher.get("a/c.html").await.unwrap_err();
        assert!(matches!(missing, MedfinderError::DocumentNotFound(_)));

        fetcher.fail("a/b.html");
        assert!(fetcher.get("a/b.html").await.unwrap_err().is_absent());
        assert_eq!(fetcher.requests(), 4);
    }

    #[test]
    fn test_fetcher_for_source() {
        let remote = SourceConfig {
            location: "https://example.org/lernmodule/".to_string(),
        };
        assert_eq!(fetcher_for(&remote).unwrap().fetcher_type(), "http");

        let local = SourceConfig {
            location: "/srv/site".to_string(),
        };
        assert_eq!(fetcher_for(&local).unwrap().fetcher_type(), "file");
    }
}
