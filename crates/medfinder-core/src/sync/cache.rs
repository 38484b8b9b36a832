//! Offline document cache collaborator

use crate::error::Result;

/// Stores documents for offline use; the caching policy lives elsewhere
#[async_trait::async_trait]
pub trait DocumentCache: Send + Sync {
    /// Fetch and keep a copy of `path`
    async fn cache_document(&self, path: &str) -> Result<()>;

    /// Bytes currently held
    async fn cache_size(&self) -> Result<u64>;
}

/// Cache that stores nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait::async_trait]
impl DocumentCache for NoopCache {
    async fn cache_document(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn cache_size(&self) -> Result<u64> {
        Ok(0)
    }
}
