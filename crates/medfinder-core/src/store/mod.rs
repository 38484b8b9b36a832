//! Key-value persistence
//!
//! Registry, index, user data and sync history are persisted as serialized
//! strings under fixed keys. The substrate may be missing or failing; callers
//! go through [`StoreHandle`], which degrades to memory instead of erroring.

mod handle;
mod sqlite;

pub use handle::{StoreEvent, StoreHandle};
pub use sqlite::SqliteStore;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::RwLock;

/// Fixed persistence keys
pub mod keys {
    pub const REGISTRY: &str = "medfinder.registry";
    pub const SEARCH_INDEX: &str = "medfinder.search_index";
    pub const USER_DATA: &str = "medfinder.user_data";
    pub const SYNC_HISTORY: &str = "medfinder.sync_history";
    pub const DEVICE: &str = "medfinder.device";

    pub const ALL: [&str; 5] = [REGISTRY, SEARCH_INDEX, USER_DATA, SYNC_HISTORY, DEVICE];
}

const PROBE_KEY: &str = "medfinder.__probe__";

/// String key-value substrate
pub trait KeyValueStore: Send + Sync {
    /// Store type identifier (e.g., "memory", "sqlite")
    fn store_type(&self) -> &'static str;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Write, read back and delete a scratch key
    fn probe(&self) -> Result<()> {
        self.set(PROBE_KEY, "1")?;
        let read = self.get(PROBE_KEY)?;
        self.remove(PROBE_KEY)?;
        match read.as_deref() {
            Some("1") => Ok(()),
            _ => Err(crate::error::MedfinderError::StorageUnavailable(
                "probe value did not round-trip".to_string(),
            )),
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn store_type(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());
        entries.remove(key);
        Ok(())
    }
}
