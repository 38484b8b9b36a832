//! Availability-checked store access with change notification

use super::{KeyValueStore, MemoryStore};
use crate::error::MedfinderError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 64;

/// A key was written or removed by some execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub origin: u64,
}

/// One execution context's view of a shared store.
///
/// When the substrate is missing or starts failing, the handle switches to a
/// private in-memory store for the rest of its life and logs a warning.
pub struct StoreHandle {
    backend: Arc<dyn KeyValueStore>,
    fallback: MemoryStore,
    degraded: AtomicBool,
    context: u64,
    contexts: Arc<AtomicU64>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreHandle {
    /// Probe `backend` and wrap it; an unusable backend yields a degraded handle
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let handle = Self {
            backend,
            fallback: MemoryStore::new(),
            degraded: AtomicBool::new(false),
            context: 0,
            contexts: Arc::new(AtomicU64::new(0)),
            events,
        };
        handle.check_available();
        handle
    }

    /// Handle over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Sibling handle for another execution context on the same substrate
    pub fn attach_context(&self) -> Self {
        let handle = Self {
            backend: Arc::clone(&self.backend),
            fallback: MemoryStore::new(),
            degraded: AtomicBool::new(false),
            context: self.contexts.fetch_add(1, Ordering::SeqCst) + 1,
            contexts: Arc::clone(&self.contexts),
            events: self.events.clone(),
        };
        handle.check_available();
        handle
    }

    fn check_available(&self) {
        if let Err(e) = self.backend.probe() {
            self.degrade(&e);
        }
    }

    fn degrade(&self, error: &MedfinderError) {
        if !self.degraded.swap(true, Ordering::SeqCst) {
            warn!(
                store = self.backend.store_type(),
                context = self.context,
                error = %error,
                "persistence unavailable, continuing in memory"
            );
        }
    }

    pub fn context_id(&self) -> u64 {
        self.context
    }

    pub fn is_available(&self) -> bool {
        !self.degraded.load(Ordering::SeqCst)
    }

    pub fn store_type(&self) -> &'static str {
        if self.is_available() {
            self.backend.store_type()
        } else {
            self.fallback.store_type()
        }
    }

    /// Events from every context sharing this substrate, own writes included
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.is_available() {
            match self.backend.get(key) {
                Ok(value) => return value,
                Err(e) => self.degrade(&e),
            }
        }
        self.fallback.get(key).ok().flatten()
    }

    /// Write `value`; returns whether it reached the shared substrate
    pub fn set(&self, key: &str, value: &str) -> bool {
        if self.is_available() {
            match self.backend.set(key, value) {
                Ok(()) => {
                    self.publish(key);
                    return true;
                }
                Err(e) => self.degrade(&e),
            }
        }
        let _ = self.fallback.set(key, value);
        false
    }

    pub fn remove(&self, key: &str) -> bool {
        if self.is_available() {
            match self.backend.remove(key) {
                Ok(()) => {
                    self.publish(key);
                    return true;
                }
                Err(e) => self.degrade(&e),
            }
        }
        let _ = self.fallback.remove(key);
        false
    }

    /// Deserialize the value under `key`; unreadable values count as absent
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable stored value");
                None
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set(key, &json),
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value");
                false
            }
        }
    }

    fn publish(&self, key: &str) {
        let event = StoreEvent {
            key: key.to_string(),
            origin: self.context,
        };
        if self.events.send(event).is_err() {
            debug!(key, "no store subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::store::keys;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn store_type(&self) -> &'static str {
            "broken"
        }
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(MedfinderError::StorageUnavailable("quota exceeded".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(MedfinderError::StorageUnavailable("quota exceeded".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(MedfinderError::StorageUnavailable("quota exceeded".into()))
        }
    }

    #[test]
    fn test_degrades_to_memory() {
        let handle = StoreHandle::new(Arc::new(BrokenStore));
        assert!(!handle.is_available());
        assert_eq!(handle.store_type(), "memory");

        assert!(!handle.set(keys::REGISTRY, "local"));
        assert_eq!(handle.get(keys::REGISTRY).as_deref(), Some("local"));
        assert!(!handle.remove(keys::REGISTRY));
        assert_eq!(handle.get(keys::REGISTRY), None);
    }

    #[test]
    fn test_contexts_share_substrate() {
        let first = StoreHandle::in_memory();
        let second = first.attach_context();
        assert_ne!(first.context_id(), second.context_id());

        assert!(first.set(keys::USER_DATA, "shared"));
        assert_eq!(second.get(keys::USER_DATA).as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn test_writes_are_broadcast() {
        let first = StoreHandle::in_memory();
        let second = first.attach_context();
        let mut rx = second.subscribe();

        first.set(keys::SEARCH_INDEX, "{}");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.key, keys::SEARCH_INDEX);
        assert_eq!(event.origin, first.context_id());
    }

    #[test]
    fn test_load_ignores_garbage() {
        let handle = StoreHandle::in_memory();
        handle.set(keys::SYNC_HISTORY, "not json");
        assert!(handle.load::<Vec<u32>>(keys::SYNC_HISTORY).is_none());
        handle.save(keys::SYNC_HISTORY, &vec![1u32, 2]);
        assert_eq!(handle.load::<Vec<u32>>(keys::SYNC_HISTORY), Some(vec![1, 2]));
    }
}
