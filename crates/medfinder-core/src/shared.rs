//! Shared, swappable state
//!
//! Registry and index are replaced wholesale: writers build a fresh value and
//! swap it in, readers keep whatever snapshot they already hold. A generation
//! counter lets a long-running build notice that it has been superseded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Handle to a value that is read as immutable snapshots and replaced atomically
#[derive(Debug)]
pub struct Shared<T> {
    current: Arc<RwLock<Arc<T>>>,
    generation: Arc<AtomicU64>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(value))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current value; later swaps do not affect the returned snapshot
    pub fn snapshot(&self) -> Arc<T> {
        let guard = self.current.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a rebuild; any rebuild started earlier can no longer commit
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Swap in `value` if no newer rebuild or replacement happened since `begin`
    pub fn commit(&self, generation: u64, value: T) -> bool {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        *guard = Arc::new(value);
        true
    }

    /// Unconditionally replace the value, superseding in-flight rebuilds
    pub fn replace(&self, value: T) {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        self.generation.fetch_add(1, Ordering::SeqCst);
        *guard = Arc::new(value);
    }
}

impl<T: Clone> Shared<T> {
    /// Copy the current value, apply `f`, swap the result in
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.current.write().unwrap_or_else(|p| p.into_inner());
        let mut next = T::clone(&guard);
        let result = f(&mut next);
        self.generation.fetch_add(1, Ordering::SeqCst);
        *guard = Arc::new(next);
        result
    }
}
