//! The content-addressed handle table.

use crate::generation::{Generation, GenerationId};
use crate::handle::Handle;
use kiln_common::ContentHash;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A table of memoized computations keyed by content hash.
///
/// The store holds at most one live handle per key. A handle stays in the
/// table while at least one generation holds a lease on it or its
/// computation is running.
pub struct Store<A, V> {
    handles: Mutex<HashMap<ContentHash, Arc<Handle<A, V>>>>,
    next_generation: AtomicU64,
}

impl<A, V> Store<A, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Opens a new generation over this store.
    pub fn generation(self: &Arc<Self>, name: impl Into<String>) -> Arc<Generation<A, V>> {
        let id = GenerationId(self.next_generation.fetch_add(1, Ordering::Relaxed));
        Arc::new(Generation::new(id, name.into(), Arc::clone(self)))
    }

    /// Returns the number of handles referenced by any generation or running.
    pub fn handle_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the store holds a handle for `key`.
    pub fn contains(&self, key: &ContentHash) -> bool {
        self.lock().contains_key(key)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<ContentHash, Arc<Handle<A, V>>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops one reference from `generation` to `handle`, evicting the handle
    /// when no generation references it any more and it is not running.
    pub(crate) fn release(&self, handle: &Handle<A, V>, generation: GenerationId) {
        let mut handles = self.lock();
        if handle.decrement(generation) {
            Self::evict(&mut handles, handle);
        }
    }

    /// Evicts `handle` if no generation references it. Called when a run
    /// ends.
    pub(crate) fn evict_if_unused(&self, handle: &Handle<A, V>) {
        let mut handles = self.lock();
        if handle.is_evictable() {
            Self::evict(&mut handles, handle);
        }
    }

    fn evict(handles: &mut HashMap<ContentHash, Arc<Handle<A, V>>>, handle: &Handle<A, V>) {
        let key = handle.key();
        if handles.get(&key).is_some_and(|h| std::ptr::eq(Arc::as_ptr(h), handle)) {
            handles.remove(&key);
            tracing::trace!(%key, "evicted memoized handle");
        }
    }
}

impl<A, V> Default for Store<A, V> {
    fn default() -> Self {
        Self::new()
    }
}
