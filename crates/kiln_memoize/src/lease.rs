//! Scoped references from a generation to a handle.

use crate::generation::GenerationId;
use crate::handle::Handle;
use crate::store::Store;
use std::fmt;
use std::sync::Arc;

/// One generation's reference to one handle.
///
/// Dropping the lease releases the reference. The store evicts the handle
/// when its last reference is released.
pub struct Lease<A, V> {
    store: Arc<Store<A, V>>,
    handle: Arc<Handle<A, V>>,
    generation: GenerationId,
}

impl<A, V> Lease<A, V> {
    pub(crate) fn new(
        store: Arc<Store<A, V>>,
        handle: Arc<Handle<A, V>>,
        generation: GenerationId,
    ) -> Self {
        Self {
            store,
            handle,
            generation,
        }
    }

    /// Returns the leased handle.
    pub fn handle(&self) -> &Arc<Handle<A, V>> {
        &self.handle
    }

    /// Returns the generation holding the lease.
    pub fn generation(&self) -> GenerationId {
        self.generation
    }
}

impl<A, V> Drop for Lease<A, V> {
    fn drop(&mut self) {
        self.store.release(&self.handle, self.generation);
    }
}

impl<A, V> fmt::Debug for Lease<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("key", &self.handle.key())
            .field("generation", &self.generation)
            .finish()
    }
}
