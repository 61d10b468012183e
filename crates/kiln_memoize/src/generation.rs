//! Generations: the epochs through which handles are referenced.

use crate::error::MemoizeError;
use crate::handle::{Computation, Handle};
use crate::lease::Lease;
use crate::store::Store;
use kiln_common::ContentHash;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Identifies one generation within its store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GenerationId(pub(crate) u64);

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// One logical epoch of workspace state.
///
/// A generation acquires handles from the store and hands back a [`Lease`]
/// for each acquisition. Once destroyed it can no longer acquire handles or
/// evaluate them.
pub struct Generation<A, V> {
    id: GenerationId,
    name: String,
    store: Arc<Store<A, V>>,
    destroyed_by: Mutex<Option<String>>,
}

impl<A, V> Generation<A, V> {
    pub(crate) fn new(id: GenerationId, name: String, store: Arc<Store<A, V>>) -> Self {
        Self {
            id,
            name,
            store,
            destroyed_by: Mutex::new(None),
        }
    }

    /// Returns this generation's id.
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// Returns the name this generation was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn store(&self) -> &Store<A, V> {
        &self.store
    }

    /// Returns the handle for `key`, creating it from `function` if the store
    /// holds none. When a handle already exists `function` is discarded.
    pub fn get_handle(
        &self,
        key: ContentHash,
        function: Computation<A, V>,
    ) -> Result<(Arc<Handle<A, V>>, Lease<A, V>), MemoizeError> {
        self.check_live()?;
        let mut handles = self.store.lock();
        let handle = handles
            .entry(key)
            .or_insert_with(|| Arc::new(Handle::new(key, function)));
        let handle = Arc::clone(handle);
        handle.increment(self.id);
        drop(handles);
        let lease = Lease::new(Arc::clone(&self.store), Arc::clone(&handle), self.id);
        Ok((handle, lease))
    }

    /// Adds a reference from this generation to a handle acquired by another.
    pub fn inherit(&self, handle: &Arc<Handle<A, V>>) -> Result<Lease<A, V>, MemoizeError> {
        self.check_live()?;
        let mut handles = self.store.lock();
        handles
            .entry(handle.key())
            .or_insert_with(|| Arc::clone(handle));
        handle.increment(self.id);
        drop(handles);
        Ok(Lease::new(
            Arc::clone(&self.store),
            Arc::clone(handle),
            self.id,
        ))
    }

    /// Destroys the generation, dropping every reference it holds.
    ///
    /// Handles still running stay in the store until their run ends.
    /// Destroying twice is a no-op.
    pub fn destroy(&self, destroyed_by: impl Into<String>) {
        {
            let mut slot = self
                .destroyed_by
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return;
            }
            *slot = Some(destroyed_by.into());
        }
        let mut handles = self.store.lock();
        handles.retain(|_, handle| !handle.forget(self.id));
        tracing::debug!(generation = %self.name, remaining = handles.len(), "destroyed generation");
    }

    /// Returns `true` once the generation has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed_by
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Fails with [`MemoizeError::GenerationDestroyed`] once the generation
    /// has been destroyed.
    pub fn check_live(&self) -> Result<(), MemoizeError> {
        let slot = self
            .destroyed_by
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(by) => Err(MemoizeError::GenerationDestroyed {
                generation: self.name.clone(),
                destroyed_by: by.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<A, V> fmt::Debug for Generation<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
