//! Memoized computations and their evaluation.

use crate::error::MemoizeError;
use crate::generation::{Generation, GenerationId};
use crate::store::Store;
use kiln_common::{CancelToken, ContentHash};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A computation memoized behind a [`Handle`].
///
/// It receives the evaluating caller's cancellation token and the argument
/// passed to [`Handle::get`]. The argument is supplied per call rather than
/// captured, so a computation never keeps the argument alive. An `Err` is
/// never stored: the handle returns to idle as if the run was cancelled.
pub type Computation<A, V> = Arc<dyn Fn(&CancelToken, &A) -> Result<V, MemoizeError> + Send + Sync>;

/// How often a waiting caller re-checks its own token.
const WAIT_POLL: Duration = Duration::from_millis(10);

enum State<A, V> {
    Idle(Computation<A, V>),
    Running(Computation<A, V>),
    Completed(V),
}

struct Inner<A, V> {
    generations: HashMap<GenerationId, usize>,
    state: State<A, V>,
}

/// The eventual result of one keyed computation.
///
/// The first caller of [`get`](Handle::get) runs the computation on its own
/// thread; concurrent callers block until it completes. If the running caller
/// is cancelled the handle returns to idle and the next waiter takes over, so
/// a value is only ever produced by an uncancelled run. The computation is
/// released once a value is stored.
pub struct Handle<A, V> {
    key: ContentHash,
    inner: Mutex<Inner<A, V>>,
    cond: Condvar,
    runs: AtomicUsize,
}

impl<A, V> Handle<A, V> {
    pub(crate) fn new(key: ContentHash, function: Computation<A, V>) -> Self {
        Self {
            key,
            inner: Mutex::new(Inner {
                generations: HashMap::new(),
                state: State::Idle(function),
            }),
            cond: Condvar::new(),
            runs: AtomicUsize::new(0),
        }
    }

    /// Returns the key this handle was created under.
    pub fn key(&self) -> ContentHash {
        self.key
    }

    /// Returns how many times the computation has been started.
    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    /// Returns `true` if a value has been stored.
    pub fn is_completed(&self) -> bool {
        matches!(self.lock().state, State::Completed(_))
    }

    /// Returns `true` while some caller is running the computation.
    pub fn is_running(&self) -> bool {
        matches!(self.lock().state, State::Running(_))
    }

    fn lock(&self) -> MutexGuard<'_, Inner<A, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn increment(&self, generation: GenerationId) {
        *self.lock().generations.entry(generation).or_insert(0) += 1;
    }

    /// Returns `true` if the handle can be evicted afterwards.
    pub(crate) fn decrement(&self, generation: GenerationId) -> bool {
        let mut inner = self.lock();
        if let Some(count) = inner.generations.get_mut(&generation) {
            *count -= 1;
            if *count == 0 {
                inner.generations.remove(&generation);
            }
        }
        inner.evictable()
    }

    /// Drops every reference from `generation`. Returns `true` if the handle
    /// can be evicted afterwards.
    pub(crate) fn forget(&self, generation: GenerationId) -> bool {
        let mut inner = self.lock();
        inner.generations.remove(&generation);
        inner.evictable()
    }

    pub(crate) fn is_evictable(&self) -> bool {
        self.lock().evictable()
    }
}

impl<A, V> Inner<A, V> {
    /// A running handle stays in the store until its run ends, so a new
    /// generation asking for the same key joins the run.
    fn evictable(&self) -> bool {
        self.generations.is_empty() && !matches!(self.state, State::Running(_))
    }
}

impl<A, V: Clone> Handle<A, V> {
    /// Returns the stored value without computing, provided `generation`
    /// references this handle.
    pub fn cached(&self, generation: &Generation<A, V>) -> Option<V> {
        let inner = self.lock();
        if !inner.generations.contains_key(&generation.id()) {
            return None;
        }
        match &inner.state {
            State::Completed(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the value, computing it if no other caller is doing so.
    pub fn get(
        &self,
        cancel: &CancelToken,
        generation: &Generation<A, V>,
        arg: &A,
    ) -> Result<V, MemoizeError> {
        generation.check_live()?;
        let mut inner = self.lock();
        loop {
            match &inner.state {
                State::Completed(value) => return Ok(value.clone()),
                State::Running(_) => {
                    cancel.check()?;
                    let (guard, _) = self
                        .cond
                        .wait_timeout(inner, WAIT_POLL)
                        .unwrap_or_else(PoisonError::into_inner);
                    inner = guard;
                }
                State::Idle(function) => {
                    cancel.check()?;
                    let function = Arc::clone(function);
                    inner.state = State::Running(Arc::clone(&function));
                    drop(inner);
                    return self.run(function, cancel, generation.store(), arg);
                }
            }
        }
    }

    fn run(
        &self,
        function: Computation<A, V>,
        cancel: &CancelToken,
        store: &Store<A, V>,
        arg: &A,
    ) -> Result<V, MemoizeError> {
        self.runs.fetch_add(1, Ordering::Relaxed);
        let guard = RunGuard {
            handle: self,
            store,
            function: Some(Arc::clone(&function)),
        };
        match function(cancel, arg) {
            Ok(value) => {
                guard.complete(value.clone());
                Ok(value)
            }
            Err(err) => {
                tracing::trace!(key = %self.key, error = %err, "memoized computation abandoned");
                drop(guard);
                Err(err)
            }
        }
    }
}

/// Ends a run. Returns the handle to idle unless the run stored a value,
/// including when the computation panics, then evicts the handle if every
/// generation released it while it ran.
struct RunGuard<'a, A, V> {
    handle: &'a Handle<A, V>,
    store: &'a Store<A, V>,
    function: Option<Computation<A, V>>,
}

impl<A, V> RunGuard<'_, A, V> {
    fn complete(mut self, value: V) {
        self.function = None;
        self.handle.lock().state = State::Completed(value);
    }
}

impl<A, V> Drop for RunGuard<'_, A, V> {
    fn drop(&mut self) {
        if let Some(function) = self.function.take() {
            self.handle.lock().state = State::Idle(function);
        }
        self.handle.cond.notify_all();
        self.store.evict_if_unused(self.handle);
    }
}

impl<A, V> fmt::Debug for Handle<A, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        let state = match inner.state {
            State::Idle(_) => "idle",
            State::Running(_) => "running",
            State::Completed(_) => "completed",
        };
        f.debug_struct("Handle")
            .field("key", &self.key)
            .field("state", &state)
            .field("generations", &inner.generations.len())
            .finish()
    }
}
