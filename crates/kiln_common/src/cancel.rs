//! Cooperative cancellation for long-running cache operations.
//!
//! Every blocking step of package building accepts a [`CancelToken`] from the
//! originating request. Tokens form a tree: cancelling a parent cancels every
//! child derived from it, and a token may also carry a deadline.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Why an operation stopped early.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CancelReason {
    /// The token (or an ancestor) was cancelled explicitly.
    Cancelled,
    /// The token's (or an ancestor's) deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "operation was cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// The error returned by any operation that observed a cancelled token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, thiserror::Error)]
#[error("{reason}")]
pub struct Cancelled {
    /// Why the operation was cancelled.
    pub reason: CancelReason,
}

struct TokenState {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
    parent: Option<CancelToken>,
}

/// A cheaply clonable cancellation signal.
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    /// Creates a root token with no deadline.
    pub fn new() -> Self {
        Self::build(None, None)
    }

    /// Creates a root token that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline), None)
    }

    /// Creates a root token that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Derives a child token that is cancelled whenever `self` is.
    pub fn child(&self) -> Self {
        Self::build(None, Some(self.clone()))
    }

    fn build(deadline: Option<Instant>, parent: Option<CancelToken>) -> Self {
        Self {
            state: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                deadline,
                parent,
            }),
        }
    }

    /// Cancels this token and all of its children.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    /// Returns the cancellation reason, if the token is no longer live.
    pub fn reason(&self) -> Option<CancelReason> {
        let mut token = Some(self);
        while let Some(t) = token {
            if t.state.cancelled.load(Ordering::Acquire) {
                return Some(CancelReason::Cancelled);
            }
            if t.state.deadline.is_some_and(|d| Instant::now() >= d) {
                return Some(CancelReason::DeadlineExceeded);
            }
            token = t.state.parent.as_ref();
        }
        None
    }

    /// Returns `true` if this token or any ancestor has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Returns `Err(Cancelled)` if the token is no longer live.
    pub fn check(&self) -> Result<(), Cancelled> {
        match self.reason() {
            Some(reason) => Err(Cancelled { reason }),
            None => Ok(()),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("reason", &self.reason())
            .finish()
    }
}
