//! Generation-scoped, content-addressed memoization.
//!
//! A [`Store`] maps a content key to a [`Handle`], the eventual result of one
//! computation over the inputs that key summarizes. Handles are obtained
//! through a [`Generation`], one logical epoch of workspace state; each
//! generation holding a handle owns a [`Lease`] on it, and the store forgets a
//! handle once no generation holds it and it is not running. Within the store a computation runs at
//! most once per key: the first caller executes it and concurrent callers wait
//! for the same result.

#![warn(missing_docs)]

pub mod error;
pub mod generation;
pub mod handle;
pub mod lease;
pub mod store;

pub use error::MemoizeError;
pub use generation::{Generation, GenerationId};
pub use handle::{Computation, Handle};
pub use lease::Lease;
pub use store::Store;
