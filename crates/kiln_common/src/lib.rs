//! Shared foundational types used across the Kiln package cache.
//!
//! This crate provides content hashing for composite cache keys and the
//! cancellation token threaded through every blocking operation.

#![warn(missing_docs)]

pub mod cancel;
pub mod hash;

pub use cancel::{CancelReason, CancelToken, Cancelled};
pub use hash::{ContentHash, ContentHasher};
