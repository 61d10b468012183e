//! Error types for memoized computations.

use kiln_common::Cancelled;

/// Errors returned when retrieving a memoized value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MemoizeError {
    /// The caller's token was cancelled before a value was available.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// The generation used for the request has already been destroyed.
    #[error("operation on generation {generation} destroyed by {destroyed_by}")]
    GenerationDestroyed {
        /// Name of the destroyed generation.
        generation: String,
        /// Description of what destroyed it.
        destroyed_by: String,
    },
}
