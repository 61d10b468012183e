//! Error types for package building and checking.

use crate::metadata::{PackageId, PackagePath};
use kiln_common::Cancelled;
use kiln_memoize::MemoizeError;
use kiln_source::Uri;

/// Errors produced while building a package handle or checking a package.
///
/// Errors are `Clone` because a failed check is memoized and handed to every
/// caller of the same key.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The metadata source knows no package with this id. The caller must
    /// reload metadata and retry.
    #[error("no metadata for {id}")]
    NoMetadata {
        /// The unknown package.
        id: PackageId,
    },

    /// The originating request was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// The file source could not provide a file.
    #[error("failed to read {uri}: {reason}")]
    FileRead {
        /// The file that could not be read.
        uri: Uri,
        /// Description of the failure.
        reason: String,
    },

    /// The parser could not produce any syntax tree for a file.
    #[error("failed to parse {uri}: {reason}")]
    Parse {
        /// The file that could not be parsed.
        uri: Uri,
        /// Description of the failure.
        reason: String,
    },

    /// The package has no compiled files and no loader errors to show instead.
    #[error("no parsed files for package {path}, expected: {expected:?}, errors: {errors:?}")]
    NoParsedFiles {
        /// Import path of the package.
        path: PackagePath,
        /// The compiled files the metadata declared.
        expected: Vec<Uri>,
        /// Loader error messages, if any.
        errors: Vec<String>,
    },

    /// A cached read found no completed result for the generation.
    #[error("no cached type information for {path}")]
    NoCachedTypes {
        /// Import path of the package.
        path: PackagePath,
    },

    /// The snapshot's generation was destroyed.
    #[error("operation on generation {generation} destroyed by {destroyed_by}")]
    GenerationDestroyed {
        /// Name of the destroyed generation.
        generation: String,
        /// Description of what destroyed it.
        destroyed_by: String,
    },

    /// The module manifest could not be parsed.
    #[error("failed to parse manifest {uri}: {reason}")]
    Manifest {
        /// The manifest file.
        uri: Uri,
        /// Description of the failure.
        reason: String,
    },

    /// An error location could not be mapped to a line and column.
    #[error("cannot position {what} in {uri}")]
    Position {
        /// The file the location was expected in.
        uri: Uri,
        /// What was being positioned.
        what: String,
    },

    /// The quick-fix provider failed.
    #[error("computing fixes for {import_path}: {reason}")]
    QuickFix {
        /// The import the fixes were requested for.
        import_path: String,
        /// Description of the failure.
        reason: String,
    },
}

impl CacheError {
    /// Returns `true` if the error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CacheError::Cancelled(_))
    }

    /// Returns `true` if the error stems from the request's lifetime rather
    /// than from the package. Such errors are never memoized.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CacheError::Cancelled(_) | CacheError::GenerationDestroyed { .. }
        )
    }
}

impl From<MemoizeError> for CacheError {
    fn from(err: MemoizeError) -> Self {
        match err {
            MemoizeError::Cancelled(cancelled) => CacheError::Cancelled(cancelled),
            MemoizeError::GenerationDestroyed {
                generation,
                destroyed_by,
            } => CacheError::GenerationDestroyed {
                generation,
                destroyed_by,
            },
        }
    }
}

/// Errors returned to the type checker by the import callback.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The checking request was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// No dependency matches the import path.
    #[error("{0}")]
    MissingPackage(String),

    /// The import names an internal package that is not visible here.
    #[error("invalid use of internal package {path}")]
    InvalidInternalImport {
        /// The offending import path.
        path: String,
    },

    /// The dependency was found but could not be checked.
    #[error(transparent)]
    Dependency(CacheError),
}

impl ImportError {
    /// Returns `true` if the error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportError::Cancelled(_))
    }
}

impl From<CacheError> for ImportError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Cancelled(cancelled) => ImportError::Cancelled(cancelled),
            other => ImportError::Dependency(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_common::CancelReason;

    #[test]
    fn no_metadata_display() {
        let err = CacheError::NoMetadata {
            id: PackageId::new("example.com/a"),
        };
        assert_eq!(err.to_string(), "no metadata for example.com/a");
        assert!(!err.is_cancelled());
    }

    #[test]
    fn no_parsed_files_lists_expected() {
        let err = CacheError::NoParsedFiles {
            path: PackagePath::new("example.com/a"),
            expected: vec![Uri::new("file:///a/a.k")],
            errors: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("no parsed files for package example.com/a"));
        assert!(msg.contains("file:///a/a.k"));
    }

    #[test]
    fn memoize_errors_convert() {
        let cancelled = Cancelled {
            reason: CancelReason::Cancelled,
        };
        assert!(CacheError::from(MemoizeError::Cancelled(cancelled)).is_cancelled());
        let destroyed = CacheError::from(MemoizeError::GenerationDestroyed {
            generation: "snapshot 1".to_string(),
            destroyed_by: "snapshot 2".to_string(),
        });
        assert!(destroyed.is_transient());
        assert!(!destroyed.is_cancelled());
        assert_eq!(
            destroyed.to_string(),
            "operation on generation snapshot 1 destroyed by snapshot 2"
        );
        assert!(!CacheError::NoMetadata {
            id: PackageId::new("a"),
        }
        .is_transient());
    }

    #[test]
    fn cancellation_survives_import_conversion() {
        let cancelled = Cancelled {
            reason: CancelReason::DeadlineExceeded,
        };
        assert!(ImportError::from(CacheError::Cancelled(cancelled)).is_cancelled());
        let other = ImportError::from(CacheError::NoMetadata {
            id: PackageId::new("b"),
        });
        assert_eq!(other.to_string(), "no metadata for b");
    }

    #[test]
    fn internal_import_display() {
        let err = ImportError::InvalidInternalImport {
            path: "example.com/x/internal/y".to_string(),
        };
        assert_eq!(err.to_string(), "invalid use of internal package example.com/x/internal/y");
    }
}
