//! Conformance test helpers for the Kiln package cache.
//!
//! Supplies a toy language and in-memory collaborators so integration tests
//! can drive a [`Cache`](kiln_cache::Cache) end to end:
//!
//! - [`ToyParser`] reads a line-based syntax (`package`, `import`, and
//!   `func`/`type`/`var`/`const` declarations with `:` signature references
//!   and `=` body references).
//! - [`ToyChecker`] resolves those references, reports undeclared names and
//!   redeclarations, and counts its invocations per package.
//! - [`Workspace`] wires both to [`MemoryFiles`] and [`MemoryMetadata`] and
//!   builds packages from [`PackageSpec`]s.

#![warn(missing_docs)]

pub mod checker;
pub mod files;
pub mod metadata;
pub mod parser;
pub mod workspace;

pub use checker::ToyChecker;
pub use files::MemoryFiles;
pub use metadata::MemoryMetadata;
pub use parser::{ToyManifestParser, ToyParser};
pub use workspace::{uri_for, FetchFixes, PackageSpec, Workspace};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a test log subscriber filtered by the `KILN_LOG` variable.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("KILN_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
