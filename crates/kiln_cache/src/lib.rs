//! Incremental, content-addressed package type-checking cache.
//!
//! A [`Snapshot`] answers "what are the types and diagnostics of package P
//! right now". Each package is represented by a [`PackageHandle`] whose
//! composite [`PackageKey`] summarizes the package's files, build inputs and
//! the keys of its dependencies; the type-check result for a key is computed
//! at most once and shared by every snapshot that reaches the same key.
//!
//! Parsing, type checking, metadata loading and file access are supplied by
//! the caller through the [`Services`] traits.

#![warn(missing_docs)]

pub mod check;
pub mod diagnostics;
pub mod error;
pub mod handle;
pub mod key;
pub mod metadata;
pub mod package;
pub mod resolve;
pub mod services;
pub mod snapshot;
pub mod trim;
pub mod types;

pub use check::valid_language_version;
pub use diagnostics::{expand_errors, ExtendedError};
pub use error::{CacheError, ImportError};
pub use handle::PackageHandle;
pub use key::{compute_package_key, hash_config, PackageKey};
pub use metadata::{
    is_workspace_module_version, BuildConfig, KnownMetadata, ListError, Metadata, ModuleInfo,
    PackageError, PackageId, PackagePath,
};
pub use package::{ModuleVersion, Package};
pub use resolve::{is_valid_import, missing_package_message, resolve_import_path};
pub use services::{
    FileSource, Importer, ManifestParser, MetadataSource, ModuleRequirement, ParseOutput,
    ParsedManifest, Parser, QuickFixProvider, Services, TypeChecker,
};
pub use snapshot::{Cache, PackageData, Snapshot};
pub use trim::{trim_file, UnexportedFilter};
pub use types::{CheckInput, CheckOutput, TypeError, TypeErrorKind, TypeInfo, Types};
