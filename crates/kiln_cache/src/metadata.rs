//! Package metadata supplied by the external loader.

use kiln_source::{Location, Uri};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Creates the value from its string form.
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(Arc::from(s.as_ref()))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), &*self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Uniquely names a package within the workspace's build graph.
    PackageId
);

string_id!(
    /// The canonical import path of a package.
    PackagePath
);

/// The module enclosing a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    /// The module path.
    pub path: String,
    /// The module version; empty for the main module.
    pub version: String,
    /// The language version declared by the module, e.g. `1.18`. May be empty.
    pub lang_version: String,
}

/// An error reported by the loader while listing a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListError {
    /// Where the error applies, if the loader reported a position.
    pub position: Option<Location>,
    /// The error message.
    pub message: String,
}

/// A loader error in one of a package's transitive dependencies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageError {
    /// Import paths from the root of the load down to the failing package;
    /// the last element is the direct importer of the failing package.
    pub import_stack: Vec<String>,
    /// The error message.
    pub err: String,
}

/// The part of the loader configuration that can vary between environments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Working directory of the load.
    pub dir: PathBuf,
    /// Loader mode bits.
    pub mode: u32,
    /// Environment entries, `KEY=value`.
    pub env: Vec<String>,
    /// Extra build flags.
    pub build_flags: Vec<String>,
}

/// The loader's description of one package.
#[derive(Clone, Debug)]
pub struct Metadata {
    /// The package id.
    pub id: PackageId,
    /// The package import path.
    pub path: PackagePath,
    /// The package name.
    pub name: String,
    /// Every source file of the package.
    pub go_files: Vec<Uri>,
    /// The files actually fed to the type checker.
    pub compiled_files: Vec<Uri>,
    /// Direct dependencies, in a fixed order.
    pub deps: Vec<PackageId>,
    /// The enclosing module, if any.
    pub module: Option<ModuleInfo>,
    /// Errors reported while listing this package.
    pub errors: Vec<ListError>,
    /// Errors reported for transitive dependencies.
    pub deps_errors: Vec<PackageError>,
    /// The loader configuration that produced this metadata.
    pub config: Arc<BuildConfig>,
}

/// Metadata together with whether it is known to be valid.
#[derive(Clone, Debug)]
pub struct KnownMetadata {
    /// The metadata.
    pub metadata: Arc<Metadata>,
    /// `false` if the metadata came from a failed or partial load.
    pub valid: bool,
}

impl Deref for KnownMetadata {
    type Target = Metadata;

    fn deref(&self) -> &Metadata {
        &self.metadata
    }
}

/// Returns `true` if a module version denotes a workspace-local replacement.
pub fn is_workspace_module_version(version: &str) -> bool {
    version.ends_with("-workspace")
}
