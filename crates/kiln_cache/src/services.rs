//! Collaborator interfaces consumed by the cache.

use crate::error::{CacheError, ImportError};
use crate::metadata::{KnownMetadata, PackageId};
use crate::types::{CheckInput, CheckOutput, TypeError, Types};
use kiln_common::CancelToken;
use kiln_diagnostics::SuggestedFix;
use kiln_source::{FileHandle, LineIndex, ParseMode, ParsedFile, Span, Uri};
use std::sync::Arc;

/// Provides file snapshots.
pub trait FileSource: Send + Sync {
    /// Returns the current content of `uri`.
    fn get_file(&self, uri: &Uri, cancel: &CancelToken) -> Result<FileHandle, CacheError>;
}

/// The result of parsing one file.
#[derive(Clone, Debug)]
pub struct ParseOutput {
    /// The parsed file. Syntax errors are recorded on it.
    pub file: ParsedFile,
    /// `true` if the parser had to repair malformed syntax, making positions
    /// in the tree unreliable.
    pub fixed: bool,
}

/// Parses single files.
pub trait Parser: Send + Sync {
    /// Parses `file` at the given fidelity.
    ///
    /// Syntax errors are reported on the returned file; an `Err` means no
    /// tree could be produced at all.
    fn parse(&self, file: &FileHandle, mode: ParseMode) -> Result<ParseOutput, CacheError>;
}

/// Answers questions about the workspace's package graph.
pub trait MetadataSource: Send + Sync {
    /// Returns the metadata for `id`, if loaded.
    fn metadata(&self, id: &PackageId) -> Option<KnownMetadata>;

    /// Returns `true` if `id` belongs to the editable workspace.
    fn is_workspace_package(&self, id: &PackageId) -> bool;

    /// Returns `true` if one of `id`'s files is open in the editor.
    fn is_active(&self, id: &PackageId) -> bool;

    /// Returns the module manifest governing `uri`, if any.
    fn module_manifest_for(&self, uri: &Uri) -> Option<Uri>;

    /// Returns the error that prevented the workspace from loading, if any.
    fn initialization_error(&self) -> Option<String>;
}

/// Resolves imports while a package is checked.
pub trait Importer {
    /// Returns the type-level view of the package imported as `path`.
    fn import(&self, path: &str) -> Result<Arc<Types>, ImportError>;
}

/// The external type checker.
pub trait TypeChecker: Send + Sync {
    /// Checks one package. Errors are reported through `errors` as they are
    /// found; `importer` is consulted for every import.
    fn check(
        &self,
        input: CheckInput,
        importer: &dyn Importer,
        errors: &mut dyn FnMut(TypeError),
    ) -> CheckOutput;

    /// Returns the built-in representation of the unsafe-operations package.
    fn unsafe_package(&self) -> Arc<Types>;
}

/// One `require` entry of a module manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleRequirement {
    /// The required module path.
    pub path: String,
    /// The required version.
    pub version: String,
    /// Where the requirement is written.
    pub span: Span,
}

/// A parsed module manifest.
#[derive(Clone, Debug)]
pub struct ParsedManifest {
    /// The manifest file.
    pub uri: Uri,
    /// Line index of the manifest content.
    pub line_index: LineIndex,
    /// The manifest's requirements.
    pub requires: Vec<ModuleRequirement>,
}

impl ParsedManifest {
    /// Returns the span of the requirement on `path` at `version`.
    pub fn find_module_reference(&self, path: &str, version: &str) -> Option<Span> {
        self.requires
            .iter()
            .find(|req| req.path == path && req.version == version)
            .map(|req| req.span)
    }
}

/// Parses module manifests.
pub trait ManifestParser: Send + Sync {
    /// Parses the manifest in `file`.
    fn parse_manifest(&self, file: &FileHandle) -> Result<ParsedManifest, CacheError>;
}

/// Suggests fixes for imports that cannot be resolved.
pub trait QuickFixProvider: Send + Sync {
    /// Returns fixes for the missing package `import_path` imported from `uri`.
    fn missing_import_fixes(
        &self,
        uri: &Uri,
        import_path: &str,
    ) -> Result<Vec<SuggestedFix>, CacheError>;
}

/// The collaborators a cache is built over.
#[derive(Clone)]
pub struct Services {
    /// File snapshots.
    pub files: Arc<dyn FileSource>,
    /// Single-file parser.
    pub parser: Arc<dyn Parser>,
    /// Package graph.
    pub metadata: Arc<dyn MetadataSource>,
    /// Type checker.
    pub checker: Arc<dyn TypeChecker>,
    /// Module manifest parser.
    pub manifests: Arc<dyn ManifestParser>,
    /// Quick fixes for missing imports.
    pub quick_fixes: Arc<dyn QuickFixProvider>,
}
