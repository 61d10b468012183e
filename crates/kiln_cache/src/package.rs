//! The result of type checking one package.

use crate::metadata::{Metadata, PackageId, PackagePath};
use crate::types::{TypeError, TypeInfo, Types};
use kiln_diagnostics::Diagnostic;
use kiln_source::{ParseError, ParseMode, ParsedFile, Uri};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The module version a package was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleVersion {
    /// The module path.
    pub path: String,
    /// The version; empty for workspace-local replacements.
    pub version: String,
}

/// A type-checked package.
///
/// Built by a single check and never mutated once published; shared by every
/// caller that reaches the same key.
#[derive(Debug)]
pub struct Package {
    pub(crate) metadata: Arc<Metadata>,
    pub(crate) mode: ParseMode,
    pub(crate) go_files: Vec<Arc<ParsedFile>>,
    pub(crate) compiled_files: Vec<Arc<ParsedFile>>,
    pub(crate) types: Arc<Types>,
    pub(crate) type_info: TypeInfo,
    pub(crate) imports: BTreeMap<PackagePath, Arc<Package>>,
    pub(crate) version: Option<ModuleVersion>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) parse_errors: Vec<ParseError>,
    pub(crate) type_errors: Vec<TypeError>,
    pub(crate) has_fixed_files: bool,
}

impl Package {
    pub(crate) fn new(metadata: Arc<Metadata>, mode: ParseMode) -> Self {
        let types = Arc::new(Types::new(metadata.path.clone(), metadata.name.clone()));
        Self {
            metadata,
            mode,
            go_files: Vec::new(),
            compiled_files: Vec::new(),
            types,
            type_info: TypeInfo::default(),
            imports: BTreeMap::new(),
            version: None,
            diagnostics: Vec::new(),
            parse_errors: Vec::new(),
            type_errors: Vec::new(),
            has_fixed_files: false,
        }
    }

    /// Returns the package id.
    pub fn id(&self) -> &PackageId {
        &self.metadata.id
    }

    /// Returns the package import path.
    pub fn path(&self) -> &PackagePath {
        &self.metadata.path
    }

    /// Returns the metadata the package was checked with.
    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.metadata
    }

    /// Returns the parse mode the package was checked in.
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Returns every source file, parsed at header fidelity unless the
    /// package was checked in full.
    pub fn go_files(&self) -> &[Arc<ParsedFile>] {
        &self.go_files
    }

    /// Returns the files that were type checked.
    pub fn compiled_files(&self) -> &[Arc<ParsedFile>] {
        &self.compiled_files
    }

    /// Returns the package's type-level view.
    pub fn types(&self) -> &Arc<Types> {
        &self.types
    }

    /// Returns the checker's tables.
    pub fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// Returns the dependencies the checker actually imported.
    pub fn imports(&self) -> &BTreeMap<PackagePath, Arc<Package>> {
        &self.imports
    }

    /// Returns the module version, if the package belongs to a module.
    pub fn version(&self) -> Option<&ModuleVersion> {
        self.version.as_ref()
    }

    /// Returns the user-facing diagnostics. Empty unless checked in full.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the raw syntax errors.
    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    /// Returns the raw type errors.
    pub fn type_errors(&self) -> &[TypeError] {
        &self.type_errors
    }

    /// Returns `true` if the parser repaired any compiled file.
    pub fn has_fixed_files(&self) -> bool {
        self.has_fixed_files
    }

    /// Returns the parsed file for `uri`, preferring compiled files.
    pub fn file_for(&self, uri: &Uri) -> Option<&Arc<ParsedFile>> {
        self.compiled_files
            .iter()
            .chain(self.go_files.iter())
            .find(|f| &f.uri == uri)
    }
}
