//! Declarative workspaces for end-to-end tests.

use crate::checker::ToyChecker;
use crate::files::MemoryFiles;
use crate::metadata::MemoryMetadata;
use crate::parser::{ToyManifestParser, ToyParser};
use kiln_cache::{
    BuildConfig, Cache, CacheError, KnownMetadata, ListError, Metadata, ModuleInfo, PackageError,
    PackageId, PackagePath, QuickFixProvider, Services, TypeChecker,
};
use kiln_config::CacheOptions;
use kiln_diagnostics::SuggestedFix;
use kiln_source::{Location, Span, Uri};
use std::sync::Arc;

/// Returns the URI of file `name` in the package at `path`.
pub fn uri_for(path: &str, name: &str) -> Uri {
    Uri::new(format!("file:///ws/{path}/{name}"))
}

/// Offers to fetch any missing import.
#[derive(Default)]
pub struct FetchFixes;

impl QuickFixProvider for FetchFixes {
    fn missing_import_fixes(
        &self,
        _uri: &Uri,
        import_path: &str,
    ) -> Result<Vec<SuggestedFix>, CacheError> {
        Ok(vec![SuggestedFix::command(
            format!("fetch {import_path}"),
            format!("kiln get {import_path}"),
        )])
    }
}

struct SpecFile {
    name: String,
    content: String,
    compiled: bool,
}

/// Describes one package to add to a [`Workspace`].
pub struct PackageSpec {
    path: String,
    name: String,
    files: Vec<SpecFile>,
    deps: Vec<String>,
    workspace: bool,
    active: bool,
    valid: bool,
    module: Option<ModuleInfo>,
    errors: Vec<ListError>,
    deps_errors: Vec<PackageError>,
    config: BuildConfig,
}

impl PackageSpec {
    /// Starts a package at `path`, named after its last path segment.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            files: Vec::new(),
            deps: Vec::new(),
            workspace: false,
            active: false,
            valid: true,
            module: None,
            errors: Vec::new(),
            deps_errors: Vec::new(),
            config: BuildConfig::default(),
        }
    }

    /// Adds a compiled file.
    pub fn file(mut self, name: &str, content: &str) -> Self {
        self.files.push(SpecFile {
            name: name.to_string(),
            content: content.to_string(),
            compiled: true,
        });
        self
    }

    /// Adds a file that is listed but not compiled.
    pub fn go_only_file(mut self, name: &str, content: &str) -> Self {
        self.files.push(SpecFile {
            name: name.to_string(),
            content: content.to_string(),
            compiled: false,
        });
        self
    }

    /// Adds a dependency on the package at `path`.
    pub fn dep(mut self, path: &str) -> Self {
        self.deps.push(path.to_string());
        self
    }

    /// Marks the package as part of the editable workspace.
    pub fn workspace(mut self) -> Self {
        self.workspace = true;
        self
    }

    /// Marks the package as having an open file.
    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    /// Marks the package's metadata as stale.
    pub fn invalid(mut self) -> Self {
        self.valid = false;
        self
    }

    /// Places the package in a module.
    pub fn module(mut self, path: &str, version: &str, lang_version: &str) -> Self {
        self.module = Some(ModuleInfo {
            path: path.to_string(),
            version: version.to_string(),
            lang_version: lang_version.to_string(),
        });
        self
    }

    /// Adds a loader error, positioned in file `at` if given.
    pub fn list_error(mut self, at: Option<(&str, Span)>, message: &str) -> Self {
        let position = at.map(|(name, span)| Location::new(uri_for(&self.path, name), span));
        self.errors.push(ListError {
            position,
            message: message.to_string(),
        });
        self
    }

    /// Adds an error in the dependency graph, reached through `import_stack`.
    pub fn deps_error(mut self, import_stack: &[&str], err: &str) -> Self {
        self.deps_errors.push(PackageError {
            import_stack: import_stack.iter().map(|s| s.to_string()).collect(),
            err: err.to_string(),
        });
        self
    }

    /// Sets the build configuration.
    pub fn config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }
}

/// In-memory collaborators plus helpers to populate them.
///
/// Package ids equal package paths.
pub struct Workspace {
    /// File contents.
    pub files: Arc<MemoryFiles>,
    /// The parser, counting parses.
    pub parser: Arc<ToyParser>,
    /// Package metadata.
    pub metadata: Arc<MemoryMetadata>,
    /// The checker, counting checks.
    pub checker: Arc<ToyChecker>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self {
            files: Arc::new(MemoryFiles::new()),
            parser: Arc::new(ToyParser::new()),
            metadata: Arc::new(MemoryMetadata::new()),
            checker: Arc::new(ToyChecker::new()),
        }
    }

    /// Returns collaborators backed by this workspace.
    pub fn services(&self) -> Services {
        self.services_with_checker(self.checker.clone())
    }

    /// Returns collaborators using `checker` instead of the toy checker.
    pub fn services_with_checker(&self, checker: Arc<dyn TypeChecker>) -> Services {
        Services {
            files: self.files.clone(),
            parser: self.parser.clone(),
            metadata: self.metadata.clone(),
            checker,
            manifests: Arc::new(ToyManifestParser),
            quick_fixes: Arc::new(FetchFixes),
        }
    }

    /// Creates a cache over this workspace.
    pub fn cache(&self, options: CacheOptions) -> Cache {
        Cache::new(self.services(), options)
    }

    /// Adds or replaces a package and its files. Returns its id.
    pub fn add(&self, spec: PackageSpec) -> PackageId {
        let id = PackageId::new(&spec.path);
        let mut go_files = Vec::new();
        let mut compiled_files = Vec::new();
        for file in &spec.files {
            let uri = uri_for(&spec.path, &file.name);
            self.files.set(uri.clone(), &file.content);
            if file.compiled {
                compiled_files.push(uri.clone());
            }
            go_files.push(uri);
        }
        let metadata = Metadata {
            id: id.clone(),
            path: PackagePath::new(&spec.path),
            name: spec.name,
            go_files,
            compiled_files,
            deps: spec.deps.iter().map(PackageId::new).collect(),
            module: spec.module,
            errors: spec.errors,
            deps_errors: spec.deps_errors,
            config: Arc::new(spec.config),
        };
        self.metadata.insert(KnownMetadata {
            metadata: Arc::new(metadata),
            valid: spec.valid,
        });
        self.metadata.set_workspace(id.clone(), spec.workspace);
        self.metadata.set_active(id.clone(), spec.active);
        id
    }

    /// Replaces the content of an existing file and returns its URI.
    pub fn edit(&self, path: &str, name: &str, content: &str) -> Uri {
        let uri = uri_for(path, name);
        self.files.set(uri.clone(), content);
        uri
    }
}
