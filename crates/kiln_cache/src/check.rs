//! The type-check orchestrator.

use crate::diagnostics::{
    deps_errors, expand_errors, list_error_diagnostics, parse_error_diagnostics,
    type_error_diagnostics,
};
use crate::error::{CacheError, ImportError};
use crate::handle::PackageHandle;
use crate::metadata::{is_workspace_module_version, Metadata, PackagePath};
use crate::package::{ModuleVersion, Package};
use crate::resolve::{is_valid_import, missing_pkg_error, resolve_import_path};
use crate::services::Importer;
use crate::snapshot::Snapshot;
use crate::trim::{trim_file, UnexportedFilter};
use crate::types::{CheckInput, TypeError, Types};
use kiln_common::CancelToken;
use kiln_source::{FileHandle, ParseMode, ParsedFile, Uri};
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, LazyLock};

/// Import path of the built-in unsafe-operations package.
const UNSAFE_PACKAGE: &str = "unsafe";

static LANG_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([1-9][0-9]*)\.(0|[1-9][0-9]*)$").expect("valid regex literal")
});

/// Returns `true` if `version` is a `major.minor` language version the
/// checker accepts.
pub fn valid_language_version(version: &str) -> bool {
    LANG_VERSION.is_match(version)
}

/// Type checks one package and, in full mode, computes its diagnostics.
///
/// In exported mode the package is first checked over filter-trimmed files.
/// If that only reports names the filter removed, it is checked once more
/// keeping those names; if errors remain it is checked a final time over
/// blanket-trimmed files and that result is kept.
pub(crate) fn type_check(
    cancel: &CancelToken,
    snapshot: &Snapshot,
    go_files: &[FileHandle],
    compiled_files: &[FileHandle],
    metadata: &Arc<Metadata>,
    mode: ParseMode,
    deps: &BTreeMap<PackagePath, Arc<PackageHandle>>,
) -> Result<Arc<Package>, CacheError> {
    let mut filter = (mode == ParseMode::Exported).then(UnexportedFilter::new);
    let mut pkg = do_type_check(cancel, snapshot, go_files, compiled_files, metadata, mode, deps, filter.as_ref())?;

    if let Some(filter) = filter.as_mut() {
        let (mut missing, mut unexpected) = filter.process_errors(&pkg.type_errors);
        if unexpected.is_empty() && !missing.is_empty() {
            tracing::debug!(package = %metadata.id, ?missing, "discovered missing identifiers");
            pkg = do_type_check(cancel, snapshot, go_files, compiled_files, metadata, mode, deps, Some(&*filter))?;
            (missing, unexpected) = filter.process_errors(&pkg.type_errors);
        }
        if !unexpected.is_empty() || !missing.is_empty() {
            tracing::debug!(
                package = %metadata.id,
                unexpected = unexpected.len(),
                ?missing,
                "falling back to safe trimming"
            );
            pkg = do_type_check(cancel, snapshot, go_files, compiled_files, metadata, mode, deps, None)?;
        }
    }

    if let Some(module) = &metadata.module {
        let version = if is_workspace_module_version(&module.version) {
            String::new()
        } else {
            module.version.clone()
        };
        pkg.version = Some(ModuleVersion {
            path: module.path.clone(),
            version,
        });
    }

    // Packages checked for their exported surface never show diagnostics.
    if mode != ParseMode::Full {
        return Ok(Arc::new(pkg));
    }

    // Packages without compiled files have reported these already.
    let list_errors = if metadata.compiled_files.is_empty() {
        &[][..]
    } else {
        &metadata.errors[..]
    };
    for err in list_errors {
        match list_error_diagnostics(&pkg, err) {
            Ok(diags) => pkg.diagnostics.extend(diags),
            Err(e) => tracing::error!(package = %metadata.id, error = %e, "unable to position list error"),
        }
    }

    let mut unparseable: HashSet<Uri> = HashSet::new();
    for err in pkg.parse_errors.clone() {
        match parse_error_diagnostics(&pkg, &err) {
            Ok(diags) => {
                for diag in diags {
                    unparseable.insert(diag.uri.clone());
                    pkg.diagnostics.push(diag);
                }
            }
            Err(e) => tracing::error!(package = %metadata.id, error = %e, "unable to position parse error"),
        }
    }

    // Positions in repaired files are unreliable.
    if pkg.has_fixed_files {
        return Ok(Arc::new(pkg));
    }

    let unexpanded = std::mem::take(&mut pkg.type_errors);
    let related = snapshot.options().related_information_supported;
    for err in expand_errors(&unexpanded, related) {
        let diags = match type_error_diagnostics(&pkg, &err) {
            Ok(diags) => diags,
            Err(e) => {
                tracing::error!(package = %metadata.id, error = %e, "unable to position type error");
                continue;
            }
        };
        pkg.type_errors.push(err.primary);
        pkg.diagnostics
            .extend(diags.into_iter().filter(|d| !unparseable.contains(&d.uri)));
    }

    let deps_diagnostics = deps_errors(cancel, snapshot, &pkg)?;
    pkg.diagnostics.extend(deps_diagnostics);
    Ok(Arc::new(pkg))
}

#[allow(clippy::too_many_arguments)]
fn do_type_check(
    cancel: &CancelToken,
    snapshot: &Snapshot,
    go_files: &[FileHandle],
    compiled_files: &[FileHandle],
    metadata: &Arc<Metadata>,
    mode: ParseMode,
    deps: &BTreeMap<PackagePath, Arc<PackageHandle>>,
    filter: Option<&UnexportedFilter>,
) -> Result<Package, CacheError> {
    let _span = tracing::debug_span!("type_check", package = %metadata.id, %mode).entered();
    let mut pkg = Package::new(Arc::clone(metadata), mode);

    // Non-compiled files are kept for positioning only.
    let go_mode = if mode == ParseMode::Full {
        ParseMode::Full
    } else {
        ParseMode::Header
    };
    for fh in go_files {
        let (file, _) = snapshot.parse_file(fh, go_mode)?;
        pkg.go_files.push(file);
    }

    parse_compiled_files(snapshot, compiled_files, mode, &mut pkg, filter)?;

    let services = snapshot.services();
    if metadata.path.as_str() == UNSAFE_PACKAGE {
        pkg.types = services.checker.unsafe_package();
        return Ok(pkg);
    }

    if metadata.compiled_files.is_empty() {
        // The loader most likely failed; show its errors instead.
        let mut found = false;
        for err in &metadata.errors {
            if let Ok(diags) = list_error_diagnostics(&pkg, err) {
                found = true;
                pkg.diagnostics.extend(diags);
            }
        }
        if found {
            return Ok(pkg);
        }
        return Err(CacheError::NoParsedFiles {
            path: metadata.path.clone(),
            expected: metadata.compiled_files.clone(),
            errors: metadata.errors.iter().map(|e| e.message.clone()).collect(),
        });
    }

    let lang_version = metadata
        .module
        .as_ref()
        .map(|m| m.lang_version.as_str())
        .filter(|v| !v.is_empty())
        .and_then(|v| {
            if valid_language_version(v) {
                Some(v.to_string())
            } else {
                tracing::warn!(package = %metadata.id, version = v, "ignoring malformed language version");
                None
            }
        });

    let input = CheckInput {
        path: metadata.path.clone(),
        name: metadata.name.clone(),
        files: pkg.compiled_files.clone(),
        lang_version,
        ignore_func_bodies: mode != ParseMode::Full,
        disable_unused_import_check: mode != ParseMode::Full,
    };
    let importer = PackageImporter {
        cancel,
        snapshot,
        metadata,
        deps,
        imports: RefCell::new(BTreeMap::new()),
        interrupted: RefCell::new(None),
    };
    let mut type_errors = Vec::new();
    let output = services
        .checker
        .check(input, &importer, &mut |err: TypeError| type_errors.push(err));

    // A cancelled run reports spurious errors; drop them.
    cancel.check()?;
    // So does a run whose dependencies became unreachable.
    if let Some(err) = importer.interrupted.into_inner() {
        return Err(err);
    }

    pkg.types = output.types;
    pkg.type_info = output.info;
    pkg.type_errors = type_errors;
    pkg.imports = importer.imports.into_inner();
    Ok(pkg)
}

/// Parses the compiled files at `mode`, trimming them in exported mode.
///
/// Exported-mode trees are copied out of the parse cache before trimming.
fn parse_compiled_files(
    snapshot: &Snapshot,
    compiled_files: &[FileHandle],
    mode: ParseMode,
    pkg: &mut Package,
    filter: Option<&UnexportedFilter>,
) -> Result<(), CacheError> {
    let parse_mode = if mode == ParseMode::Exported {
        ParseMode::Full
    } else {
        mode
    };
    let mut owned: Vec<ParsedFile> = Vec::new();
    for fh in compiled_files {
        let (file, fixed) = snapshot.parse_file(fh, parse_mode)?;
        pkg.parse_errors.extend(file.parse_errors.iter().cloned());
        // Type errors are meaningless once the parser has repaired a file.
        pkg.has_fixed_files |= fixed;
        if mode == ParseMode::Exported {
            let mut file = ParsedFile::clone(&file);
            file.mode = ParseMode::Exported;
            owned.push(file);
        } else {
            pkg.compiled_files.push(file);
        }
    }
    if mode != ParseMode::Exported {
        return Ok(());
    }
    match filter {
        Some(filter) => filter.filter(&mut owned),
        None => owned.iter_mut().for_each(trim_file),
    }
    pkg.compiled_files = owned.into_iter().map(Arc::new).collect();
    Ok(())
}

/// Resolves the checker's imports against the package's dependency handles,
/// checking each dependency on first use.
///
/// The first dependency check that failed for a transient reason is kept in
/// `interrupted`.
struct PackageImporter<'a> {
    cancel: &'a CancelToken,
    snapshot: &'a Snapshot,
    metadata: &'a Metadata,
    deps: &'a BTreeMap<PackagePath, Arc<PackageHandle>>,
    imports: RefCell<BTreeMap<PackagePath, Arc<Package>>>,
    interrupted: RefCell<Option<CacheError>>,
}

impl Importer for PackageImporter<'_> {
    fn import(&self, path: &str) -> Result<Arc<Types>, ImportError> {
        self.cancel.check()?;
        let dep = resolve_import_path(path, &self.metadata.path, self.deps)
            .ok_or_else(|| missing_pkg_error(self.snapshot, path))?;
        if !is_valid_import(self.metadata.path.as_str(), dep.metadata().path.as_str()) {
            return Err(ImportError::InvalidInternalImport {
                path: path.to_string(),
            });
        }
        let dep_pkg = dep.check(self.cancel, self.snapshot).inspect_err(|err| {
            if err.is_transient() {
                self.interrupted.borrow_mut().get_or_insert_with(|| err.clone());
            }
        })?;
        let types = Arc::clone(dep_pkg.types());
        self.imports
            .borrow_mut()
            .insert(dep_pkg.path().clone(), dep_pkg);
        Ok(types)
    }
}
