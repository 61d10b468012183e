//! Import resolution against a package's dependency handles.

use crate::error::ImportError;
use crate::handle::PackageHandle;
use crate::metadata::PackagePath;
use crate::snapshot::Snapshot;
use kiln_config::{DependencyMode, WorkspaceOptions};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// The synthetic package the loader creates for files named on its command line.
const COMMAND_LINE_ARGUMENTS: &str = "command-line-arguments";

/// Finds the dependency handle that `import_path` refers to from the package
/// at `current`.
///
/// Tries an exact path match, then `<ancestor>/vendor/<import_path>` for
/// each ancestor directory of `current`, then a dependency whose id (rather
/// than path) equals `import_path`.
pub fn resolve_import_path<'a>(
    import_path: &str,
    current: &PackagePath,
    deps: &'a BTreeMap<PackagePath, Arc<PackageHandle>>,
) -> Option<&'a Arc<PackageHandle>> {
    if let Some(dep) = deps.get(import_path) {
        return Some(dep);
    }
    let mut search_dir = parent_dir(current.as_str());
    loop {
        if let Some(dep) = deps.get(vendor_path(search_dir, import_path).as_str()) {
            return Some(dep);
        }
        let next = parent_dir(search_dir);
        if next == search_dir {
            break;
        }
        search_dir = next;
    }
    deps.values().find(|dep| dep.id().as_str() == import_path)
}

/// Returns the directory part of a slash-separated path, `.` if there is none.
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => ".",
    }
}

fn vendor_path(dir: &str, import_path: &str) -> String {
    match dir {
        "." => format!("vendor/{import_path}"),
        "/" => format!("/vendor/{import_path}"),
        _ => format!("{dir}/vendor/{import_path}"),
    }
}

/// Returns `true` if the package at `pkg_path` may import `import_pkg_path`.
///
/// A path containing an `internal` element is importable only from the tree
/// rooted at that element's parent.
pub fn is_valid_import(pkg_path: &str, import_pkg_path: &str) -> bool {
    let segments: Vec<&str> = import_pkg_path.split('/').collect();
    let Some(i) = segments.iter().rposition(|s| *s == "internal") else {
        return true;
    };
    if pkg_path.contains(COMMAND_LINE_ARGUMENTS) {
        return true;
    }
    let root = segments[..i].join("/");
    root.is_empty() || pkg_path == root || pkg_path.starts_with(&format!("{root}/"))
}

/// Describes a package that no dependency provides.
pub fn missing_package_message(
    workspace: &WorkspaceOptions,
    initialization_error: Option<&str>,
    import_path: &str,
) -> String {
    let mut msg = String::new();
    match workspace.mode {
        DependencyMode::Legacy => {
            let _ = write!(
                msg,
                "cannot find package {import_path:?} in any of \n\t{} (from toolchain root)",
                workspace.toolchain_root.join(import_path).display()
            );
            for root in &workspace.search_paths {
                let _ = write!(msg, "\n\t{} (from search path)", root.join(import_path).display());
            }
        }
        DependencyMode::Module => {
            let _ = write!(msg, "no required module provides package {import_path:?}");
            if let Some(err) = initialization_error {
                let _ = write!(msg, "(workspace configuration error: {err})");
            }
        }
    }
    msg
}

pub(crate) fn missing_pkg_error(snapshot: &Snapshot, import_path: &str) -> ImportError {
    let init_error = snapshot.services().metadata.initialization_error();
    ImportError::MissingPackage(missing_package_message(
        &snapshot.options().workspace,
        init_error.as_deref(),
        import_path,
    ))
}
