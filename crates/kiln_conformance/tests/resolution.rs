//! Tests for import resolution, visibility and module information.

use kiln_cache::{resolve_import_path, ModuleVersion, PackageId};
use kiln_common::CancelToken;
use kiln_config::{CacheOptions, DependencyMode, WorkspaceOptions};
use kiln_conformance::{PackageSpec, Workspace};
use kiln_source::ParseMode;
use std::path::PathBuf;
use std::sync::Arc;

fn check(ws: &Workspace, id: &PackageId, options: CacheOptions) -> Arc<kiln_cache::Package> {
    ws.cache(options)
        .snapshot()
        .package(&CancelToken::new(), id, ParseMode::Full)
        .unwrap()
}

fn importer_of(ws: &Workspace, import: &str) -> PackageId {
    ws.add(
        PackageSpec::new("app")
            .file("app.k", &format!("package app\nimport {import}\n"))
            .workspace(),
    )
}

#[test]
fn vendored_dependency_resolves() {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("cmd/vendor/lib/v").file("v.k", "package v\nfunc V\n"));
    let app = ws.add(
        PackageSpec::new("cmd/app")
            .file("app.k", "package app\nimport lib/v\nfunc Main = v.V\n")
            .dep("cmd/vendor/lib/v")
            .workspace(),
    );
    let pkg = check(&ws, &app, CacheOptions::default());
    assert!(pkg.diagnostics().is_empty(), "{:?}", pkg.diagnostics());
    assert!(pkg.imports().contains_key("cmd/vendor/lib/v"));
}

#[test]
fn resolution_is_idempotent() {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("cmd/vendor/lib/v").file("v.k", "package v\nfunc V\n"));
    let app = ws.add(
        PackageSpec::new("cmd/app")
            .file("app.k", "package app\nimport lib/v\n")
            .dep("cmd/vendor/lib/v"),
    );
    let snapshot = ws.cache(CacheOptions::default()).snapshot();
    let ph = snapshot
        .build_package_handle(&CancelToken::new(), &app, ParseMode::Full)
        .unwrap();
    let path = &ph.metadata().path;
    let first = resolve_import_path("lib/v", path, ph.deps()).unwrap();
    let second = resolve_import_path("lib/v", path, ph.deps()).unwrap();
    assert!(Arc::ptr_eq(first, second));
    assert!(resolve_import_path("lib/w", path, ph.deps()).is_none());
}

#[test]
fn module_mode_missing_package() {
    let ws = Workspace::new();
    let app = importer_of(&ws, "gone");
    let pkg = check(&ws, &app, CacheOptions::default());
    assert_eq!(
        pkg.diagnostics()[0].message,
        "could not import gone (no required module provides package \"gone\")"
    );
}

#[test]
fn module_mode_reports_initialization_error() {
    let ws = Workspace::new();
    let app = importer_of(&ws, "gone");
    ws.metadata.set_initialization_error(Some("malformed kiln.mod"));
    let pkg = check(&ws, &app, CacheOptions::default());
    assert_eq!(
        pkg.diagnostics()[0].message,
        "could not import gone (no required module provides package \"gone\"\
         (workspace configuration error: malformed kiln.mod))"
    );
}

#[test]
fn legacy_mode_lists_search_roots() {
    let ws = Workspace::new();
    let app = importer_of(&ws, "gone");
    let options = CacheOptions {
        workspace: WorkspaceOptions {
            mode: DependencyMode::Legacy,
            toolchain_root: PathBuf::from("/kiln/root"),
            search_paths: vec![PathBuf::from("/src")],
        },
        ..CacheOptions::default()
    };
    let pkg = check(&ws, &app, options);
    assert_eq!(
        pkg.diagnostics()[0].message,
        "could not import gone (cannot find package \"gone\" in any of \n\
         \t/kiln/root/gone (from toolchain root)\n\
         \t/src/gone (from search path))"
    );
}

#[test]
fn internal_package_visibility() {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("corp/internal/secret").file("s.k", "package secret\nfunc Key\n"));
    let outsider = ws.add(
        PackageSpec::new("app")
            .file("app.k", "package app\nimport corp/internal/secret\nfunc Main = secret.Key\n")
            .dep("corp/internal/secret")
            .workspace(),
    );
    let insider = ws.add(
        PackageSpec::new("corp/tool")
            .file("tool.k", "package tool\nimport corp/internal/secret\nfunc Main = secret.Key\n")
            .dep("corp/internal/secret")
            .workspace(),
    );

    let pkg = check(&ws, &outsider, CacheOptions::default());
    assert_eq!(pkg.diagnostics().len(), 1);
    assert_eq!(
        pkg.diagnostics()[0].message,
        "could not import corp/internal/secret (invalid use of internal package corp/internal/secret)"
    );
    assert!(check(&ws, &insider, CacheOptions::default()).diagnostics().is_empty());
}

#[test]
fn unsafe_package_is_builtin() {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("unsafe").file("unsafe.k", "package unsafe\n"));
    let app = ws.add(
        PackageSpec::new("app")
            .file("app.k", "package app\nimport unsafe\nfunc Main = unsafe.Pointer\n")
            .dep("unsafe")
            .workspace(),
    );
    let pkg = check(&ws, &app, CacheOptions::default());
    assert!(pkg.diagnostics().is_empty(), "{:?}", pkg.diagnostics());
    assert_eq!(ws.checker.invocations("unsafe"), 0);
}

#[test]
fn workspace_module_version_is_suppressed() {
    let ws = Workspace::new();
    let local = ws.add(
        PackageSpec::new("m/local")
            .file("l.k", "package local\n")
            .module("m", "v0.0.0-workspace", "1.21"),
    );
    let released = ws.add(
        PackageSpec::new("r/lib")
            .file("r.k", "package lib\n")
            .module("r", "v1.4.0", "1.21"),
    );
    let local_pkg = check(&ws, &local, CacheOptions::default());
    assert_eq!(
        local_pkg.version(),
        Some(&ModuleVersion {
            path: "m".to_string(),
            version: String::new(),
        })
    );
    let released_pkg = check(&ws, &released, CacheOptions::default());
    assert_eq!(released_pkg.version().unwrap().version, "v1.4.0");
}

#[test]
fn language_version_validated_before_checking() {
    let ws = Workspace::new();
    let good = ws.add(PackageSpec::new("a").file("a.k", "package a\n").module("a", "v1.0.0", "1.21"));
    let bad = ws.add(PackageSpec::new("b").file("b.k", "package b\n").module("b", "v1.0.0", "go1.21"));
    check(&ws, &good, CacheOptions::default());
    check(&ws, &bad, CacheOptions::default());
    assert_eq!(ws.checker.last_input("a").unwrap().lang_version.as_deref(), Some("1.21"));
    assert_eq!(ws.checker.last_input("b").unwrap().lang_version, None);
}
