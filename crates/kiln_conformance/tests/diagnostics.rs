//! Tests for the diagnostics attached to fully checked packages.

use kiln_cache::PackageId;
use kiln_common::CancelToken;
use kiln_config::CacheOptions;
use kiln_conformance::{init_logging, uri_for, PackageSpec, Workspace};
use kiln_diagnostics::DiagnosticSource;
use kiln_source::{ParseMode, Span, Uri};
use std::sync::Arc;

fn check(ws: &Workspace, id: &PackageId, options: CacheOptions) -> Arc<kiln_cache::Package> {
    ws.cache(options)
        .snapshot()
        .package(&CancelToken::new(), id, ParseMode::Full)
        .unwrap()
}

#[test]
fn redeclaration_expands_to_both_sites() {
    init_logging();
    let ws = Workspace::new();
    let id = ws.add(PackageSpec::new("app").file("app.k", "package app\ntype T\ntype T\n").workspace());
    let pkg = check(&ws, &id, CacheOptions::default());

    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 2, "{diags:?}");
    assert_eq!(diags[0].message, "T redeclared in this block");
    assert_eq!(diags[0].span, Span::new(19, 25));
    assert_eq!(diags[0].related.len(), 1);
    assert_eq!(diags[0].related[0].message, "other declaration of T");

    assert_eq!(diags[1].span, Span::new(12, 18));
    assert_eq!(
        diags[1].message,
        "T redeclared in this block (this error: other declaration of T)"
    );
    assert_eq!(diags[1].related.len(), 2);
    assert_eq!(diags[1].related[1].message, "other declaration of T (this error)");
    assert_eq!(pkg.type_errors().len(), 2);
}

#[test]
fn related_information_changes_phrasing() {
    let ws = Workspace::new();
    let id = ws.add(PackageSpec::new("app").file("app.k", "package app\ntype T\ntype T\n").workspace());
    let options = CacheOptions {
        related_information_supported: true,
        ..CacheOptions::default()
    };
    let pkg = check(&ws, &id, options);
    assert_eq!(pkg.diagnostics()[1].message, "T redeclared in this block (see details)");
}

#[test]
fn syntax_error_hides_type_errors_in_that_file_only() {
    let ws = Workspace::new();
    let id = ws.add(
        PackageSpec::new("p")
            .file("a.k", "package p\n???\nfunc A = missing\n")
            .file("b.k", "package p\nfunc B = absent\n")
            .workspace(),
    );
    let pkg = check(&ws, &id, CacheOptions::default());
    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 2, "{diags:?}");
    assert_eq!(diags[0].source, DiagnosticSource::ParseError);
    assert_eq!(diags[0].uri, uri_for("p", "a.k"));
    assert_eq!(diags[1].source, DiagnosticSource::TypeError);
    assert_eq!(diags[1].uri, uri_for("p", "b.k"));
    assert_eq!(diags[1].message, "undeclared name: absent");
}

#[test]
fn repaired_file_hides_all_type_errors() {
    let ws = Workspace::new();
    let id = ws.add(
        PackageSpec::new("p")
            .file("a.k", "package p\n!! repaired\n")
            .file("b.k", "package p\nfunc B = absent\n")
            .workspace(),
    );
    let pkg = check(&ws, &id, CacheOptions::default());
    assert!(pkg.has_fixed_files());
    assert!(pkg.diagnostics().is_empty(), "{:?}", pkg.diagnostics());
}

#[test]
fn list_errors_are_positioned() {
    let ws = Workspace::new();
    let id = ws.add(
        PackageSpec::new("p")
            .file("a.k", "package p\n")
            .list_error(Some(("a.k", Span::new(0, 7))), "bad build tag")
            .list_error(None, "somewhere in p")
            .workspace(),
    );
    let pkg = check(&ws, &id, CacheOptions::default());
    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 2);
    assert!(diags.iter().all(|d| d.source == DiagnosticSource::ListError));
    assert_eq!(diags[0].span, Span::new(0, 7));
    assert_eq!(diags[1].span, Span::point(0));
    assert_eq!(diags[1].range.start_line, 1);
}

#[test]
fn exported_mode_has_no_diagnostics() {
    let ws = Workspace::new();
    let id = ws.add(PackageSpec::new("p").file("a.k", "package p\nfunc B: Nope\n"));
    let pkg = ws
        .cache(CacheOptions::default())
        .snapshot()
        .package(&CancelToken::new(), &id, ParseMode::Exported)
        .unwrap();
    assert!(pkg.diagnostics().is_empty());
    assert!(!pkg.type_errors().is_empty());
}

fn app_with_broken_dependency(stack: &[&str]) -> (Workspace, PackageId) {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("lib/b").file("b.k", "package b\nfunc Helper\n"));
    ws.add(
        PackageSpec::new("other/y")
            .file("y.k", "package y\n")
            .module("other/y", "v1.0.0", "1.20"),
    );
    let app = ws.add(
        PackageSpec::new("app")
            .file("app.k", "package app\nimport lib/b\nfunc Main = b.Helper\n")
            .dep("lib/b")
            .deps_error(stack, "lib/c: no such package")
            .workspace(),
    );
    (ws, app)
}

#[test]
fn dependency_error_pinned_to_import() {
    let (ws, app) = app_with_broken_dependency(&["app", "lib/b"]);
    let pkg = check(&ws, &app, CacheOptions::default());
    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].uri, uri_for("app", "app.k"));
    assert_eq!(diags[0].span, Span::new(12, 24));
    assert_eq!(
        diags[0].message,
        "error while importing lib/b: lib/c: no such package"
    );
    assert_eq!(
        diags[0].suggested_fixes[0].command.as_deref(),
        Some("kiln get lib/b")
    );
}

#[test]
fn dependency_errors_at_one_import_are_reported_once() {
    let ws = Workspace::new();
    ws.add(PackageSpec::new("lib/b").file("b.k", "package b\nfunc Helper\n"));
    let app = ws.add(
        PackageSpec::new("app")
            .file("app.k", "package app\nimport lib/b\nfunc Main = b.Helper\n")
            .dep("lib/b")
            .deps_error(&["app", "lib/b"], "lib/c: no such package")
            .deps_error(&["app", "lib/b", "lib/x"], "lib/c: no such package")
            .workspace(),
    );
    let pkg = check(&ws, &app, CacheOptions::default());
    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].span, Span::new(12, 24));
}

#[test]
fn dependency_error_under_workspace_importer_is_skipped() {
    let (ws, app) = app_with_broken_dependency(&["app"]);
    let pkg = check(&ws, &app, CacheOptions::default());
    assert!(pkg.diagnostics().is_empty());
}

#[test]
fn unpinned_dependency_error_goes_to_manifest() {
    let (ws, app) = app_with_broken_dependency(&["app", "other/y"]);
    let manifest = Uri::new("file:///ws/kiln.mod");
    ws.files.set(manifest.clone(), "module ws\nrequire other/y v1.0.0\n");
    ws.metadata.set_manifest("file:///ws/", manifest.clone());

    let pkg = check(&ws, &app, CacheOptions::default());
    let diags = pkg.diagnostics();
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].uri, manifest);
    assert_eq!(diags[0].span, Span::new(10, 32));
    assert_eq!(
        diags[0].message,
        "error while importing other/y: lib/c: no such package"
    );
}

#[test]
fn unpinned_dependency_error_without_manifest_is_dropped() {
    let (ws, app) = app_with_broken_dependency(&["app", "other/y"]);
    let pkg = check(&ws, &app, CacheOptions::default());
    assert!(pkg.diagnostics().is_empty());
}
