//! Conversion of loader, syntax and type errors into diagnostics.

use crate::error::CacheError;
use crate::metadata::{ListError, PackageError, PackageId};
use crate::package::Package;
use crate::snapshot::Snapshot;
use crate::types::TypeError;
use kiln_common::CancelToken;
use kiln_diagnostics::{Diagnostic, DiagnosticSource, RelatedInformation};
use kiln_source::{ImportSpec, Location, ParseError, ParsedFile, ResolvedSpan, Span, Uri};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A primary type error together with the secondary errors that followed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendedError {
    /// The main error.
    pub primary: TypeError,
    /// Related errors at other locations, without their leading tab.
    pub secondaries: Vec<TypeError>,
}

impl fmt::Display for ExtendedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary.message)
    }
}

/// Groups each primary error with the tab-prefixed secondaries following it,
/// and clones every group once per secondary with the primary relocated to
/// that secondary's position.
///
/// A relocated clone refers back to the original primary: with
/// `supports_related_information` the message reads `<primary> (see details)`,
/// otherwise the secondary is inlined as `<primary> (this error: <secondary>)`.
/// The clone's secondaries are the original primary followed by all original
/// secondaries, the relocated one marked `(this error)`.
pub fn expand_errors(errors: &[TypeError], supports_related_information: bool) -> Vec<ExtendedError> {
    let mut result = Vec::new();
    let mut i = 0;
    while i < errors.len() {
        let mut original = ExtendedError {
            primary: errors[i].clone(),
            secondaries: Vec::new(),
        };
        i += 1;
        while let Some(secondary) = errors.get(i).filter(|e| e.is_secondary()) {
            let mut secondary = secondary.clone();
            secondary.message.remove(0);
            original.secondaries.push(secondary);
            i += 1;
        }

        let mut clones = Vec::with_capacity(original.secondaries.len());
        for (index, main_secondary) in original.secondaries.iter().enumerate() {
            let mut relocated = main_secondary.clone();
            relocated.message = if supports_related_information {
                format!("{} (see details)", original.primary.message)
            } else {
                format!(
                    "{} (this error: {})",
                    original.primary.message, main_secondary.message
                )
            };
            relocated.soft = original.primary.soft;

            let mut secondaries = Vec::with_capacity(original.secondaries.len() + 1);
            secondaries.push(original.primary.clone());
            for (j, secondary) in original.secondaries.iter().enumerate() {
                let mut secondary = secondary.clone();
                if j == index {
                    secondary.message.push_str(" (this error)");
                }
                secondaries.push(secondary);
            }
            clones.push(ExtendedError {
                primary: relocated,
                secondaries,
            });
        }
        result.push(original);
        result.extend(clones);
    }
    result
}

fn position(pkg: &Package, location: &Location, what: &str) -> Result<ResolvedSpan, CacheError> {
    let unpositioned = || CacheError::Position {
        uri: location.uri.clone(),
        what: what.to_string(),
    };
    let file = pkg.file_for(&location.uri).ok_or_else(unpositioned)?;
    file.line_index.resolve(location.span).ok_or_else(unpositioned)
}

/// Converts an expanded type error into a diagnostic at its primary
/// location, with every secondary attached as related information.
pub(crate) fn type_error_diagnostics(pkg: &Package, err: &ExtendedError) -> Result<Vec<Diagnostic>, CacheError> {
    let range = position(pkg, &err.primary.location, "type error")?;
    let mut diag = Diagnostic::error(
        err.primary.location.uri.clone(),
        err.primary.location.span,
        range,
        DiagnosticSource::TypeError,
        err.primary.message.clone(),
    );
    for secondary in &err.secondaries {
        let range = position(pkg, &secondary.location, "related type error")?;
        diag = diag.with_related(RelatedInformation::new(
            secondary.location.uri.clone(),
            secondary.location.span,
            range,
            secondary.message.clone(),
        ));
    }
    Ok(vec![diag])
}

pub(crate) fn parse_error_diagnostics(pkg: &Package, err: &ParseError) -> Result<Vec<Diagnostic>, CacheError> {
    let range = position(pkg, &err.location, "syntax error")?;
    Ok(vec![Diagnostic::error(
        err.location.uri.clone(),
        err.location.span,
        range,
        DiagnosticSource::ParseError,
        err.message.clone(),
    )])
}

/// Converts a loader error. An error without a position is pinned to the
/// start of the package's first file.
pub(crate) fn list_error_diagnostics(pkg: &Package, err: &ListError) -> Result<Vec<Diagnostic>, CacheError> {
    let location = match &err.position {
        Some(location) => location.clone(),
        None => {
            let first = pkg
                .compiled_files()
                .first()
                .or_else(|| pkg.go_files().first())
                .ok_or_else(|| CacheError::Position {
                    uri: kiln_source::Uri::new(pkg.path().as_str()),
                    what: "package list error".to_string(),
                })?;
            Location::new(first.uri.clone(), Span::point(0))
        }
    };
    let range = position(pkg, &location, "package list error")?;
    Ok(vec![Diagnostic::error(
        location.uri,
        location.span,
        range,
        DiagnosticSource::ListError,
        err.message.clone(),
    )])
}

/// Pins errors in transitive dependencies to the import sites (or the
/// manifest requirement) in `pkg` that pulled them in.
///
/// Errors whose direct importer is a workspace package are skipped; that
/// package reports them itself. Errors that would land on the same site with
/// the same message are reported once.
pub(crate) fn deps_errors(
    cancel: &CancelToken,
    snapshot: &Snapshot,
    pkg: &Package,
) -> Result<Vec<Diagnostic>, CacheError> {
    let services = snapshot.services();
    let relevant: Vec<&PackageError> = pkg
        .metadata()
        .deps_errors
        .iter()
        .filter(|err| match err.import_stack.last() {
            Some(direct_importer) => !services
                .metadata
                .is_workspace_package(&PackageId::new(direct_importer)),
            None => false,
        })
        .collect();
    if relevant.is_empty() {
        return Ok(Vec::new());
    }

    let mut all_imports: HashMap<&str, Vec<(&Arc<ParsedFile>, &ImportSpec)>> = HashMap::new();
    for file in pkg.compiled_files() {
        for import in &file.imports {
            all_imports
                .entry(import.path.as_str())
                .or_default()
                .push((file, import));
        }
    }

    let mut diagnostics = Vec::new();
    let mut seen: HashSet<(Uri, Span, String)> = HashSet::new();
    let mut unpinned = Vec::new();
    for err in &relevant {
        let mut pinned = false;
        for item in err.import_stack.iter().rev() {
            if services.metadata.is_workspace_package(&PackageId::new(item)) {
                break;
            }
            for (file, import) in all_imports.get(item.as_str()).into_iter().flatten() {
                pinned = true;
                let message = format!("error while importing {item}: {}", err.err);
                if !seen.insert((file.uri.clone(), import.span, message.clone())) {
                    continue;
                }
                let range = file.line_index.resolve(import.span).ok_or_else(|| CacheError::Position {
                    uri: file.uri.clone(),
                    what: format!("import of {item}"),
                })?;
                let fixes = services.quick_fixes.missing_import_fixes(&file.uri, item)?;
                diagnostics.push(
                    Diagnostic::error(
                        file.uri.clone(),
                        import.span,
                        range,
                        DiagnosticSource::TypeError,
                        message,
                    )
                    .with_fixes(fixes),
                );
            }
        }
        if !pinned {
            unpinned.push(*err);
        }
    }

    if unpinned.is_empty() {
        return Ok(diagnostics);
    }
    let Some(first) = pkg.compiled_files().first() else {
        return Ok(diagnostics);
    };
    let Some(manifest_uri) = services.metadata.module_manifest_for(&first.uri) else {
        return Ok(diagnostics);
    };
    let fh = services.files.get_file(&manifest_uri, cancel)?;
    let manifest = services.manifests.parse_manifest(&fh)?;

    for err in unpinned {
        for item in err.import_stack.iter().rev() {
            let Some(module) = services
                .metadata
                .metadata(&PackageId::new(item))
                .and_then(|m| m.module.clone())
            else {
                continue;
            };
            let Some(span) = manifest.find_module_reference(&module.path, &module.version) else {
                continue;
            };
            let message = format!("error while importing {item}: {}", err.err);
            if !seen.insert((manifest.uri.clone(), span, message.clone())) {
                break;
            }
            let range = manifest.line_index.resolve(span).ok_or_else(|| CacheError::Position {
                uri: manifest.uri.clone(),
                what: format!("requirement on {}", module.path),
            })?;
            let fixes = services.quick_fixes.missing_import_fixes(&manifest.uri, item)?;
            diagnostics.push(
                Diagnostic::error(
                    manifest.uri.clone(),
                    span,
                    range,
                    DiagnosticSource::TypeError,
                    message,
                )
                .with_fixes(fixes),
            );
            break;
        }
    }
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(message: &str, offset: u32) -> TypeError {
        TypeError::new(
            Location::new(Uri::new("file:///p/p.k"), Span::new(offset, offset + 1)),
            message,
        )
    }

    #[test]
    fn lone_primaries_pass_through() {
        let expanded = expand_errors(&[err("a", 0), err("b", 5)], true);
        assert_eq!(expanded.len(), 2);
        assert!(expanded.iter().all(|e| e.secondaries.is_empty()));
        assert_eq!(expanded[1].primary.message, "b");
    }

    #[test]
    fn secondaries_are_cloned_with_related_information() {
        let errors = [
            err("x redeclared", 10),
            err("\tother declaration of x", 20),
            err("\tthird declaration of x", 30),
        ];
        let expanded = expand_errors(&errors, true);
        assert_eq!(expanded.len(), 3);

        let original = &expanded[0];
        assert_eq!(original.primary.message, "x redeclared");
        assert_eq!(original.secondaries.len(), 2);
        assert_eq!(original.secondaries[0].message, "other declaration of x");

        let first_clone = &expanded[1];
        assert_eq!(first_clone.primary.message, "x redeclared (see details)");
        assert_eq!(first_clone.primary.location.span, Span::new(20, 21));
        assert_eq!(first_clone.secondaries.len(), 3);
        assert_eq!(first_clone.secondaries[0].message, "x redeclared");
        assert_eq!(first_clone.secondaries[1].message, "other declaration of x (this error)");
        assert_eq!(first_clone.secondaries[2].message, "third declaration of x");

        let second_clone = &expanded[2];
        assert_eq!(second_clone.primary.location.span, Span::new(30, 31));
        assert_eq!(second_clone.secondaries[2].message, "third declaration of x (this error)");
    }

    #[test]
    fn secondaries_inline_without_related_information() {
        let errors = [err("x redeclared", 10), err("\tother declaration of x", 20)];
        let expanded = expand_errors(&errors, false);
        assert_eq!(expanded.len(), 2);
        assert_eq!(
            expanded[1].primary.message,
            "x redeclared (this error: other declaration of x)"
        );
    }

    #[test]
    fn groups_stay_in_order() {
        let errors = [
            err("first", 0),
            err("\tfirst more", 1),
            err("second", 2),
        ];
        let expanded = expand_errors(&errors, true);
        let messages: Vec<&str> = expanded.iter().map(|e| e.primary.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "first (see details)", "second"]);
    }

    #[test]
    fn clone_inherits_softness() {
        let mut primary = err("unused x", 0);
        primary.soft = true;
        let expanded = expand_errors(&[primary, err("\tdeclared here", 4)], true);
        assert!(expanded[1].primary.soft);
    }
}
