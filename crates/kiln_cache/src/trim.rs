//! Exported-surface trimming of parsed files.
//!
//! Packages consulted only for their public interface are checked over
//! trimmed trees. Function bodies never contribute to the exported surface,
//! so both strategies here drop them. Variable and constant initializers are
//! kept because an initializer can determine the declared type.
//!
//! [`trim_file`] is the blanket strategy: every declaration survives and only
//! bodies go. [`UnexportedFilter`] additionally drops unexported declarations
//! the exported surface does not reach, and learns from the checker's
//! "undeclared name" errors which names it removed wrongly.

use crate::types::{TypeError, TypeErrorKind};
use kiln_source::{Decl, DeclKind, ParsedFile};
use std::collections::{BTreeSet, HashSet};

fn strip_body(decl: &mut Decl) {
    if decl.kind == DeclKind::Func {
        decl.body = None;
    }
}

/// Removes every function body from `file`.
pub fn trim_file(file: &mut ParsedFile) {
    file.decls.iter_mut().for_each(strip_body);
}

/// Trims unexported declarations that the exported surface does not need.
#[derive(Clone, Debug, Default)]
pub struct UnexportedFilter {
    uses: HashSet<String>,
}

impl UnexportedFilter {
    /// Creates a filter that keeps only what the exported surface reaches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `name` has been learned as needed.
    pub fn keeps(&self, name: &str) -> bool {
        self.uses.contains(name)
    }

    /// Trims `files` in place.
    ///
    /// Declarations survive if they are exported, were learned from earlier
    /// errors, or are referenced by the signature of a surviving declaration
    /// in any file of the package.
    pub fn filter(&self, files: &mut [ParsedFile]) {
        let mut keep: HashSet<&str> = self.uses.iter().map(String::as_str).collect();
        for decl in files.iter().flat_map(|f| &f.decls) {
            if decl.exported {
                keep.insert(&decl.name);
            }
        }
        loop {
            let before = keep.len();
            for decl in files.iter().flat_map(|f| &f.decls) {
                if !keep.contains(decl.name.as_str()) {
                    continue;
                }
                keep.extend(decl.signature_refs.iter().map(String::as_str));
                if decl.kind != DeclKind::Func {
                    if let Some(body) = &decl.body {
                        keep.extend(body.refs.iter().map(String::as_str));
                    }
                }
            }
            if keep.len() == before {
                break;
            }
        }
        let keep: HashSet<String> = keep.into_iter().map(str::to_owned).collect();
        for file in files.iter_mut() {
            file.decls.retain(|decl| keep.contains(&decl.name));
            file.decls.iter_mut().for_each(strip_body);
        }
    }

    /// Classifies the errors of a check over filtered files.
    ///
    /// Returns the undeclared names, which are remembered so the next
    /// [`filter`](Self::filter) keeps them, and the errors trimming cannot
    /// explain. Missing-return errors are expected once bodies are gone and
    /// are ignored.
    pub fn process_errors(&mut self, errors: &[TypeError]) -> (BTreeSet<String>, Vec<TypeError>) {
        let mut missing = BTreeSet::new();
        let mut unexpected = Vec::new();
        for err in errors {
            match &err.kind {
                TypeErrorKind::MissingReturn => {}
                TypeErrorKind::Undeclared { name } => {
                    missing.insert(name.clone());
                    self.uses.insert(name.clone());
                }
                TypeErrorKind::Other => unexpected.push(err.clone()),
            }
        }
        (missing, unexpected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_source::{Body, LineIndex, Location, ParseMode, Span, Uri};

    fn decl(name: &str, kind: DeclKind, sig: &[&str], body: &[&str]) -> Decl {
        Decl {
            name: name.to_string(),
            kind,
            exported: name.starts_with(|c: char| c.is_ascii_uppercase()),
            span: Span::new(0, 1),
            signature_refs: sig.iter().map(|s| s.to_string()).collect(),
            body: Some(Body {
                span: Span::new(0, 1),
                refs: body.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn file(decls: Vec<Decl>) -> ParsedFile {
        ParsedFile {
            uri: Uri::new("file:///p/p.k"),
            mode: ParseMode::Exported,
            package_name: "p".to_string(),
            imports: vec![],
            decls,
            parse_errors: vec![],
            line_index: LineIndex::new(b""),
        }
    }

    fn names(f: &ParsedFile) -> Vec<&str> {
        f.decls.iter().map(|d| d.name.as_str()).collect()
    }

    fn undeclared(name: &str) -> TypeError {
        TypeError {
            location: Location::new(Uri::new("file:///p/p.k"), Span::new(0, 1)),
            message: format!("undeclared name: {name}"),
            soft: false,
            kind: TypeErrorKind::Undeclared {
                name: name.to_string(),
            },
        }
    }

    #[test]
    fn blanket_trim_keeps_declarations() {
        let mut f = file(vec![
            decl("Run", DeclKind::Func, &[], &["helper"]),
            decl("helper", DeclKind::Func, &[], &[]),
            decl("limit", DeclKind::Const, &[], &["base"]),
        ]);
        trim_file(&mut f);
        assert_eq!(names(&f), vec!["Run", "helper", "limit"]);
        assert!(f.decls[0].body.is_none());
        assert!(f.decls[2].body.is_some());
    }

    #[test]
    fn filter_follows_signatures_across_files() {
        let mut files = vec![
            file(vec![
                decl("Run", DeclKind::Func, &["config"], &["helper"]),
                decl("helper", DeclKind::Func, &[], &[]),
            ]),
            file(vec![
                decl("config", DeclKind::Type, &["option"], &[]),
                decl("option", DeclKind::Type, &[], &[]),
                decl("unused", DeclKind::Var, &[], &[]),
            ]),
        ];
        UnexportedFilter::new().filter(&mut files);
        assert_eq!(names(&files[0]), vec!["Run"]);
        assert_eq!(names(&files[1]), vec!["config", "option"]);
        assert!(files[0].decls[0].body.is_none());
    }

    #[test]
    fn learned_names_survive_next_filter() {
        let mut filter = UnexportedFilter::new();
        let errors = vec![
            undeclared("helper"),
            TypeError {
                kind: TypeErrorKind::MissingReturn,
                ..undeclared("x")
            },
        ];
        let (missing, unexpected) = filter.process_errors(&errors);
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["helper"]);
        assert!(unexpected.is_empty());
        assert!(filter.keeps("helper"));

        let mut files = vec![file(vec![
            decl("Run", DeclKind::Func, &[], &[]),
            decl("helper", DeclKind::Func, &[], &[]),
        ])];
        filter.filter(&mut files);
        assert_eq!(names(&files[0]), vec!["Run", "helper"]);
    }

    #[test]
    fn other_errors_are_unexpected() {
        let mut filter = UnexportedFilter::new();
        let other = TypeError {
            kind: TypeErrorKind::Other,
            ..undeclared("y")
        };
        let (missing, unexpected) = filter.process_errors(&[other]);
        assert!(missing.is_empty());
        assert_eq!(unexpected.len(), 1);
    }

    #[test]
    fn initializer_refs_are_followed() {
        let mut files = vec![file(vec![
            decl("Limit", DeclKind::Const, &[], &["base"]),
            decl("base", DeclKind::Const, &[], &[]),
        ])];
        UnexportedFilter::new().filter(&mut files);
        assert_eq!(names(&files[0]), vec!["Limit", "base"]);
    }
}
