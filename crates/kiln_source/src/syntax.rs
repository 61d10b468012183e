//! The parsed-file model exchanged with the external parser and type checker.
//!
//! The cache does not interpret source text itself. The parser collaborator
//! reduces each file to this model: the package clause, import declarations
//! with their positions, and top-level declarations with the identifiers their
//! signatures and bodies refer to. That is enough for import resolution,
//! exported-surface trimming, and positioning diagnostics.

use crate::line_index::LineIndex;
use crate::parse_mode::ParseMode;
use crate::span::{Location, Span};
use crate::uri::Uri;

/// The kind of a top-level declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DeclKind {
    /// A function or method.
    Func,
    /// A named type.
    Type,
    /// A package-level variable.
    Var,
    /// A package-level constant.
    Const,
}

/// A function or initializer body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    /// The body's byte range.
    pub span: Span,
    /// Identifiers referenced inside the body.
    pub refs: Vec<String>,
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decl {
    /// The declared name.
    pub name: String,
    /// What kind of entity is declared.
    pub kind: DeclKind,
    /// Whether the name is visible outside its package.
    pub exported: bool,
    /// The declaration's byte range.
    pub span: Span,
    /// Identifiers referenced by the declaration's signature or type.
    pub signature_refs: Vec<String>,
    /// The declaration's body, if any remains after trimming.
    pub body: Option<Body>,
}

/// A single import declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    /// The unquoted import path.
    pub path: String,
    /// The byte range of the whole import spec.
    pub span: Span,
}

/// A syntax error reported by the parser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Where the error was found.
    pub location: Location,
    /// Description of the error.
    pub message: String,
}

/// One parsed source file.
#[derive(Clone, Debug)]
pub struct ParsedFile {
    /// The file's URI.
    pub uri: Uri,
    /// The fidelity the file was parsed at.
    pub mode: ParseMode,
    /// The name in the package clause.
    pub package_name: String,
    /// Import declarations in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations in source order. Empty in header mode.
    pub decls: Vec<Decl>,
    /// Syntax errors found while parsing.
    pub parse_errors: Vec<ParseError>,
    /// Line index of the parsed content, for positioning diagnostics.
    pub line_index: LineIndex,
}

impl ParsedFile {
    /// Returns the declaration with the given name, if any.
    pub fn decl(&self, name: &str) -> Option<&Decl> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Returns the import paths in source order, including duplicates.
    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|imp| imp.path.as_str())
    }

    /// Returns `true` if the parser reported any syntax error.
    pub fn has_parse_errors(&self) -> bool {
        !self.parse_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParsedFile {
        ParsedFile {
            uri: Uri::new("file:///a.k"),
            mode: ParseMode::Full,
            package_name: "a".to_string(),
            imports: vec![ImportSpec {
                path: "b".to_string(),
                span: Span::new(10, 18),
            }],
            decls: vec![Decl {
                name: "Run".to_string(),
                kind: DeclKind::Func,
                exported: true,
                span: Span::new(20, 40),
                signature_refs: vec![],
                body: Some(Body {
                    span: Span::new(30, 40),
                    refs: vec!["helper".to_string()],
                }),
            }],
            parse_errors: vec![],
            line_index: LineIndex::new(&[b' '; 40]),
        }
    }

    #[test]
    fn decl_lookup() {
        let f = sample();
        assert!(f.decl("Run").is_some());
        assert!(f.decl("missing").is_none());
    }

    #[test]
    fn import_paths_in_order() {
        let f = sample();
        assert_eq!(f.import_paths().collect::<Vec<_>>(), vec!["b"]);
        assert!(!f.has_parse_errors());
    }
}
