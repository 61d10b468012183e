//! A line-oriented toy language and its manifest format.
//!
//! Each non-blank line of a source file is one of:
//!
//! ```text
//! package NAME
//! import PATH
//! func|type|var|const NAME [: SIGREF...] [= BODYREF...]
//! // comment
//! ```
//!
//! A reference written `pkg.Name` names an export of an imported package.
//! Functions always have a body. A line containing `!!` is dropped and marks
//! the file as repaired. Any other line is a syntax error.

use kiln_cache::{CacheError, ManifestParser, ModuleRequirement, ParseOutput, ParsedManifest, Parser};
use kiln_source::{
    Body, Decl, DeclKind, FileHandle, ImportSpec, LineIndex, Location, ParseError, ParseMode,
    ParsedFile, Span,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Splits `text` into `(span, line)` pairs, without line terminators.
fn lines(text: &str) -> impl Iterator<Item = (Span, &str)> {
    let mut offset = 0u32;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len() as u32;
        let line = raw.trim_end_matches(|c: char| c == '\n' || c == '\r');
        (Span::new(start, start + line.len() as u32), line)
    })
}

fn decl_kind(word: &str) -> Option<DeclKind> {
    match word {
        "func" => Some(DeclKind::Func),
        "type" => Some(DeclKind::Type),
        "var" => Some(DeclKind::Var),
        "const" => Some(DeclKind::Const),
        _ => None,
    }
}

fn words(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// Parses `KIND NAME [: refs] [= refs]`, or returns `None` if malformed.
fn parse_decl(kind: DeclKind, rest: &str, span: Span) -> Option<Decl> {
    let (head, body_refs) = match rest.split_once('=') {
        Some((head, body)) => (head, Some(words(body))),
        None => (rest, None),
    };
    let (name, signature_refs) = match head.split_once(':') {
        Some((name, sig)) => (name.trim(), words(sig)),
        None => (head.trim(), Vec::new()),
    };
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let body = match (kind, body_refs) {
        (DeclKind::Func, refs) => Some(refs.unwrap_or_default()),
        (_, refs) => refs,
    }
    .map(|refs| Body { span, refs });
    Some(Decl {
        name: name.to_string(),
        kind,
        exported: name.starts_with(|c: char| c.is_ascii_uppercase()),
        span,
        signature_refs,
        body,
    })
}

/// Parser for the toy language. Counts its invocations.
#[derive(Default)]
pub struct ToyParser {
    parses: AtomicUsize,
}

impl ToyParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many files have been parsed.
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl Parser for ToyParser {
    fn parse(&self, file: &FileHandle, mode: ParseMode) -> Result<ParseOutput, CacheError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        let text = file.text().map_err(|e| CacheError::Parse {
            uri: file.uri().clone(),
            reason: e.to_string(),
        })?;
        let uri = file.uri().clone();
        let mut parsed = ParsedFile {
            uri: uri.clone(),
            mode,
            package_name: String::new(),
            imports: Vec::new(),
            decls: Vec::new(),
            parse_errors: Vec::new(),
            line_index: LineIndex::new(file.content()),
        };
        let mut fixed = false;
        let error = |span: Span, message: &str, errors: &mut Vec<ParseError>| {
            errors.push(ParseError {
                location: Location::new(uri.clone(), span),
                message: message.to_string(),
            });
        };

        for (span, line) in lines(text) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            if trimmed.contains("!!") {
                fixed = true;
                continue;
            }
            let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
            match word {
                "package" => parsed.package_name = rest.trim().to_string(),
                "import" => {
                    let path = rest.trim();
                    if path.is_empty() {
                        error(span, "expected import path", &mut parsed.parse_errors);
                    } else {
                        parsed.imports.push(ImportSpec {
                            path: path.to_string(),
                            span,
                        });
                    }
                }
                // Header parses stop caring after the imports.
                _ if mode == ParseMode::Header => {}
                _ => match decl_kind(word).and_then(|kind| parse_decl(kind, rest, span)) {
                    Some(decl) => parsed.decls.push(decl),
                    None => error(span, "expected declaration", &mut parsed.parse_errors),
                },
            }
        }
        if parsed.package_name.is_empty() {
            error(Span::point(0), "expected package clause", &mut parsed.parse_errors);
        }
        Ok(ParseOutput { file: parsed, fixed })
    }
}

/// Parser for manifests made of `require PATH VERSION` lines.
#[derive(Default)]
pub struct ToyManifestParser;

impl ManifestParser for ToyManifestParser {
    fn parse_manifest(&self, file: &FileHandle) -> Result<ParsedManifest, CacheError> {
        let text = file.text().map_err(|e| CacheError::Manifest {
            uri: file.uri().clone(),
            reason: e.to_string(),
        })?;
        let mut requires = Vec::new();
        for (span, line) in lines(text) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                ["require", path, version] => requires.push(ModuleRequirement {
                    path: path.to_string(),
                    version: version.to_string(),
                    span,
                }),
                ["require", ..] => {
                    return Err(CacheError::Manifest {
                        uri: file.uri().clone(),
                        reason: format!("malformed requirement: {line}"),
                    })
                }
                _ => {}
            }
        }
        Ok(ParsedManifest {
            uri: file.uri().clone(),
            line_index: LineIndex::new(file.content()),
            requires,
        })
    }
}
