//! Source file identity, span tracking, and the parsed-file model.
//!
//! This crate provides [`FileHandle`], the immutable snapshot of one file's
//! content handed out by the file source, [`Span`] and [`Location`] for byte
//! ranges, [`LineIndex`] for converting offsets to line/column coordinates, and
//! the neutral syntax model ([`ParsedFile`]) returned by the external parser.

#![warn(missing_docs)]

pub mod file_handle;
pub mod line_index;
pub mod parse_mode;
pub mod resolved_span;
pub mod span;
pub mod syntax;
pub mod uri;

pub use file_handle::{FileHandle, FileIdentity};
pub use line_index::LineIndex;
pub use parse_mode::ParseMode;
pub use resolved_span::ResolvedSpan;
pub use span::{Location, Span};
pub use syntax::{Body, Decl, DeclKind, ImportSpec, ParseError, ParsedFile};
pub use uri::Uri;
