//! The diagnostic records produced by the package cache.
//!
//! This crate defines the positioned [`Diagnostic`] tuple (file, range,
//! severity, source, message, related locations, suggested fixes). Rendering
//! these records for a particular client protocol happens elsewhere.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod related;
pub mod severity;
pub mod source;
pub mod suggested_fix;

pub use diagnostic::Diagnostic;
pub use related::RelatedInformation;
pub use severity::Severity;
pub use source::DiagnosticSource;
pub use suggested_fix::{SuggestedFix, TextEdit};
