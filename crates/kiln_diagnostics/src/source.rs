//! Which stage of package loading produced a diagnostic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The origin of a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DiagnosticSource {
    /// Reported by the package loader while listing packages.
    ListError,
    /// Reported by the parser.
    ParseError,
    /// Reported by the type checker, or synthesized for a broken import chain.
    TypeError,
}

impl fmt::Display for DiagnosticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSource::ListError => write!(f, "list"),
            DiagnosticSource::ParseError => write!(f, "syntax"),
            DiagnosticSource::TypeError => write!(f, "compiler"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        assert_eq!(DiagnosticSource::ListError.to_string(), "list");
        assert_eq!(DiagnosticSource::ParseError.to_string(), "syntax");
        assert_eq!(DiagnosticSource::TypeError.to_string(), "compiler");
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&DiagnosticSource::TypeError).unwrap();
        let back: DiagnosticSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DiagnosticSource::TypeError);
    }
}
