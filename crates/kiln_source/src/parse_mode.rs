//! Parse fidelity levels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How much of a file is parsed and retained.
///
/// Ordered from least to most fidelity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ParseMode {
    /// Only the package clause and import declarations.
    Header,
    /// The exported surface: declarations are kept, bodies are trimmed.
    Exported,
    /// Complete bodies and full diagnostics.
    Full,
}

impl ParseMode {
    /// Returns the single-byte encoding used in composite keys.
    pub fn as_byte(self) -> u8 {
        match self {
            ParseMode::Header => 0,
            ParseMode::Exported => 1,
            ParseMode::Full => 2,
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseMode::Header => write!(f, "header"),
            ParseMode::Exported => write!(f, "exported"),
            ParseMode::Full => write!(f, "full"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(ParseMode::Header < ParseMode::Exported);
        assert!(ParseMode::Exported < ParseMode::Full);
    }

    #[test]
    fn bytes_are_distinct() {
        let bytes = [
            ParseMode::Header.as_byte(),
            ParseMode::Exported.as_byte(),
            ParseMode::Full.as_byte(),
        ];
        assert_eq!(bytes, [0, 1, 2]);
    }
}
