//! Secondary locations attached to a diagnostic.

use kiln_source::{ResolvedSpan, Span, Uri};
use serde::{Deserialize, Serialize};

/// A related location that gives more context for a diagnostic, such as the
/// first declaration of a name that was declared twice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedInformation {
    /// The file containing the related location.
    pub uri: Uri,
    /// The byte range of the related location.
    pub span: Span,
    /// The related location in line/column form.
    pub range: ResolvedSpan,
    /// The message displayed at the related location.
    pub message: String,
}

impl RelatedInformation {
    /// Creates a related-information entry.
    pub fn new(uri: Uri, span: Span, range: ResolvedSpan, message: impl Into<String>) -> Self {
        Self {
            uri,
            span,
            range,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let range = ResolvedSpan {
            start_line: 1,
            start_col: 1,
            end_line: 1,
            end_col: 4,
        };
        let info = RelatedInformation::new(Uri::new("file:///a.k"), Span::new(0, 3), range, "declared here");
        assert_eq!(info.message, "declared here");
        assert_eq!(info.range.end_col, 4);
    }
}
