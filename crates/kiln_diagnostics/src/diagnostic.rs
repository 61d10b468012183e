//! Positioned diagnostic records.

use crate::related::RelatedInformation;
use crate::severity::Severity;
use crate::source::DiagnosticSource;
use crate::suggested_fix::SuggestedFix;
use kiln_source::{ResolvedSpan, Span, Uri};
use serde::{Deserialize, Serialize};

/// A diagnostic attached to a range of one file.
///
/// Each diagnostic includes:
/// - the file and range it applies to, as bytes and as line/column
/// - a severity and the loading stage that produced it
/// - a message, optional related locations, and optional fixes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The file the diagnostic applies to.
    pub uri: Uri,
    /// The byte range the diagnostic applies to.
    pub span: Span,
    /// The same range in line/column form.
    pub range: ResolvedSpan,
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// Which stage produced the diagnostic.
    pub source: DiagnosticSource,
    /// The main diagnostic message.
    pub message: String,
    /// Additional locations providing context.
    pub related: Vec<RelatedInformation>,
    /// Fixes the client may offer.
    pub suggested_fixes: Vec<SuggestedFix>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(
        uri: Uri,
        span: Span,
        range: ResolvedSpan,
        source: DiagnosticSource,
        message: impl Into<String>,
    ) -> Self {
        Self {
            uri,
            span,
            range,
            severity: Severity::Error,
            source,
            message: message.into(),
            related: Vec::new(),
            suggested_fixes: Vec::new(),
        }
    }

    /// Sets the severity of this diagnostic.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Adds a related location to this diagnostic.
    pub fn with_related(mut self, related: RelatedInformation) -> Self {
        self.related.push(related);
        self
    }

    /// Appends suggested fixes to this diagnostic.
    pub fn with_fixes(mut self, fixes: impl IntoIterator<Item = SuggestedFix>) -> Self {
        self.suggested_fixes.extend(fixes);
        self
    }
}
