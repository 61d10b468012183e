//! Fix suggestions attached to diagnostics.

use kiln_source::{Span, Uri};
use serde::{Deserialize, Serialize};

/// A text replacement in one file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// The file to edit.
    pub uri: Uri,
    /// The byte range to replace.
    pub span: Span,
    /// The new text to insert in place of the span.
    pub new_text: String,
}

/// A suggested fix for a diagnostic.
///
/// A fix either edits text directly or names a command for the client to run
/// (for example, fetching a missing dependency).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// A description of what this fix does.
    pub title: String,
    /// Text edits that implement the fix.
    pub edits: Vec<TextEdit>,
    /// A command to run instead of (or in addition to) the edits.
    pub command: Option<String>,
}

impl SuggestedFix {
    /// Creates a fix that runs a command.
    pub fn command(title: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            edits: Vec::new(),
            command: Some(command.into()),
        }
    }

    /// Creates a fix from text edits.
    pub fn edits(title: impl Into<String>, edits: Vec<TextEdit>) -> Self {
        Self {
            title: title.into(),
            edits,
            command: None,
        }
    }
}
