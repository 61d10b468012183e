//! Line-start indexing for fast offset to line/column conversion.

use crate::resolved_span::ResolvedSpan;
use crate::span::Span;

/// Precomputed line-start offsets of one file's content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offsets of each line start (the first entry is always 0).
    line_starts: Vec<u32>,
    /// Total length of the indexed content in bytes.
    len: u32,
}

impl LineIndex {
    /// Indexes the given content.
    pub fn new(content: &[u8]) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in content.iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: content.len() as u32,
        }
    }

    /// Returns the length of the indexed content in bytes.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns `true` if the indexed content is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Converts a byte offset into 1-indexed (line, column) coordinates.
    ///
    /// Returns `None` if the offset lies beyond the end of the content.
    pub fn line_col(&self, byte_offset: u32) -> Option<(u32, u32)> {
        if byte_offset > self.len {
            return None;
        }
        let line_idx = match self.line_starts.binary_search(&byte_offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line = (line_idx as u32) + 1;
        let col = byte_offset - self.line_starts[line_idx] + 1;
        Some((line, col))
    }

    /// Resolves a span to line/column coordinates.
    ///
    /// Fails if the span is inverted or extends past the end of the content,
    /// which happens when a span was computed against different file content.
    pub fn resolve(&self, span: Span) -> Option<ResolvedSpan> {
        if span.end < span.start {
            return None;
        }
        let (start_line, start_col) = self.line_col(span.start)?;
        let (end_line, end_col) = self.line_col(span.end)?;
        Some(ResolvedSpan {
            start_line,
            start_col,
            end_line,
            end_col,
        })
    }
}
