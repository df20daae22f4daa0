//! Recoverable problems found while scanning and parsing.
//!
//! Parsing never fails. Anything the scanner or grammar had to work around is
//! recorded as a [`Diagnostic`] next to the tree, and the tree shape itself
//! (an `ERROR` node, a block without its end line) tells the same story.

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The scanner could not classify the input and emitted an error sentinel.
    LexError,
    /// A block or drawer was closed implicitly, without its end line.
    UnterminatedConstruct,
    /// An end line names a different block than the one it closes.
    StructuralMismatch,
    /// Nesting exceeded the configured frame limit; the line was kept as text.
    DepthLimit,
}

/// A non-fatal problem attached to a byte range of the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} at {}..{}: {message}", range.start, range.end)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub range: Range<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, range: Range<usize>, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
        }
    }

    /// The same diagnostic moved by `delta` bytes.
    pub(crate) fn shifted(&self, delta: isize) -> Self {
        let shift = |offset: usize| offset.saturating_add_signed(delta);
        Self {
            kind: self.kind,
            range: shift(self.range.start)..shift(self.range.end),
            message: self.message.clone(),
        }
    }
}

/// Rejected arguments to [`edit`](crate::edit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit range is inverted: start {start} is after end {end}")]
    InvertedRange { start: usize, end: usize },

    #[error("byte offset {offset} is outside a text of length {len}")]
    OutOfBounds { offset: usize, len: usize },

    #[error(
        "text outside the edited range changed length: old suffix {old_suffix} bytes, new suffix {new_suffix} bytes"
    )]
    LengthMismatch {
        old_suffix: usize,
        new_suffix: usize,
    },

    #[error("text outside the edited range differs from the previous tree")]
    ContentMismatch,

    #[error("byte offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

/// A scanner snapshot that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot ended in the middle of a frame")]
    Truncated,

    #[error("unknown frame tag {0}")]
    UnknownTag(u8),

    #[error("frame name is not valid UTF-8")]
    InvalidName,

    #[error("frame count {0} does not fit this platform")]
    CountOverflow(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::new(DiagnosticKind::LexError, 3..11, "block begin without a name");
        assert_eq!(d.to_string(), "LexError at 3..11: block begin without a name");
    }

    #[test]
    fn shifting_moves_both_ends() {
        let d = Diagnostic::new(DiagnosticKind::DepthLimit, 10..14, "too deep");
        assert_eq!(d.shifted(-4).range, 6..10);
        assert_eq!(d.shifted(5).range, 15..19);
    }

    #[test]
    fn edit_error_messages() {
        let err = EditError::InvertedRange { start: 5, end: 2 };
        assert_eq!(
            err.to_string(),
            "edit range is inverted: start 5 is after end 2"
        );
    }
}
