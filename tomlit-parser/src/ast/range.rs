//! Position and span tracking for source locations.
//!
//! All tree nodes carry a mandatory [`Range`] storing both the byte span and
//! the line:column positions, so consumers can work in whichever coordinate
//! space their host uses. [`SourceLocation`] converts byte offsets to
//! positions with a binary search over precomputed line starts.

use std::fmt;
use std::ops::Range as ByteRange;

use serde::Serialize;

/// A line:column position in source text. Both components are 0-based; the
/// column counts bytes within the line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source span: byte range plus start/end positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Range {
    pub span: ByteRange<usize>,
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(span: ByteRange<usize>, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    /// Whether a byte offset falls inside this span, end inclusive so that a
    /// cursor sitting directly after the last character still counts.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.span.start <= offset && offset <= self.span.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Byte-offset to line:column conversion for one document snapshot.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    line_offsets: Vec<usize>,
    len: usize,
}

impl SourceLocation {
    pub fn new(text: &str) -> Self {
        let mut line_offsets = vec![0];
        for (idx, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_offsets.push(idx + 1);
            }
        }
        Self {
            line_offsets,
            len: text.len(),
        }
    }

    pub fn byte_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_offsets.binary_search(&offset) {
            Ok(line) => line,
            Err(insertion) => insertion - 1,
        };
        Position::new(line, offset - self.line_offsets[line])
    }

    /// Build a [`Range`] from a byte span, clamped to the document.
    pub fn range(&self, span: ByteRange<usize>) -> Range {
        let start = span.start.min(self.len);
        let end = span.end.min(self.len).max(start);
        Range::new(
            start..end,
            self.byte_to_position(start),
            self.byte_to_position(end),
        )
    }
}
