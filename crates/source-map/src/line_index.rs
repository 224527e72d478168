//! Offset ↔ line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A 0-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Line start table for one text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i` begins. Always starts with 0.
    line_starts: Vec<ByteOffset>,
    len: ByteOffset,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from(offset as u32 + 1)),
            )
            .collect();

        Self {
            line_starts,
            len: TextSize::from(text.len() as u32),
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts an offset to a line/column pair.
    ///
    /// Returns `None` for offsets past the end of the text.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        if offset > self.len {
            return None;
        }
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let col = offset - self.line_starts[line];
        Some(LineCol::new(line as u32, col.into()))
    }

    /// Converts a line/column pair back to an offset.
    ///
    /// Columns past the end of the line are rejected.
    pub fn offset(&self, position: LineCol) -> Option<ByteOffset> {
        let line = position.line as usize;
        let start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .map_or(self.len, |next| *next - TextSize::from(1));
        let offset = start + TextSize::from(position.col);
        (offset <= line_end).then_some(offset)
    }
}
