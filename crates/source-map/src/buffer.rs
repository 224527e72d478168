//! A mutable edit buffer over an immutable original string.
//!
//! Edits are recorded in original coordinates and applied lazily by
//! [`MappedBuffer::finalize`], which produces the edited text together with a
//! [`PositionMap`] back to the original.

use std::collections::BTreeMap;

use crate::map::{Origin, PositionMap, Segment};
use crate::{ByteOffset, Span};
use text_size::TextSize;
use thiserror::Error;

/// A contract violation by the code driving the buffer.
///
/// These never come from user input; they mean an edit was computed wrongly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// An offset is past the end of the original text.
    #[error("offset {offset:?} is out of bounds for text of length {len:?}")]
    OutOfBounds { offset: ByteOffset, len: ByteOffset },

    /// An offset splits a multi-byte character.
    #[error("offset {0:?} is not on a character boundary")]
    NotCharBoundary(ByteOffset),

    /// A range ends before it starts.
    #[error("invalid range: start {start:?} is after end {end:?}")]
    InvalidRange { start: ByteOffset, end: ByteOffset },

    /// `overwrite` was called with an empty range.
    #[error("cannot overwrite an empty range at {0:?}")]
    EmptyOverwrite(ByteOffset),

    /// Two range edits touch the same original bytes.
    #[error("edit {new:?} overlaps earlier edit {existing:?}")]
    Overlap { existing: Span, new: Span },

    /// An insertion point lies strictly inside an edited range.
    #[error("insertion at {offset:?} falls inside edited range {edit:?}")]
    InsertInsideEdit { offset: ByteOffset, edit: Span },
}

/// The result of [`MappedBuffer::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedText {
    pub text: String,
    pub map: PositionMap,
}

#[derive(Debug, Clone)]
struct RangeEdit {
    end: u32,
    replacement: String,
}

/// Text inserted at one boundary between original bytes.
#[derive(Debug, Clone, Default)]
struct Insertions {
    /// Attached to the end of the preceding byte (`insert_after`).
    after: Vec<String>,
    /// Attached to the start of the following byte (`insert_before`).
    before: Vec<String>,
}

/// Records overwrite/insert/remove edits against an original string.
///
/// Range edits may not overlap each other, and insertions may not land strictly
/// inside an edited range. Violations are reported as [`BufferError`] and leave
/// the buffer unchanged.
#[derive(Debug, Clone)]
pub struct MappedBuffer<'a> {
    original: &'a str,
    edits: BTreeMap<u32, RangeEdit>,
    insertions: BTreeMap<u32, Insertions>,
}

impl<'a> MappedBuffer<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            edits: BTreeMap::new(),
            insertions: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Replaces `[start, end)` with `text`. The range must not be empty.
    pub fn overwrite(
        &mut self,
        start: impl Into<ByteOffset>,
        end: impl Into<ByteOffset>,
        text: impl Into<String>,
    ) -> Result<(), BufferError> {
        let (start, end) = self.check_range(start.into(), end.into())?;
        if start == end {
            return Err(BufferError::EmptyOverwrite(TextSize::from(start)));
        }
        self.record_edit(start, end, text.into())
    }

    /// Removes `[start, end)`. Removing an empty range does nothing.
    pub fn remove(
        &mut self,
        start: impl Into<ByteOffset>,
        end: impl Into<ByteOffset>,
    ) -> Result<(), BufferError> {
        let (start, end) = self.check_range(start.into(), end.into())?;
        if start == end {
            return Ok(());
        }
        self.record_edit(start, end, String::new())
    }

    /// Inserts `text` at `pos`, in front of the original byte at `pos`.
    ///
    /// At a shared boundary this text follows anything added with
    /// [`insert_after`](Self::insert_after).
    pub fn insert_before(
        &mut self,
        pos: impl Into<ByteOffset>,
        text: impl Into<String>,
    ) -> Result<(), BufferError> {
        let pos = self.check_insertion(pos.into())?;
        self.insertions
            .entry(pos)
            .or_default()
            .before
            .push(text.into());
        Ok(())
    }

    /// Inserts `text` at `pos`, right after the original byte preceding `pos`.
    pub fn insert_after(
        &mut self,
        pos: impl Into<ByteOffset>,
        text: impl Into<String>,
    ) -> Result<(), BufferError> {
        let pos = self.check_insertion(pos.into())?;
        self.insertions
            .entry(pos)
            .or_default()
            .after
            .push(text.into());
        Ok(())
    }

    /// Produces the edited text and its position map.
    ///
    /// The buffer is left untouched, so this can be called at any point.
    pub fn finalize(&self) -> MappedText {
        let len = self.original.len() as u32;
        let mut out = Emitter::with_capacity(self.original.len());
        let mut pos = 0u32;

        loop {
            if let Some(insertions) = self.insertions.get(&pos) {
                for text in insertions.after.iter().chain(&insertions.before) {
                    out.emit(text, Origin::Synthetic);
                }
            }
            if pos == len {
                break;
            }
            if let Some(edit) = self.edits.get(&pos) {
                out.emit(&edit.replacement, Origin::Source(Span::new(pos, edit.end)));
                pos = edit.end;
                continue;
            }

            let next_insertion = self.insertions.range(pos + 1..).next().map(|(k, _)| *k);
            let next_edit = self.edits.range(pos + 1..).next().map(|(k, _)| *k);
            let next = [next_insertion, next_edit]
                .into_iter()
                .flatten()
                .fold(len, u32::min);

            out.emit(
                &self.original[pos as usize..next as usize],
                Origin::Source(Span::new(pos, next)),
            );
            pos = next;
        }

        let generated_len = TextSize::from(out.text.len() as u32);
        MappedText {
            map: PositionMap::new(out.segments, TextSize::from(len), generated_len),
            text: out.text,
        }
    }

    fn check_offset(&self, offset: ByteOffset) -> Result<u32, BufferError> {
        let raw = u32::from(offset);
        let len = self.original.len();
        if raw as usize > len {
            return Err(BufferError::OutOfBounds {
                offset,
                len: TextSize::from(len as u32),
            });
        }
        if !self.original.is_char_boundary(raw as usize) {
            return Err(BufferError::NotCharBoundary(offset));
        }
        Ok(raw)
    }

    fn check_range(
        &self,
        start: ByteOffset,
        end: ByteOffset,
    ) -> Result<(u32, u32), BufferError> {
        let start_raw = self.check_offset(start)?;
        let end_raw = self.check_offset(end)?;
        if start_raw > end_raw {
            return Err(BufferError::InvalidRange { start, end });
        }
        Ok((start_raw, end_raw))
    }

    fn check_insertion(&self, pos: ByteOffset) -> Result<u32, BufferError> {
        let pos = self.check_offset(pos)?;
        if let Some(edit) = self.edit_covering(pos) {
            return Err(BufferError::InsertInsideEdit {
                offset: TextSize::from(pos),
                edit,
            });
        }
        Ok(pos)
    }

    /// Returns the edit whose interior contains `pos`, if any.
    fn edit_covering(&self, pos: u32) -> Option<Span> {
        let (&start, edit) = self.edits.range(..pos).next_back()?;
        (edit.end > pos).then(|| Span::new(start, edit.end))
    }

    fn record_edit(&mut self, start: u32, end: u32, replacement: String) -> Result<(), BufferError> {
        let new = Span::new(start, end);
        // Edits are disjoint and sorted, so only the last one starting before `end` can overlap.
        if let Some((&existing_start, existing)) = self.edits.range(..end).next_back() {
            if existing.end > start {
                return Err(BufferError::Overlap {
                    existing: Span::new(existing_start, existing.end),
                    new,
                });
            }
        }
        if let Some((&offset, _)) = self.insertions.range(start + 1..end).next() {
            return Err(BufferError::InsertInsideEdit {
                offset: TextSize::from(offset),
                edit: new,
            });
        }
        self.edits.insert(start, RangeEdit { end, replacement });
        Ok(())
    }
}

struct Emitter {
    text: String,
    segments: Vec<Segment>,
}

impl Emitter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            segments: Vec::new(),
        }
    }

    fn emit(&mut self, text: &str, origin: Origin) {
        if text.is_empty() {
            return;
        }
        let start = TextSize::from(self.text.len() as u32);
        self.text.push_str(text);
        let end = TextSize::from(self.text.len() as u32);

        if let Some(last) = self.segments.last_mut() {
            if origin == Origin::Synthetic && last.origin == Origin::Synthetic {
                last.generated.end = end;
                return;
            }
        }
        self.segments.push(Segment {
            generated: Span::new(start, end),
            origin,
        });
    }
}
