//! Position tracking for projected component sources.
//!
//! [`MappedBuffer`] records edits against an original text and produces the
//! edited text together with a [`PositionMap`] that translates projected offsets
//! back to original offsets, so diagnostics on generated code can be reported
//! where the user wrote it.

mod buffer;
mod line_index;
mod map;
mod span;

pub use buffer::{BufferError, MappedBuffer, MappedText};
pub use line_index::{LineCol, LineIndex};
pub use map::{Origin, PositionMap, Segment};
pub use span::{ByteOffset, Span};
