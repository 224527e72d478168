//! Offset maps between a projected text and the original it was derived from.

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// Where a run of projected text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Copied or rewritten from this original range.
    ///
    /// When the generated run and the original range have the same length the
    /// correspondence is byte-for-byte, otherwise every generated byte maps into
    /// the original range (clamped to its last byte).
    Source(Span),
    /// Inserted for the projection only; has no original position.
    Synthetic,
}

/// One contiguous run of projected text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub generated: Span,
    pub origin: Origin,
}

impl Segment {
    /// Returns true if the generated and original lengths agree.
    #[inline]
    pub fn is_exact(&self) -> bool {
        matches!(self.origin, Origin::Source(original) if original.len() == self.generated.len())
    }

    fn original_at(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let Origin::Source(original) = self.origin else {
            return None;
        };
        if original.is_empty() {
            return Some(original.start);
        }
        let delta = generated - self.generated.start;
        let last = original.len() - TextSize::from(1);
        Some(original.start + delta.min(last))
    }
}

/// A monotonic, possibly many-to-one map from projected offsets to original offsets.
///
/// Segments are sorted by generated position and tile the projected text without
/// gaps, so every projected byte resolves either to an original offset or to
/// [`Origin::Synthetic`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionMap {
    segments: Vec<Segment>,
    original_len: ByteOffset,
    generated_len: ByteOffset,
}

impl PositionMap {
    pub(crate) fn new(
        segments: Vec<Segment>,
        original_len: ByteOffset,
        generated_len: ByteOffset,
    ) -> Self {
        Self {
            segments,
            original_len,
            generated_len,
        }
    }

    /// A map for text that was not transformed at all.
    pub fn identity(len: ByteOffset) -> Self {
        let segments = if len == TextSize::from(0) {
            Vec::new()
        } else {
            vec![Segment {
                generated: Span::new(0u32, len),
                origin: Origin::Source(Span::new(0u32, len)),
            }]
        };
        Self::new(segments, len, len)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn original_len(&self) -> ByteOffset {
        self.original_len
    }

    #[inline]
    pub fn generated_len(&self) -> ByteOffset {
        self.generated_len
    }

    /// Finds the segment covering a projected offset.
    pub fn segment_at(&self, generated: ByteOffset) -> Option<&Segment> {
        let idx = self
            .segments
            .partition_point(|segment| segment.generated.start <= generated);
        self.segments
            .get(idx.checked_sub(1)?)
            .filter(|segment| segment.generated.contains(generated))
    }

    /// Maps a projected offset back to the original text.
    ///
    /// Returns `None` for synthetic text. The end of the projection maps to the
    /// end of the original when the last run was copied from it.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        if generated == self.generated_len {
            return match self.segments.last()?.origin {
                Origin::Source(original) => Some(original.end),
                Origin::Synthetic => None,
            };
        }
        self.segment_at(generated)?.original_at(generated)
    }

    /// Returns true if the projected offset lies in synthetic text.
    pub fn is_synthetic(&self, generated: ByteOffset) -> bool {
        self.segment_at(generated)
            .map_or(false, |segment| segment.origin == Origin::Synthetic)
    }

    /// Maps a projected range back to the original text.
    ///
    /// A range that starts in synthetic text has no meaningful original location
    /// and yields `None`, so callers can suppress it.
    pub fn original_span(&self, generated: Span) -> Option<Span> {
        let start = self.original_position(generated.start)?;
        if generated.is_empty() {
            return Some(Span::empty(start));
        }
        let end = self
            .original_position(generated.end - TextSize::from(1))
            .map(|last| last + TextSize::from(1))
            .unwrap_or(start);
        Some(Span::new(start, end.max(start)))
    }

    /// Maps an original offset forward into the projection.
    ///
    /// Byte-for-byte runs are preferred; a rewritten run maps to its start.
    /// Offsets inside removed text map to where the projection resumes after
    /// the removal. Offsets past the end of the original yield `None`.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        if original > self.original_len {
            return None;
        }
        let mut rewritten = None;
        let mut resumes_at = None;
        for segment in &self.segments {
            let Origin::Source(source) = segment.origin else {
                continue;
            };
            if !source.contains(original) {
                if source.start > original {
                    resumes_at.get_or_insert(segment.generated.start);
                }
                continue;
            }
            if segment.is_exact() {
                return Some(segment.generated.start + (original - source.start));
            }
            rewritten.get_or_insert(segment.generated.start);
        }
        rewritten.or(resumes_at).or(Some(self.generated_len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn offset(n: u32) -> ByteOffset {
        TextSize::from(n)
    }

    #[test]
    fn test_identity_map() {
        let map = PositionMap::identity(offset(10));
        assert_eq!(map.original_position(offset(3)), Some(offset(3)));
        assert_eq!(map.original_position(offset(10)), Some(offset(10)));
        assert_eq!(map.generated_position(offset(9)), Some(offset(9)));
        assert!(!map.is_synthetic(offset(0)));
    }

    #[test]
    fn test_empty_identity_map() {
        let map = PositionMap::identity(offset(0));
        assert!(map.segments().is_empty());
        assert_eq!(map.original_position(offset(0)), None);
        assert_eq!(map.generated_position(offset(0)), Some(offset(0)));
    }

    #[test]
    fn test_rewritten_segment_clamps_into_range() {
        // "ab" was rewritten to "wxyz"; "cd" copied after it.
        let map = PositionMap::new(
            vec![
                Segment {
                    generated: Span::new(0u32, 4u32),
                    origin: Origin::Source(Span::new(0u32, 2u32)),
                },
                Segment {
                    generated: Span::new(4u32, 6u32),
                    origin: Origin::Source(Span::new(2u32, 4u32)),
                },
            ],
            offset(4),
            offset(6),
        );
        assert_eq!(map.original_position(offset(0)), Some(offset(0)));
        assert_eq!(map.original_position(offset(3)), Some(offset(1)));
        assert_eq!(map.original_position(offset(5)), Some(offset(3)));
        assert_eq!(map.generated_position(offset(1)), Some(offset(0)));
        assert_eq!(map.generated_position(offset(3)), Some(offset(5)));
    }

    #[test]
    fn test_removed_text_maps_to_where_the_projection_resumes() {
        // "ab" copied, "cd" removed, "ef" copied after a synthetic "(".
        let map = PositionMap::new(
            vec![
                Segment {
                    generated: Span::new(0u32, 2u32),
                    origin: Origin::Source(Span::new(0u32, 2u32)),
                },
                Segment {
                    generated: Span::new(2u32, 3u32),
                    origin: Origin::Synthetic,
                },
                Segment {
                    generated: Span::new(3u32, 5u32),
                    origin: Origin::Source(Span::new(4u32, 6u32)),
                },
            ],
            offset(6),
            offset(5),
        );
        assert_eq!(map.generated_position(offset(2)), Some(offset(3)));
        assert_eq!(map.generated_position(offset(3)), Some(offset(3)));
        assert_eq!(map.generated_position(offset(6)), Some(offset(5)));
        assert_eq!(map.generated_position(offset(7)), None);
    }

    #[test]
    fn test_original_span_suppresses_synthetic_start() {
        let map = PositionMap::new(
            vec![
                Segment {
                    generated: Span::new(0u32, 3u32),
                    origin: Origin::Synthetic,
                },
                Segment {
                    generated: Span::new(3u32, 8u32),
                    origin: Origin::Source(Span::new(10u32, 15u32)),
                },
            ],
            offset(15),
            offset(8),
        );
        assert_eq!(map.original_span(Span::new(1u32, 5u32)), None);
        assert_eq!(
            map.original_span(Span::new(4u32, 8u32)),
            Some(Span::new(11u32, 15u32))
        );
        assert!(map.is_synthetic(offset(2)));
    }
}
