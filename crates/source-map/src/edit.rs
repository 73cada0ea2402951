//! Offset-based edit script over an immutable source string.
//!
//! An [`EditBuffer`] never mutates the text it was created from. Edits are
//! recorded against original byte offsets and applied in a single pass when
//! the buffer is rendered, which also yields the [`SourceMap`] relating the
//! output back to the original.

use crate::{offset, SourceMap, SourceMapBuilder, Span};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// An edit that could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// The range ends past the end of the source or starts after it ends.
    #[error("range {start}..{end} is out of bounds for a source of {len} bytes")]
    OutOfBounds {
        /// Start of the rejected range.
        start: usize,
        /// End of the rejected range.
        end: usize,
        /// Length of the source.
        len: usize,
    },

    /// An offset splits a multi-byte character.
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// The rejected offset.
        offset: usize,
    },

    /// Overwrites must cover at least one byte.
    #[error("cannot overwrite the empty range at {offset}")]
    EmptyRange {
        /// Position of the empty range.
        offset: usize,
    },

    /// Two overwrites share at least one byte.
    #[error("overwrite {start}..{end} overlaps an existing overwrite {other_start}..{other_end}")]
    Overlap {
        /// Start of the rejected range.
        start: usize,
        /// End of the rejected range.
        end: usize,
        /// Start of the range already recorded.
        other_start: usize,
        /// End of the range already recorded.
        other_end: usize,
    },

    /// An insertion falls strictly inside an overwritten range.
    #[error("cannot insert at {offset}: it is inside the overwritten range {start}..{end}")]
    InsideOverwrite {
        /// The rejected insertion offset.
        offset: usize,
        /// Start of the overwritten range.
        start: usize,
        /// End of the overwritten range.
        end: usize,
    },
}

#[derive(Debug, Clone)]
struct Overwrite {
    end: usize,
    content: String,
}

/// A mutable overlay of overwrites and insertions over an original source.
#[derive(Debug, Clone)]
pub struct EditBuffer<'src> {
    original: &'src str,
    /// Keyed by range start; ranges never overlap.
    overwrites: BTreeMap<usize, Overwrite>,
    /// Text inserted to the left of the keyed offset.
    inserts: BTreeMap<usize, String>,
    /// Text appended after the end of the source.
    outro: String,
}

impl<'src> EditBuffer<'src> {
    /// Creates an empty edit buffer over `original`.
    pub fn new(original: &'src str) -> Self {
        Self {
            original,
            overwrites: BTreeMap::new(),
            inserts: BTreeMap::new(),
            outro: String::new(),
        }
    }

    /// Returns the unedited source.
    #[inline]
    pub fn original(&self) -> &'src str {
        self.original
    }

    /// Returns true if no edit has been recorded.
    pub fn is_unchanged(&self) -> bool {
        self.overwrites.is_empty() && self.inserts.is_empty() && self.outro.is_empty()
    }

    /// Replaces the original text in `span` with `content`.
    pub fn overwrite(&mut self, span: Span, content: impl Into<String>) -> Result<(), EditError> {
        let (start, end) = (usize::from(span.start), usize::from(span.end));
        self.check_range(start, end)?;
        if start == end {
            return Err(EditError::EmptyRange { offset: start });
        }

        let before = self.overwrites.range(..end).next_back();
        if let Some((&other_start, other)) = before {
            if other.end > start {
                return Err(EditError::Overlap {
                    start,
                    end,
                    other_start,
                    other_end: other.end,
                });
            }
        }
        if let Some((&offset, _)) = self.inserts.range(start + 1..end).next() {
            return Err(EditError::InsideOverwrite { offset, start, end });
        }

        self.overwrites.insert(
            start,
            Overwrite {
                end,
                content: content.into(),
            },
        );
        Ok(())
    }

    /// Inserts `content` immediately before the original character at `offset`.
    ///
    /// Repeated insertions at the same offset keep their call order.
    pub fn insert_left(&mut self, offset: usize, content: &str) -> Result<(), EditError> {
        self.check_range(offset, offset)?;
        if let Some((&start, overwrite)) = self.overwrites.range(..offset).next_back() {
            if overwrite.end > offset {
                return Err(EditError::InsideOverwrite {
                    offset,
                    start,
                    end: overwrite.end,
                });
            }
        }
        self.inserts.entry(offset).or_default().push_str(content);
        Ok(())
    }

    /// Appends `content` after the end of the source.
    pub fn append(&mut self, content: &str) {
        self.outro.push_str(content);
    }

    /// Applies every edit and returns the output with its mapping table.
    pub fn render(&self) -> (String, SourceMap) {
        let mut builder = SourceMapBuilder::new();
        let mut out = String::with_capacity(self.original.len() + self.outro.len());
        let mut cursor = 0;

        for (&start, overwrite) in &self.overwrites {
            self.copy_verbatim(cursor, start, &mut out, &mut builder);
            builder.add_transformed(Span::from_range(start..overwrite.end), &overwrite.content);
            out.push_str(&overwrite.content);
            cursor = overwrite.end;
        }
        self.copy_verbatim(cursor, self.original.len(), &mut out, &mut builder);

        builder.add_generated(&self.outro);
        out.push_str(&self.outro);

        (out, builder.build())
    }

    /// Copies `original[from..to]`, splicing in insertions keyed inside
    /// `from..=to`.
    fn copy_verbatim(
        &self,
        from: usize,
        to: usize,
        out: &mut String,
        builder: &mut SourceMapBuilder,
    ) {
        let mut cursor = from;
        for (&at, text) in self.inserts.range(from..=to) {
            let chunk = &self.original[cursor..at];
            builder.add_source(offset(cursor), chunk);
            out.push_str(chunk);
            builder.add_generated(text);
            out.push_str(text);
            cursor = at;
        }
        let chunk = &self.original[cursor..to];
        builder.add_source(offset(cursor), chunk);
        out.push_str(chunk);
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), EditError> {
        let len = self.original.len();
        if start > end || end > len {
            return Err(EditError::OutOfBounds { start, end, len });
        }
        for offset in [start, end] {
            if !self.original.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }
}

impl fmt::Display for EditBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use text_size::TextSize;

    #[test]
    fn test_unchanged_buffer_renders_original() {
        let buffer = EditBuffer::new("<div>hi</div>");
        assert!(buffer.is_unchanged());
        assert_eq!(buffer.to_string(), "<div>hi</div>");
    }

    #[test]
    fn test_overwrite_and_insert() {
        let source = "<A class=\"x y\"/><style>b{}</style>";
        let mut buffer = EditBuffer::new(source);
        buffer.overwrite(Span::from_range(10..13), "deep_x_y").unwrap();
        buffer.insert_left(23, " r{}").unwrap();
        buffer.append("<!-- end -->");

        let (code, map) = buffer.render();
        assert_eq!(
            code,
            "<A class=\"deep_x_y\"/><style> r{}b{}</style><!-- end -->"
        );
        // `b` after the insertion still maps to its original offset
        let generated_b = code.find("b{}").unwrap() as u32;
        assert_eq!(
            map.original_position(TextSize::from(generated_b)),
            Some(TextSize::from(23))
        );
    }

    #[test]
    fn test_insertions_at_overwrite_edges() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::from_range(2..4), "XY").unwrap();
        buffer.insert_left(2, "<").unwrap();
        buffer.insert_left(4, ">").unwrap();
        buffer.insert_left(4, ">").unwrap();
        assert_eq!(buffer.to_string(), "ab<XY>>ef");
    }

    #[test]
    fn test_insert_at_end_precedes_append() {
        let mut buffer = EditBuffer::new("ab");
        buffer.append("!");
        buffer.insert_left(2, "?").unwrap();
        assert_eq!(buffer.to_string(), "ab?!");
    }

    #[test]
    fn test_overlapping_overwrites_are_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::from_range(1..4), "x").unwrap();
        assert_eq!(
            buffer.overwrite(Span::from_range(3..5), "y"),
            Err(EditError::Overlap {
                start: 3,
                end: 5,
                other_start: 1,
                other_end: 4,
            })
        );
        // adjacent ranges are fine
        buffer.overwrite(Span::from_range(4..6), "z").unwrap();
        assert_eq!(buffer.to_string(), "axz");
    }

    #[test]
    fn test_overwrite_covering_a_later_range_is_rejected() {
        let mut buffer = EditBuffer::new("abcdef");
        buffer.overwrite(Span::from_range(3..4), "x").unwrap();
        assert!(matches!(
            buffer.overwrite(Span::from_range(1..5), "y"),
            Err(EditError::Overlap { .. })
        ));
    }

    #[test]
    fn test_invalid_edits() {
        let mut buffer = EditBuffer::new("aé");
        assert_eq!(
            buffer.overwrite(Span::from_range(1..1), "x"),
            Err(EditError::EmptyRange { offset: 1 })
        );
        assert_eq!(
            buffer.overwrite(Span::from_range(0..2), "x"),
            Err(EditError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(
            buffer.insert_left(9, "x"),
            Err(EditError::OutOfBounds {
                start: 9,
                end: 9,
                len: 3
            })
        );

        buffer.overwrite(Span::from_range(0..3), "x").unwrap();
        assert_eq!(
            buffer.insert_left(1, "y"),
            Err(EditError::InsideOverwrite {
                offset: 1,
                start: 0,
                end: 3
            })
        );
    }
}
