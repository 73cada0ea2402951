//! Position mapping table recorded while materializing an edit buffer.

use crate::{ByteOffset, Span};
use text_size::TextSize;

/// How a generated span relates to its original span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingKind {
    /// Text copied unchanged; every byte maps 1:1.
    Verbatim,
    /// Text replaced by different content; only the start is meaningful.
    Replaced,
}

/// A single mapping from a generated span to an original span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
    /// Whether the chunk was copied or replaced.
    pub kind: MappingKind,
}

/// Mappings from generated positions back to the original source, sorted by
/// generated position. Inserted text has no mapping.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns an iterator over all mappings.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// Positions inside replaced text resolve to the start of the replaced
    /// range. Returns `None` for inserted text.
    pub fn original_position(&self, generated: ByteOffset) -> Option<ByteOffset> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.checked_sub(1)?,
        };
        let mapping = self
            .mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))?;

        match mapping.kind {
            MappingKind::Verbatim => {
                Some(mapping.original.start + (generated - mapping.generated.start))
            }
            MappingKind::Replaced => Some(mapping.original.start),
        }
    }

    /// Finds the generated position corresponding to an original position.
    ///
    /// Returns `None` if the original position was removed or replaced.
    pub fn generated_position(&self, original: ByteOffset) -> Option<ByteOffset> {
        self.mappings
            .iter()
            .filter(|m| m.kind == MappingKind::Verbatim)
            .find(|m| m.original.contains(original))
            .map(|m| m.generated.start + (original - m.original.start))
    }
}

/// Records mappings while output text is produced front to back.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    /// Current position in the generated output.
    generated_offset: ByteOffset,
}

impl SourceMapBuilder {
    /// Creates a new source map builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generated offset.
    #[inline]
    pub fn generated_offset(&self) -> ByteOffset {
        self.generated_offset
    }

    /// Adds verbatim source text starting at `original_start`.
    pub fn add_source(&mut self, original_start: ByteOffset, text: &str) {
        if text.is_empty() {
            return;
        }
        let len = TextSize::of(text);
        self.push(
            Span::new(original_start, original_start + len),
            len,
            MappingKind::Verbatim,
        );
    }

    /// Adds text that replaces the `original` span.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        let len = TextSize::of(generated_text);
        if len == TextSize::from(0) {
            return;
        }
        self.push(original, len, MappingKind::Replaced);
    }

    /// Adds inserted text that has no original position.
    pub fn add_generated(&mut self, text: &str) {
        self.generated_offset += TextSize::of(text);
    }

    fn push(&mut self, original: Span, len: TextSize, kind: MappingKind) {
        let start = self.generated_offset;
        self.generated_offset += len;
        self.mappings.push(Mapping {
            generated: Span::new(start, self.generated_offset),
            original,
            kind,
        });
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_builder_add_source() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "hello");
        builder.add_generated(" ");
        builder.add_source(TextSize::from(10), "world");

        let map = builder.build();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.original_position(TextSize::from(4)),
            Some(TextSize::from(4))
        );
        // the inserted space has no mapping
        assert_eq!(map.original_position(TextSize::from(5)), None);
        assert_eq!(
            map.original_position(TextSize::from(6)),
            Some(TextSize::from(10))
        );
    }

    #[test]
    fn test_replaced_text_maps_to_range_start() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "a");
        builder.add_transformed(Span::new(1u32, 3u32), "longer");
        builder.add_source(TextSize::from(3), "z");

        let map = builder.build();
        assert_eq!(
            map.original_position(TextSize::from(5)),
            Some(TextSize::from(1))
        );
        assert_eq!(
            map.original_position(TextSize::from(7)),
            Some(TextSize::from(3))
        );
        assert_eq!(map.generated_position(TextSize::from(2)), None);
        assert_eq!(
            map.generated_position(TextSize::from(3)),
            Some(TextSize::from(7))
        );
    }

    #[test]
    fn test_empty_chunks_are_not_recorded() {
        let mut builder = SourceMapBuilder::new();
        builder.add_source(TextSize::from(0), "");
        builder.add_transformed(Span::new(0u32, 2u32), "");
        assert!(builder.build().is_empty());
    }
}
