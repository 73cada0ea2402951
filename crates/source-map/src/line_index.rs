//! Line index for offset to line/column conversion.

use crate::ByteOffset;
use text_size::TextSize;

/// A line and column position (0-indexed).
///
/// Columns are counted in UTF-16 code units, which is what source map
/// consumers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column in UTF-16 code units.
    pub col: u32,
}

impl LineCol {
    /// Creates a new line/column position.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Returns the position after `ch`, stepping to the next line on `\n`.
    #[inline]
    pub fn advance(self, ch: char) -> Self {
        if ch == '\n' {
            Self::new(self.line + 1, 0)
        } else {
            Self::new(self.line, self.col + ch.len_utf16() as u32)
        }
    }

    /// Returns the position after every character of `text`.
    pub fn advance_str(self, text: &str) -> Self {
        text.chars().fold(self, LineCol::advance)
    }
}

/// Line start table for a single text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    /// `line_starts[i]` is the byte offset where line `i` begins.
    line_starts: Vec<ByteOffset>,
}

impl<'a> LineIndex<'a> {
    /// Builds the index for `text`.
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        line_starts.extend(
            text.match_indices('\n')
                .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
        );
        Self { text, line_starts }
    }

    /// Returns the number of lines in the text.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a byte offset to a line/column position.
    ///
    /// Returns `None` if the offset is past the end of the text or not on a
    /// character boundary.
    pub fn line_col(&self, offset: ByteOffset) -> Option<LineCol> {
        let byte = usize::from(offset);
        if byte > self.text.len() || !self.text.is_char_boundary(byte) {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = usize::from(self.line_starts[line]);
        let col = self.text[line_start..byte].encode_utf16().count() as u32;

        Some(LineCol::new(line as u32, col))
    }

    /// Returns the byte offset where a line starts.
    pub fn line_start(&self, line: u32) -> Option<ByteOffset> {
        self.line_starts.get(line as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.line_col(TextSize::from(0)), Some(LineCol::new(0, 0)));
        assert_eq!(index.line_col(TextSize::from(5)), Some(LineCol::new(0, 5)));
        assert_eq!(index.line_col(TextSize::from(11)), Some(LineCol::new(0, 11)));
        assert_eq!(index.line_col(TextSize::from(12)), None);
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(5)), Some(LineCol::new(0, 5)));
        assert_eq!(index.line_col(TextSize::from(6)), Some(LineCol::new(1, 0)));
        assert_eq!(index.line_col(TextSize::from(10)), Some(LineCol::new(1, 4)));
        assert_eq!(index.line_col(TextSize::from(12)), Some(LineCol::new(2, 0)));
    }

    #[test]
    fn test_utf16_columns() {
        // "é" is 2 bytes / 1 UTF-16 unit, "😀" is 4 bytes / 2 UTF-16 units.
        let text = "é😀x";
        let index = LineIndex::new(text);
        assert_eq!(index.line_col(TextSize::from(2)), Some(LineCol::new(0, 1)));
        assert_eq!(index.line_col(TextSize::from(6)), Some(LineCol::new(0, 3)));
        assert_eq!(index.line_col(TextSize::from(1)), None);
    }

    #[test]
    fn test_advance_matches_index() {
        let text = "ab\né😀\nz";
        let index = LineIndex::new(text);
        let walked = LineCol::default().advance_str(text);
        assert_eq!(Some(walked), index.line_col(TextSize::from(text.len() as u32)));
    }

    #[test]
    fn test_line_start() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.line_start(0), Some(TextSize::from(0)));
        assert_eq!(index.line_start(1), Some(TextSize::from(6)));
        assert_eq!(index.line_start(2), Some(TextSize::from(12)));
        assert_eq!(index.line_start(3), None);
    }
}
