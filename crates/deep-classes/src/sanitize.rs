//! Parser input preparation.
//!
//! `@apply` directives are not valid CSS for the markup parser's purposes and
//! are cut out of the text it sees. Offsets reported on the cut text are
//! converted back to offsets into the original document.

use regex::Regex;
use source_map::Span;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Matches an `@apply` directive up to the last non-`}` character before the
/// closing brace of its rule.
pub(crate) fn apply_directive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@apply [\s\S]+?[^}]+").unwrap())
}

/// Removes every `@apply` directive from `text`.
pub(crate) fn strip_apply(text: &str) -> Cow<'_, str> {
    apply_directive().replace_all(text, "")
}

#[derive(Debug, Clone, Copy)]
struct Removal {
    /// Position of the cut in sanitized coordinates.
    at: usize,
    /// Bytes removed up to and including this cut.
    total: usize,
}

/// The parser's view of a document.
#[derive(Debug, Clone)]
pub struct Sanitized {
    text: String,
    /// Original offset of sanitized offset 0.
    base: usize,
    removals: Vec<Removal>,
}

impl Sanitized {
    /// Prepares `content[start..]` for parsing.
    pub fn new(content: &str, start: usize) -> Self {
        let input = &content[start..];
        let mut text = String::with_capacity(input.len());
        let mut removals = Vec::new();
        let mut cursor = 0;
        let mut total = 0;
        for m in apply_directive().find_iter(input) {
            text.push_str(&input[cursor..m.start()]);
            total += m.len();
            removals.push(Removal {
                at: text.len(),
                total,
            });
            cursor = m.end();
        }
        text.push_str(&input[cursor..]);

        Self {
            text,
            base: start,
            removals,
        }
    }

    /// Returns the text handed to the parser.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of removed directives.
    pub fn removed_count(&self) -> usize {
        self.removals.len()
    }

    /// Maps a sanitized offset that starts a range.
    ///
    /// A cut at exactly `offset` is skipped over: the range begins after the
    /// removed text.
    pub fn map_start(&self, offset: usize) -> usize {
        let idx = self.removals.partition_point(|r| r.at <= offset);
        self.shift(idx) + offset
    }

    /// Maps a sanitized offset that ends a range.
    ///
    /// A cut at exactly `offset` is not included: the range ends before the
    /// removed text.
    pub fn map_end(&self, offset: usize) -> usize {
        let idx = self.removals.partition_point(|r| r.at < offset);
        self.shift(idx) + offset
    }

    /// Maps a sanitized span to the original document.
    pub fn map_span(&self, span: Span) -> Span {
        let range = span.range();
        if range.is_empty() {
            return Span::empty(source_map::offset(self.map_start(range.start)));
        }
        Span::from_range(self.map_start(range.start)..self.map_end(range.end))
    }

    fn shift(&self, removals_before: usize) -> usize {
        let removed = removals_before
            .checked_sub(1)
            .map_or(0, |idx| self.removals[idx].total);
        self.base + removed
    }
}
