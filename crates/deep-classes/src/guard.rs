//! Detection of leading TypeScript script blocks.
//!
//! The markup parser does not understand TypeScript, so when a file declares
//! `lang="ts"` the script blocks at the very start of the file are excluded
//! from parsing. A TypeScript script anywhere else makes the file unsafe to
//! touch and it is passed through unchanged.

use regex::Regex;
use std::sync::OnceLock;

fn typescript_lang() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"lang=['"]ts['"]"#).unwrap())
}

/// Greedy: runs through the last `</script>` in the file.
fn leading_script_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<script[\s\S]*</script>\s*").unwrap())
}

/// Where parsing may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptGuard {
    /// No TypeScript; the whole document is parsed.
    Clear,
    /// TypeScript script blocks occupy `0..end`, including trailing whitespace.
    Leading {
        /// Byte offset of the first character after the skipped region.
        end: usize,
    },
    /// TypeScript is present but the file does not start with its script.
    Unsafe,
}

impl ScriptGuard {
    /// Classifies `content`.
    pub fn detect(content: &str) -> Self {
        if !typescript_lang().is_match(content) {
            return Self::Clear;
        }
        if !content.starts_with("<script") {
            return Self::Unsafe;
        }
        match leading_script_blocks().find(content) {
            Some(m) => Self::Leading { end: m.end() },
            None => Self::Unsafe,
        }
    }

    /// Returns the offset parsing starts at, or `None` if the file must be
    /// left alone.
    pub fn parse_start(&self) -> Option<usize> {
        match self {
            Self::Clear => Some(0),
            Self::Leading { end } => Some(*end),
            Self::Unsafe => None,
        }
    }
}
