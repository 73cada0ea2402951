//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// An unexpected token was encountered.
    #[error("unexpected token: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },

    /// An unexpected end of file was encountered.
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof {
        /// What was expected.
        expected: String,
    },

    /// An unclosed tag was found.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedTag {
        /// The name of the unclosed tag.
        tag_name: String,
    },

    /// A mismatched closing tag was found.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedClosingTag {
        /// The expected tag name.
        expected: String,
        /// The found tag name.
        found: String,
    },

    /// A closing tag with no matching open tag.
    #[error("unexpected closing tag: </{tag_name}>")]
    UnexpectedClosingTag {
        /// The name in the closing tag.
        tag_name: String,
    },

    /// An unclosed block was found.
    #[error("unclosed block: {{#{block_type}}}")]
    UnclosedBlock {
        /// The type of block (if, each, await, key, snippet).
        block_type: String,
    },

    /// An invalid tag name was found.
    #[error("invalid tag name: {name}")]
    InvalidTagName {
        /// The invalid tag name.
        name: String,
    },

    /// An invalid block or tag syntax was found.
    #[error("invalid block syntax: {message}")]
    InvalidBlockSyntax {
        /// A description of the problem.
        message: String,
    },

    /// An invalid attribute was found.
    #[error("invalid attribute: {message}")]
    InvalidAttribute {
        /// A description of the problem.
        message: String,
    },

    /// A second top-level `<script>` of the same context or a second `<style>`.
    #[error("a component can have a single top-level <{tag_name}> element")]
    DuplicateTopLevel {
        /// `script` or `style`.
        tag_name: String,
    },
}
