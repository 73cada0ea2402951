//! Svelte markup parser for svelte-deep-classes.
//!
//! This crate provides the parser the class rewriter runs on:
//! - Lexer (tokenizer) using `logos`
//! - Recursive descent parser that reads expressions, scripts and styles raw
//! - AST types with byte spans for every node, attribute and value
//!
//! # Example
//!
//! ```
//! use svelte_parser::{parse, Attribute, AttributeValue, TemplateNode};
//!
//! let source = r#"<Button class="p-2 rtl:ml-2">Save</Button>"#;
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//!
//! let TemplateNode::Component(button) = &result.document.fragment.nodes[0] else {
//!     panic!("expected a component");
//! };
//! let Attribute::Normal(class) = &button.attributes[0] else {
//!     panic!("expected a normal attribute");
//! };
//! let AttributeValue::Text(value) = &class.value else {
//!     panic!("expected a text value");
//! };
//! assert_eq!(&source[value.span.range()], "p-2 rtl:ml-2");
//! ```

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use source_map::Span;

/// The result of parsing a Svelte file.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed document.
    pub document: SvelteDocument,
    /// Any errors encountered during parsing.
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns the document, or every error if there was at least one.
    pub fn into_result(self) -> Result<SvelteDocument, Vec<ParseError>> {
        if self.errors.is_empty() {
            Ok(self.document)
        } else {
            Err(self.errors)
        }
    }
}

/// Parses a Svelte source file into an AST.
///
/// This function will attempt to parse the entire file and recover from errors
/// where possible, returning both the AST and any errors encountered.
pub fn parse(source: &str) -> ParseResult {
    parser::Parser::new(source).parse()
}
