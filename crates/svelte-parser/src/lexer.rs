//! Markup lexer using logos.
//!
//! Only structural tokens are produced. Text runs, script/style bodies,
//! attribute strings and expressions are read from the source directly by
//! the parser, which then skips the tokens that fall inside them.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for Svelte markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    /// `<!--`
    #[token("<!--", priority = 12)]
    CommentOpen,

    /// `<`
    #[token("<", priority = 10)]
    LAngle,

    /// `</`
    #[token("</", priority = 10)]
    LAngleSlash,

    /// `>`
    #[token(">", priority = 10)]
    RAngle,

    /// `/>`
    #[token("/>", priority = 10)]
    SlashRAngle,

    /// `/`
    #[token("/", priority = 10)]
    Slash,

    /// `=`
    #[token("=", priority = 10)]
    Eq,

    /// `"`
    #[token("\"", priority = 10)]
    DoubleQuote,

    /// `'`
    #[token("'", priority = 10)]
    SingleQuote,

    /// `{`
    #[token("{", priority = 10)]
    LBrace,

    /// `}`
    #[token("}", priority = 10)]
    RBrace,

    /// `{#`
    #[token("{#", priority = 11)]
    LBraceHash,

    /// `{/`
    #[token("{/", priority = 11)]
    LBraceSlash,

    /// `{:`
    #[token("{:", priority = 11)]
    LBraceColon,

    /// `{@`
    #[token("{@", priority = 11)]
    LBraceAt,

    /// A tag, attribute or directive name, e.g. `div`, `Tooltip.Root`,
    /// `svelte:head`, `on:click|once`.
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$\-.:|]*", priority = 4)]
    Name,

    /// Any other run of non-structural characters.
    #[regex(r#"[^\s<>{}="'/]+"#, priority = 1)]
    Text,

    /// End of file
    Eof,

    /// Invalid/unknown token
    #[default]
    Error,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::CommentOpen => "'<!--'",
            TokenKind::LAngle => "'<'",
            TokenKind::LAngleSlash => "'</'",
            TokenKind::RAngle => "'>'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::Slash => "'/'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuote => "'\"'",
            TokenKind::SingleQuote => "'''",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBraceHash => "'{#'",
            TokenKind::LBraceSlash => "'{/'",
            TokenKind::LBraceColon => "'{:'",
            TokenKind::LBraceAt => "'{@'",
            TokenKind::Name => "name",
            TokenKind::Text => "text",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer for Svelte source code.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Returns the source string being lexed.
    pub fn source(&self) -> &'src str {
        self.source
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let kind = match self.inner.next() {
            Some(Ok(kind)) => kind,
            Some(Err(())) => TokenKind::Error,
            None => {
                self.finished = true;
                return Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::empty(TextSize::of(self.source)),
                });
            }
        };
        Some(Token {
            kind,
            span: Span::from_range(self.inner.span()),
        })
    }
}
