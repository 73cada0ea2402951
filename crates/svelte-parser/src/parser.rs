//! Recursive descent parser for Svelte markup.
//!
//! Tags, attributes and block delimiters are parsed from the token stream.
//! Everything whose content is opaque to the markup grammar (text runs,
//! script and style bodies, quoted values, expressions, comments) is read
//! straight from the source, after which the token cursor is moved past it.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::ParseResult;
use smol_str::SmolStr;
use source_map::{offset, Span};
use text_size::TextSize;

/// HTML void elements that are self-closing and should not have closing tags.
/// See: https://developer.mozilla.org/en-US/docs/Glossary/Void_element
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements whose content is text and `{expression}` tags only.
const TEXT_SEQUENCE_ELEMENTS: &[&str] = &["textarea"];

/// Returns true if the given element name is an HTML void element.
fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Returns true if an open `current` element ends where a `next` tag opens,
/// as HTML allows for `<li>`, `<p>`, table cells and the like.
fn closing_tag_omitted(current: &str, next: &str) -> bool {
    let closed_by: &[&str] = match current {
        "li" => &["li"],
        "dt" | "dd" => &["dt", "dd"],
        "p" => &[
            "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form",
            "h1", "h2", "h3", "h4", "h5", "h6", "header", "hgroup", "hr", "main", "menu", "nav",
            "ol", "p", "pre", "section", "table", "ul",
        ],
        "rt" | "rp" => &["rt", "rp"],
        "optgroup" => &["optgroup"],
        "option" => &["option", "optgroup"],
        "thead" | "tbody" => &["tbody", "tfoot"],
        "tfoot" => &["tbody"],
        "tr" => &["tr", "tbody"],
        "td" | "th" => &["td", "th", "tr"],
        _ => return false,
    };
    closed_by.contains(&next)
}

/// Something whose children are being parsed.
enum Scope {
    /// A plain HTML element; its closing tag may be implied.
    Element(SmolStr),
    /// A component or `<svelte:*>` element; it must be closed explicitly.
    Component(SmolStr),
    /// A `{#...}` block.
    Block,
}

/// A parsed opening tag.
struct OpenTag {
    start: usize,
    name: SmolStr,
    attributes: Vec<Attribute>,
    self_closing: bool,
}

/// A top-level `<script>` or `<style>` element.
struct RawBlock {
    span: Span,
    content_span: Span,
    content: String,
    attributes: Vec<Attribute>,
}

/// The Svelte parser.
pub struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// The token stream.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Byte offset up to which the source has been consumed.
    offset: usize,
    /// Parse errors collected during parsing.
    errors: Vec<ParseError>,
    /// Elements and blocks enclosing the current position, innermost last.
    scopes: Vec<Scope>,
    /// EOF token for when we're past the end
    eof_token: Token,
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(source: &'src str) -> Self {
        let tokens: Vec<Token> = Lexer::new(source).collect();
        let eof_token = Token {
            kind: TokenKind::Eof,
            span: Span::empty(TextSize::of(source)),
        };
        Self {
            source,
            tokens,
            pos: 0,
            offset: 0,
            errors: Vec::new(),
            scopes: Vec::new(),
            eof_token,
        }
    }

    /// Parses the source into a Svelte document.
    pub fn parse(mut self) -> ParseResult {
        let document = self.parse_document();
        ParseResult {
            document,
            errors: self.errors,
        }
    }

    // === Token helpers ===

    /// Returns the current token.
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof_token)
    }

    /// Returns the current token kind.
    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Returns the source text of a token.
    fn text(&self, token: &Token) -> &'src str {
        &self.source[token.span.range()]
    }

    /// Consumes the current token.
    fn bump(&mut self) -> Token {
        let token = *self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.offset = self.offset.max(usize::from(token.span.end));
        token
    }

    /// Checks if the current token matches the given kind.
    fn check(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Advances if the current token matches, returns true if matched.
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expects the current token to be the given kind, reports error if not.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.current_kind();
        if found == TokenKind::Eof {
            self.error(ParseErrorKind::UnexpectedEof {
                expected: kind.name().to_string(),
            });
        } else {
            self.error(ParseErrorKind::UnexpectedToken {
                expected: kind.name().to_string(),
                found: found.name().to_string(),
            });
        }
        false
    }

    /// Reports an error at the current position.
    fn error(&mut self, kind: ParseErrorKind) {
        self.errors.push(ParseError::new(kind, self.current().span));
    }

    /// Marks the source up to `end` as consumed and skips the tokens inside it.
    fn sync_to(&mut self, end: usize) {
        self.offset = self.offset.max(end);
        while self.pos < self.tokens.len()
            && usize::from(self.tokens[self.pos].span.start) < self.offset
            && !self.check(TokenKind::Eof)
        {
            self.pos += 1;
        }
    }

    /// Returns the tag name directly after the current `<` or `</`.
    fn peek_tag_name(&self) -> Option<&'src str> {
        let open = self.current();
        let next = self.tokens.get(self.pos + 1)?;
        (next.kind == TokenKind::Name && next.span.start == open.span.end).then(|| self.text(next))
    }

    /// Reads a `{...}` construct whose opening token is current.
    ///
    /// Returns the span including braces and the span of the content.
    fn read_braced(&mut self) -> Option<(Span, Span)> {
        let open = self.current().span;
        let inner_start = usize::from(open.end);
        match find_closing(self.source, inner_start, b'}') {
            Some(close) => {
                self.sync_to(close + 1);
                Some((
                    Span::from_range(usize::from(open.start)..close + 1),
                    Span::from_range(inner_start..close),
                ))
            }
            None => {
                self.error(ParseErrorKind::UnexpectedEof {
                    expected: TokenKind::RBrace.name().to_string(),
                });
                self.sync_to(self.source.len());
                None
            }
        }
    }

    /// Splits the leading keyword off a tag body, returning the keyword and
    /// the trimmed span of the remainder.
    fn split_keyword(&self, inner: Span) -> (&'src str, Span) {
        let text = &self.source[inner.range()];
        let len = text
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(text.len());
        let rest = Span::from_range(inner.range().start + len..inner.range().end);
        (&text[..len], trim_span(self.source, rest))
    }

    // === Document ===

    /// Parses the whole document.
    fn parse_document(&mut self) -> SvelteDocument {
        let mut doc = SvelteDocument::default();
        let mut nodes = Vec::new();

        loop {
            if let Some(text) = self.parse_text() {
                nodes.push(text);
                continue;
            }
            if self.check(TokenKind::Eof) {
                break;
            }

            if self.check(TokenKind::LAngle) {
                match self.peek_tag_name() {
                    Some("script") => {
                        self.parse_top_level_script(&mut doc);
                        continue;
                    }
                    Some("style") => {
                        self.parse_top_level_style(&mut doc);
                        continue;
                    }
                    _ => {}
                }
            }

            if let Some(node) = self.parse_template_node() {
                nodes.push(node);
            }
        }

        let span = Span::new(TextSize::from(0), TextSize::of(self.source));
        doc.fragment = Fragment { nodes, span };
        doc.span = span;
        doc
    }

    fn parse_top_level_script(&mut self, doc: &mut SvelteDocument) {
        let start = self.current().span;
        let Some(block) = self.parse_raw_block() else {
            return;
        };

        let mut lang = ScriptLang::JavaScript;
        let mut context = ScriptContext::Default;
        for attr in &block.attributes {
            let Attribute::Normal(attr) = attr else {
                continue;
            };
            let value = attr.value.leading_text().map(|t| t.raw.as_str());
            match (attr.name.as_str(), value) {
                ("lang" | "type", Some(value)) if value == "ts" || value.contains("typescript") => {
                    lang = ScriptLang::TypeScript;
                }
                ("context", Some("module")) | ("module", _) => context = ScriptContext::Module,
                _ => {}
            }
        }

        let script = Script {
            span: block.span,
            content_span: block.content_span,
            content: block.content,
            lang,
            context,
            attributes: block.attributes,
        };
        let slot = match context {
            ScriptContext::Module => &mut doc.module_script,
            ScriptContext::Default => &mut doc.instance_script,
        };
        if slot.is_some() {
            self.errors.push(ParseError::new(
                ParseErrorKind::DuplicateTopLevel {
                    tag_name: "script".to_string(),
                },
                start,
            ));
        } else {
            *slot = Some(script);
        }
    }

    fn parse_top_level_style(&mut self, doc: &mut SvelteDocument) {
        let start = self.current().span;
        let Some(block) = self.parse_raw_block() else {
            return;
        };
        if doc.style.is_some() {
            self.errors.push(ParseError::new(
                ParseErrorKind::DuplicateTopLevel {
                    tag_name: "style".to_string(),
                },
                start,
            ));
            return;
        }
        doc.style = Some(Style {
            span: block.span,
            content_span: block.content_span,
            content: block.content,
            attributes: block.attributes,
        });
    }

    /// Parses a `<script>` or `<style>` element with its raw content.
    fn parse_raw_block(&mut self) -> Option<RawBlock> {
        let tag = self.parse_open_tag()?;
        let (content_span, content) = if tag.self_closing {
            (Span::empty(offset(self.offset)), String::new())
        } else {
            let raw = self.read_raw_content(&tag.name);
            self.parse_closing_tag(&tag.name);
            raw
        };
        Some(RawBlock {
            span: Span::from_range(tag.start..self.offset),
            content_span,
            content,
            attributes: tag.attributes,
        })
    }

    /// Reads everything up to the closing tag of a raw text element.
    fn read_raw_content(&mut self, name: &str) -> (Span, String) {
        let start = self.offset;
        let needle = format!("</{name}");
        let end = self.source[start..]
            .find(&needle)
            .map_or(self.source.len(), |idx| start + idx);
        self.sync_to(end);
        (
            Span::from_range(start..end),
            self.source[start..end].to_string(),
        )
    }

    // === Fragments ===

    /// Parses nodes until one of `stop` (or the end of input) is current.
    fn parse_fragment(&mut self, stop: &[TokenKind]) -> Fragment {
        let start = self.offset;
        let mut nodes = Vec::new();
        loop {
            if let Some(text) = self.parse_text() {
                nodes.push(text);
                continue;
            }
            let kind = self.current_kind();
            if kind == TokenKind::Eof || stop.contains(&kind) || self.opens_implied_sibling() {
                break;
            }
            if let Some(node) = self.parse_template_node() {
                nodes.push(node);
            }
        }
        Fragment {
            nodes,
            span: Span::from_range(start..self.offset),
        }
    }

    /// Parses a single template node. Always consumes input.
    fn parse_template_node(&mut self) -> Option<TemplateNode> {
        match self.current_kind() {
            TokenKind::CommentOpen => self.parse_comment(),
            TokenKind::LAngle => self.parse_element(),
            TokenKind::LAngleSlash => {
                self.parse_stray_closing_tag();
                None
            }
            TokenKind::LBraceHash => self.parse_block(),
            TokenKind::LBraceAt => self.parse_special_tag(),
            TokenKind::LBrace => self.parse_expression_tag(),
            TokenKind::LBraceColon | TokenKind::LBraceSlash => {
                let token = self.current().span;
                if let Some((span, _)) = self.read_braced() {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::InvalidBlockSyntax {
                            message: format!(
                                "{} is not inside a matching block",
                                &self.source[span.range()]
                            ),
                        },
                        token,
                    ));
                }
                None
            }
            _ => {
                self.bump();
                None
            }
        }
    }

    /// Reads raw text up to the next `<` or `{`.
    fn parse_text(&mut self) -> Option<TemplateNode> {
        let start = self.offset;
        let rest = &self.source[start..];
        let len = rest.find(&['<', '{'][..]).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.sync_to(start + len);
        Some(TemplateNode::Text(Text {
            span: Span::from_range(start..start + len),
            data: rest[..len].to_string(),
        }))
    }

    fn parse_comment(&mut self) -> Option<TemplateNode> {
        let open = self.bump();
        let start = usize::from(open.span.start);
        let data_start = usize::from(open.span.end);
        let Some(idx) = self.source[data_start..].find("-->") else {
            self.error(ParseErrorKind::UnexpectedEof {
                expected: "'-->'".to_string(),
            });
            self.sync_to(self.source.len());
            return None;
        };
        let data_end = data_start + idx;
        self.sync_to(data_end + 3);
        Some(TemplateNode::Comment(Comment {
            span: Span::from_range(start..data_end + 3),
            data: self.source[data_start..data_end].to_string(),
        }))
    }

    fn parse_stray_closing_tag(&mut self) {
        let span = self.current().span;
        let name = self.peek_tag_name().unwrap_or_default();
        self.errors.push(ParseError::new(
            ParseErrorKind::UnexpectedClosingTag {
                tag_name: name.to_string(),
            },
            span,
        ));
        self.bump();
        if !name.is_empty() {
            self.bump();
        }
        self.eat(TokenKind::RAngle);
    }

    // === Elements ===

    /// Parses `<name attributes>` or `<name attributes/>`.
    fn parse_open_tag(&mut self) -> Option<OpenTag> {
        let open = self.bump();
        let start = usize::from(open.span.start);
        let name_token = *self.current();
        if name_token.kind != TokenKind::Name || name_token.span.start != open.span.end {
            let found = if name_token.kind == TokenKind::Eof {
                String::new()
            } else {
                self.text(&name_token).to_string()
            };
            self.error(ParseErrorKind::InvalidTagName { name: found });
            return None;
        }
        self.bump();
        let name = SmolStr::new(self.text(&name_token));

        let attributes = self.parse_attributes();
        let self_closing = self.eat(TokenKind::SlashRAngle);
        if !self_closing {
            self.expect(TokenKind::RAngle);
        }

        Some(OpenTag {
            start,
            name,
            attributes,
            self_closing,
        })
    }

    /// Consumes `</name>`. Reports an error and leaves the input alone if the
    /// current closing tag belongs to someone else.
    fn parse_closing_tag(&mut self, name: &str) {
        if !self.check(TokenKind::LAngleSlash) {
            self.error(ParseErrorKind::UnclosedTag {
                tag_name: name.to_string(),
            });
            return;
        }
        match self.peek_tag_name() {
            Some(found) if found == name => {
                self.bump();
                self.bump();
                self.expect(TokenKind::RAngle);
            }
            found => self.error(ParseErrorKind::MismatchedClosingTag {
                expected: name.to_string(),
                found: found.unwrap_or_default().to_string(),
            }),
        }
    }

    /// Returns true if the current `<name` implicitly closes the innermost
    /// open element.
    fn opens_implied_sibling(&self) -> bool {
        if !self.check(TokenKind::LAngle) {
            return false;
        }
        match (self.scopes.last(), self.peek_tag_name()) {
            (Some(Scope::Element(current)), Some(next)) => closing_tag_omitted(current, next),
            _ => false,
        }
    }

    /// Returns true if the innermost element `name` ends here without its
    /// own closing tag: either a sibling tag closed it, or the current
    /// closing tag belongs to an enclosing element.
    fn closing_tag_implied(&self, name: &str) -> bool {
        if self.opens_implied_sibling() {
            return true;
        }
        if !self.check(TokenKind::LAngleSlash) {
            return false;
        }
        let Some(found) = self.peek_tag_name() else {
            return false;
        };
        if found == name {
            return false;
        }

        let mut scopes = self.scopes.iter().rev();
        if !matches!(scopes.next(), Some(Scope::Element(_))) {
            return false;
        }
        for scope in scopes {
            match scope {
                Scope::Element(open) if open == found => return true,
                Scope::Element(_) => {}
                Scope::Component(open) => return open == found,
                Scope::Block => return false,
            }
        }
        false
    }

    /// Reads text and `{expression}` tags up to `</name`.
    fn parse_text_sequence(&mut self, name: &str) -> Vec<TemplateNode> {
        let needle = format!("</{name}");
        let mut nodes = Vec::new();
        loop {
            let start = self.offset;
            let end = self.source[start..]
                .find(&needle)
                .map_or(self.source.len(), |idx| start + idx);
            let brace = self.source[start..end].find('{').map(|idx| start + idx);

            let text_end = brace.unwrap_or(end);
            if text_end > start {
                self.sync_to(text_end);
                nodes.push(TemplateNode::Text(Text {
                    span: Span::from_range(start..text_end),
                    data: self.source[start..text_end].to_string(),
                }));
            }

            let Some(brace) = brace else {
                break;
            };
            let Some(close) = find_closing(self.source, brace + 1, b'}') else {
                self.errors.push(ParseError::new(
                    ParseErrorKind::UnexpectedEof {
                        expected: TokenKind::RBrace.name().to_string(),
                    },
                    Span::from_range(brace..brace + 1),
                ));
                self.sync_to(self.source.len());
                break;
            };
            self.sync_to(close + 1);
            let inner = trim_span(self.source, Span::from_range(brace + 1..close));
            nodes.push(TemplateNode::Expression(ExpressionTag {
                span: Span::from_range(brace..close + 1),
                expression_span: inner,
                expression: self.source[inner.range()].to_string(),
            }));
        }
        nodes
    }

    fn parse_element(&mut self) -> Option<TemplateNode> {
        let tag = self.parse_open_tag()?;

        let svelte_kind = match tag.name.strip_prefix("svelte:") {
            Some(suffix) => {
                let kind = SvelteElementKind::from_suffix(suffix);
                if kind.is_none() {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::InvalidTagName {
                            name: tag.name.to_string(),
                        },
                        Span::from_range(tag.start..tag.start + 1 + tag.name.len()),
                    ));
                }
                kind
            }
            None => None,
        };
        let is_component = svelte_kind.is_none()
            && (tag.name.contains('.') || tag.name.starts_with(|c: char| c.is_ascii_uppercase()));
        let is_void = svelte_kind.is_none() && !is_component && is_void_element(&tag.name);

        let children = if tag.self_closing || is_void {
            Vec::new()
        } else if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            let (span, data) = self.read_raw_content(&tag.name);
            self.parse_closing_tag(&tag.name);
            if data.is_empty() {
                Vec::new()
            } else {
                vec![TemplateNode::Text(Text { span, data })]
            }
        } else if TEXT_SEQUENCE_ELEMENTS.contains(&tag.name.as_str()) {
            let nodes = self.parse_text_sequence(&tag.name);
            self.parse_closing_tag(&tag.name);
            nodes
        } else {
            self.scopes.push(if svelte_kind.is_none() && !is_component {
                Scope::Element(tag.name.clone())
            } else {
                Scope::Component(tag.name.clone())
            });
            let fragment = self.parse_fragment(&[TokenKind::LAngleSlash]);
            if !self.closing_tag_implied(&tag.name) {
                self.parse_closing_tag(&tag.name);
            }
            self.scopes.pop();
            fragment.nodes
        };

        let span = Span::from_range(tag.start..self.offset);
        Some(match svelte_kind {
            Some(kind) => TemplateNode::SvelteElement(SvelteElement {
                span,
                kind,
                attributes: tag.attributes,
                children,
            }),
            None if is_component => TemplateNode::Component(Component {
                span,
                name: tag.name,
                attributes: tag.attributes,
                children,
                self_closing: tag.self_closing,
            }),
            None => TemplateNode::Element(Element {
                span,
                name: tag.name,
                attributes: tag.attributes,
                children,
                self_closing: tag.self_closing,
            }),
        })
    }

    // === Attributes ===

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => break,
                TokenKind::Name | TokenKind::Text => {
                    if let Some(attr) = self.parse_normal_attribute() {
                        attributes.push(attr);
                    }
                }
                TokenKind::LBrace => {
                    if let Some(attr) = self.parse_spread_or_shorthand() {
                        attributes.push(attr);
                    }
                }
                TokenKind::LBraceAt => {
                    if let Some(attr) = self.parse_attach_attribute() {
                        attributes.push(attr);
                    }
                }
                found => {
                    self.error(ParseErrorKind::InvalidAttribute {
                        message: format!("unexpected {} in tag", found.name()),
                    });
                    self.bump();
                }
            }
        }
        attributes
    }

    fn parse_normal_attribute(&mut self) -> Option<Attribute> {
        let name_token = self.bump();
        let name = SmolStr::new(self.text(&name_token));
        let start = usize::from(name_token.span.start);

        let value = if self.eat(TokenKind::Eq) {
            match self.current_kind() {
                TokenKind::DoubleQuote | TokenKind::SingleQuote => self.parse_quoted_value()?,
                TokenKind::LBrace => AttributeValue::Expression(self.parse_expression_value()?),
                TokenKind::Name | TokenKind::Text => self.parse_unquoted_value(),
                _ => {
                    self.error(ParseErrorKind::InvalidAttribute {
                        message: format!("expected a value for `{name}`"),
                    });
                    return None;
                }
            }
        } else {
            AttributeValue::True
        };

        Some(Attribute::Normal(NormalAttribute {
            span: Span::from_range(start..self.offset),
            name,
            value,
        }))
    }

    /// Parses `"text {expr} text"`, scanning the source byte by byte so that
    /// quotes inside expressions do not end the value.
    fn parse_quoted_value(&mut self) -> Option<AttributeValue> {
        let open = self.bump();
        let source = self.source;
        let bytes = source.as_bytes();
        let quote = bytes[usize::from(open.span.start)];
        let value_start = usize::from(open.span.end);

        let mut parts = Vec::new();
        let mut has_expression = false;
        let mut chunk_start = value_start;
        let mut i = value_start;
        loop {
            match bytes.get(i) {
                None => {
                    self.sync_to(self.source.len());
                    self.error(ParseErrorKind::UnexpectedEof {
                        expected: "closing quote".to_string(),
                    });
                    return None;
                }
                Some(&b) if b == quote => break,
                Some(b'{') => {
                    if chunk_start < i {
                        parts.push(AttributeValuePart::Text(self.text_value(chunk_start..i)));
                    }
                    let Some(close) = find_closing(source, i + 1, b'}') else {
                        self.sync_to(self.source.len());
                        self.error(ParseErrorKind::UnexpectedEof {
                            expected: TokenKind::RBrace.name().to_string(),
                        });
                        return None;
                    };
                    parts.push(AttributeValuePart::Expression(self.expression_value(
                        Span::from_range(i..close + 1),
                        Span::from_range(i + 1..close),
                    )));
                    has_expression = true;
                    i = close + 1;
                    chunk_start = i;
                }
                Some(_) => i += 1,
            }
        }
        self.sync_to(i + 1);

        if !has_expression {
            return Some(AttributeValue::Text(self.text_value(value_start..i)));
        }
        if chunk_start < i {
            parts.push(AttributeValuePart::Text(self.text_value(chunk_start..i)));
        }
        Some(AttributeValue::Concat(parts))
    }

    /// Parses an unquoted value, which ends at whitespace, `>` or `/>`.
    fn parse_unquoted_value(&mut self) -> AttributeValue {
        let start = usize::from(self.current().span.start);
        let source = self.source;
        let bytes = source.as_bytes();
        let mut end = start;
        while let Some(&b) = bytes.get(end) {
            if b.is_ascii_whitespace() || b == b'>' || (b == b'/' && bytes.get(end + 1) == Some(&b'>'))
            {
                break;
            }
            end += 1;
        }
        self.sync_to(end);
        AttributeValue::Text(self.text_value(start..end))
    }

    fn parse_expression_value(&mut self) -> Option<ExpressionValue> {
        let (span, inner) = self.read_braced()?;
        Some(self.expression_value(span, inner))
    }

    fn parse_spread_or_shorthand(&mut self) -> Option<Attribute> {
        let (span, inner) = self.read_braced()?;
        let inner = trim_span(self.source, inner);
        let content = &self.source[inner.range()];
        Some(match content.strip_prefix("...") {
            Some(expression) => Attribute::Spread(SpreadAttribute {
                span,
                expression: expression.trim().to_string(),
            }),
            None => Attribute::Shorthand(ShorthandAttribute {
                span,
                name: SmolStr::new(content),
            }),
        })
    }

    fn parse_attach_attribute(&mut self) -> Option<Attribute> {
        let (span, inner) = self.read_braced()?;
        let (keyword, rest) = self.split_keyword(inner);
        if keyword != "attach" {
            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidAttribute {
                    message: format!("{{@{keyword}}} cannot be used in a tag"),
                },
                span,
            ));
            return None;
        }
        Some(Attribute::Attach(AttachAttribute {
            span,
            expression: self.source[rest.range()].to_string(),
        }))
    }

    fn text_value(&self, range: std::ops::Range<usize>) -> TextValue {
        TextValue {
            raw: self.source[range.clone()].to_string(),
            span: Span::from_range(range),
        }
    }

    fn expression_value(&self, span: Span, inner: Span) -> ExpressionValue {
        ExpressionValue {
            span,
            expression_span: inner,
            expression: self.source[inner.range()].to_string(),
        }
    }

    // === Mustache tags and blocks ===

    fn parse_expression_tag(&mut self) -> Option<TemplateNode> {
        let (span, inner) = self.read_braced()?;
        let inner = trim_span(self.source, inner);
        Some(TemplateNode::Expression(ExpressionTag {
            span,
            expression_span: inner,
            expression: self.source[inner.range()].to_string(),
        }))
    }

    fn parse_special_tag(&mut self) -> Option<TemplateNode> {
        let (span, inner) = self.read_braced()?;
        let (keyword, rest) = self.split_keyword(inner);
        let Some(kind) = SpecialTagKind::from_keyword(keyword) else {
            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidBlockSyntax {
                    message: format!("unknown tag {{@{keyword}}}"),
                },
                span,
            ));
            return None;
        };
        Some(TemplateNode::Tag(SpecialTag {
            span,
            kind,
            expression_span: rest,
            expression: self.source[rest.range()].to_string(),
        }))
    }

    fn parse_block(&mut self) -> Option<TemplateNode> {
        const BODY_STOP: &[TokenKind] = &[
            TokenKind::LAngleSlash,
            TokenKind::LBraceColon,
            TokenKind::LBraceSlash,
        ];

        let (header, inner) = self.read_braced()?;
        let (keyword, expression_span) = self.split_keyword(inner);
        let Some(kind) = BlockKind::from_keyword(keyword) else {
            self.errors.push(ParseError::new(
                ParseErrorKind::InvalidBlockSyntax {
                    message: format!("unknown block {{#{keyword}}}"),
                },
                header,
            ));
            return None;
        };

        self.scopes.push(Scope::Block);
        let body = self.parse_fragment(BODY_STOP);
        let mut branches = Vec::new();
        while self.check(TokenKind::LBraceColon) {
            let Some((tag, inner)) = self.read_braced() else {
                break;
            };
            let (branch_kind, expression) = self.parse_branch_header(inner);
            match branch_kind {
                Some(branch_kind) if kind.accepts(branch_kind) => {
                    let body = self.parse_fragment(BODY_STOP);
                    branches.push(BlockBranch {
                        span: Span::from_range(usize::from(tag.start)..self.offset),
                        kind: branch_kind,
                        expression,
                        body,
                    });
                }
                _ => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::InvalidBlockSyntax {
                            message: format!(
                                "{} cannot continue {{#{}}}",
                                &self.source[tag.range()],
                                kind.keyword()
                            ),
                        },
                        tag,
                    ));
                    // keep the content so that the rest of the block still parses
                    let _ = self.parse_fragment(BODY_STOP);
                }
            }
        }
        self.scopes.pop();

        if self.check(TokenKind::LBraceSlash) {
            let closing = self.current().span;
            if let Some((_, inner)) = self.read_braced() {
                let name = self.source[inner.range()].trim();
                if name != kind.keyword() {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::InvalidBlockSyntax {
                            message: format!(
                                "expected {{/{}}}, found {{/{name}}}",
                                kind.keyword()
                            ),
                        },
                        closing,
                    ));
                }
            }
        } else {
            self.error(ParseErrorKind::UnclosedBlock {
                block_type: kind.keyword().to_string(),
            });
        }

        Some(TemplateNode::Block(Block {
            span: Span::from_range(usize::from(header.start)..self.offset),
            kind,
            expression: self.source[expression_span.range()].to_string(),
            expression_span,
            body,
            branches,
        }))
    }

    /// Resolves `else`, `else if <expr>`, `then <value>` and `catch <error>`.
    fn parse_branch_header(&self, inner: Span) -> (Option<BranchKind>, String) {
        let (keyword, rest) = self.split_keyword(inner);
        let rest_text = &self.source[rest.range()];
        let kind = match keyword {
            "else" => match rest_text.strip_prefix("if") {
                Some(cond) if cond.is_empty() || cond.starts_with(char::is_whitespace) => {
                    return (Some(BranchKind::ElseIf), cond.trim().to_string());
                }
                _ if rest_text.is_empty() => Some(BranchKind::Else),
                _ => None,
            },
            "then" => Some(BranchKind::Then),
            "catch" => Some(BranchKind::Catch),
            _ => None,
        };
        (kind, rest_text.to_string())
    }
}

/// Shrinks `span` to exclude leading and trailing whitespace.
fn trim_span(source: &str, span: Span) -> Span {
    let range = span.range();
    let text = &source[range.clone()];
    let start = range.start + (text.len() - text.trim_start().len());
    let end = range.start + text.trim_end().len();
    Span::from_range(start..end.max(start))
}

/// Finds the `close` byte that ends a JavaScript expression starting at
/// `from`, skipping strings, template literals, comments and nested brackets.
pub(crate) fn find_closing(source: &str, from: usize, close: u8) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i)?,
            b'`' => i = skip_template(source, i)?,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = source[i..].find('\n').map_or(bytes.len(), |idx| i + idx);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = i + 2 + source[i + 2..].find("*/")? + 1;
            }
            b'(' | b'[' | b'{' => depth += 1,
            b @ (b')' | b']' | b'}') => {
                if depth == 0 && b == close {
                    return Some(i);
                }
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Returns the index of the quote closing the string that opens at `start`.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Returns the index of the backtick closing the template literal that opens
/// at `start`.
fn skip_template(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                i = find_closing(source, i + 2, b'}')? + 1;
            }
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParseResult {
        Parser::new(source).parse()
    }

    fn parse_ok(source: &str) -> SvelteDocument {
        let result = parse(source);
        assert!(
            result.errors.is_empty(),
            "Expected no errors, got: {:?}",
            result.errors
        );
        result.document
    }

    fn first_component(doc: &SvelteDocument) -> &Component {
        doc.fragment
            .nodes
            .iter()
            .find_map(|node| match node {
                TemplateNode::Component(c) => Some(c),
                _ => None,
            })
            .expect("Expected Component")
    }

    fn class_value(attributes: &[Attribute]) -> &AttributeValue {
        attributes
            .iter()
            .find_map(|attr| match attr {
                Attribute::Normal(a) if a.name == "class" => Some(&a.value),
                _ => None,
            })
            .expect("Expected class attribute")
    }

    #[test]
    fn test_parse_simple_element() {
        let doc = parse_ok("<div>hello</div>");
        assert_eq!(doc.fragment.nodes.len(), 1);

        if let TemplateNode::Element(el) = &doc.fragment.nodes[0] {
            assert_eq!(el.name.as_str(), "div");
            assert_eq!(el.children.len(), 1);
            assert_eq!(el.span, Span::new(0u32, 16u32));
        } else {
            panic!("Expected Element");
        }
    }

    #[test]
    fn test_parse_unicode_text() {
        let doc = parse_ok("<div>— é</div>");
        if let TemplateNode::Element(el) = &doc.fragment.nodes[0] {
            if let TemplateNode::Text(text) = &el.children[0] {
                assert_eq!(text.data, "— é");
            } else {
                panic!("Expected Text");
            }
        } else {
            panic!("Expected Element");
        }
    }

    #[test]
    fn test_whitespace_is_kept_as_text() {
        let doc = parse_ok("<a></a>\n  <b></b>");
        assert_eq!(doc.fragment.nodes.len(), 3);
        assert!(matches!(&doc.fragment.nodes[1], TemplateNode::Text(t) if t.data == "\n  "));
    }

    #[test]
    fn test_parse_component_class_span() {
        let source = r#"<Button class="p-2 mt-1">Click</Button>"#;
        let doc = parse_ok(source);
        let component = first_component(&doc);
        assert_eq!(component.name.as_str(), "Button");

        let AttributeValue::Text(text) = class_value(&component.attributes) else {
            panic!("Expected text value");
        };
        assert_eq!(text.raw, "p-2 mt-1");
        assert_eq!(&source[text.span.range()], "p-2 mt-1");
    }

    #[test]
    fn test_dotted_component_name() {
        let doc = parse_ok(r#"<Tooltip.Root class='a'/>"#);
        let component = first_component(&doc);
        assert_eq!(component.name.as_str(), "Tooltip.Root");
        assert!(component.self_closing);
    }

    #[test]
    fn test_concatenated_class_value() {
        let source = r#"<Icon class="a {big ? "b" : 'c'} d" />"#;
        let doc = parse_ok(source);
        let AttributeValue::Concat(parts) = class_value(&first_component(&doc).attributes) else {
            panic!("Expected concat value");
        };
        assert_eq!(parts.len(), 3);
        match &parts[1] {
            AttributeValuePart::Expression(expr) => {
                assert_eq!(expr.expression, r#"big ? "b" : 'c'"#);
            }
            AttributeValuePart::Text(_) => panic!("Expected expression part"),
        }
    }

    #[test]
    fn test_expression_and_boolean_values() {
        let doc = parse_ok("<A class={cls} disabled {...rest} {name} />");
        let component = first_component(&doc);
        assert!(matches!(
            class_value(&component.attributes),
            AttributeValue::Expression(e) if e.expression == "cls"
        ));
        assert!(matches!(
            &component.attributes[1],
            Attribute::Normal(a) if matches!(a.value, AttributeValue::True)
        ));
        assert!(matches!(&component.attributes[2], Attribute::Spread(s) if s.expression == "rest"));
        assert!(matches!(&component.attributes[3], Attribute::Shorthand(s) if s.name == "name"));
    }

    #[test]
    fn test_unquoted_value() {
        let doc = parse_ok("<A class=solo/>");
        let AttributeValue::Text(text) = class_value(&first_component(&doc).attributes) else {
            panic!("Expected text value");
        };
        assert_eq!(text.raw, "solo");
    }

    #[test]
    fn test_empty_quoted_value() {
        let source = r#"<A class="" />"#;
        let doc = parse_ok(source);
        let AttributeValue::Text(text) = class_value(&first_component(&doc).attributes) else {
            panic!("Expected text value");
        };
        assert_eq!(text.raw, "");
        assert_eq!(text.span, Span::empty(10u32));
    }

    #[test]
    fn test_parse_script_and_style() {
        let source = "<script lang=\"ts\">let x: number = 1;</script>\n<p>{x}</p>\n<style>p { color: red; }</style>";
        let doc = parse_ok(source);
        let script = doc.instance_script.expect("Expected script");
        assert_eq!(script.lang, ScriptLang::TypeScript);
        assert_eq!(script.content, "let x: number = 1;");

        let style = doc.style.expect("Expected style");
        assert_eq!(style.content, "p { color: red; }");
        assert_eq!(&source[style.content_span.range()], "p { color: red; }");
    }

    #[test]
    fn test_module_script() {
        let doc = parse_ok("<script module>export const a = 1;</script><script>let b;</script>");
        assert_eq!(
            doc.module_script.map(|s| s.context),
            Some(ScriptContext::Module)
        );
        assert!(doc.instance_script.is_some());
    }

    #[test]
    fn test_script_content_is_not_markup() {
        let doc = parse_ok("<script>if (a < b && c) { x = '{'; }</script><p>ok</p>");
        assert!(doc.instance_script.is_some());
        assert_eq!(doc.fragment.nodes.len(), 1);
    }

    #[test]
    fn test_nested_style_is_an_element() {
        let doc = parse_ok("<svelte:head><style>a{}</style></svelte:head><style>b{}</style>");
        assert_eq!(doc.style.map(|s| s.content), Some("b{}".to_string()));
        let TemplateNode::SvelteElement(head) = &doc.fragment.nodes[0] else {
            panic!("Expected SvelteElement");
        };
        assert_eq!(head.kind, SvelteElementKind::Head);
        assert!(matches!(&head.children[0], TemplateNode::Element(e) if e.name == "style"));
    }

    #[test]
    fn test_duplicate_style_is_an_error() {
        let result = parse("<style>a{}</style><style>b{}</style>");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            ParseErrorKind::DuplicateTopLevel { .. }
        ));
    }

    #[test]
    fn test_parse_blocks() {
        let doc = parse_ok(
            "{#if a}<A class=\"x\"/>{:else if b}<B/>{:else}<C/>{/if}{#each items as item}{item}{:else}none{/each}",
        );
        let TemplateNode::Block(block) = &doc.fragment.nodes[0] else {
            panic!("Expected Block");
        };
        assert_eq!(block.kind, BlockKind::If);
        assert_eq!(block.expression, "a");
        let kinds: Vec<_> = block.branches.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![BranchKind::ElseIf, BranchKind::Else]);
        assert_eq!(block.branches[0].expression, "b");

        let TemplateNode::Block(each) = &doc.fragment.nodes[1] else {
            panic!("Expected Block");
        };
        assert_eq!(each.kind, BlockKind::Each);
        assert_eq!(each.expression, "items as item");
    }

    #[test]
    fn test_await_and_snippet() {
        parse_ok("{#await p}…{:then v}{v}{:catch e}{e}{/await}");
        parse_ok("{#snippet row(item)}<td>{item}</td>{/snippet}{@render row(x)}");
    }

    #[test]
    fn test_special_tags() {
        let doc = parse_ok("{@html '<b>'}{@const y = {a: 1}}");
        let kinds: Vec<_> = doc
            .fragment
            .nodes
            .iter()
            .map(|n| match n {
                TemplateNode::Tag(t) => t.kind,
                _ => panic!("Expected Tag"),
            })
            .collect();
        assert_eq!(kinds, vec![SpecialTagKind::Html, SpecialTagKind::Const]);
    }

    #[test]
    fn test_parse_nested_braces_in_expression() {
        let doc = parse_ok("<div onclick={() => { if (x) { y(); } }}>{`a ${ {b: 1}.b } }`}</div>");
        let TemplateNode::Element(el) = &doc.fragment.nodes[0] else {
            panic!("Expected Element");
        };
        assert!(matches!(&el.children[0], TemplateNode::Expression(e) if e.expression.starts_with('`')));
    }

    #[test]
    fn test_comment_with_apostrophe_in_expression() {
        parse_ok(
            r#"<div onclick={() => {
    // it's a comment with a } brace
    /* and "another" one } */
    console.log('clicked');
}}></div>"#,
        );
    }

    #[test]
    fn test_parse_comment() {
        let doc = parse_ok("<!-- <A class=\"x\"/> -->");
        assert!(matches!(
            &doc.fragment.nodes[0],
            TemplateNode::Comment(c) if c.data == " <A class=\"x\"/> "
        ));
    }

    #[test]
    fn test_void_elements() {
        let doc = parse_ok("<div><br><img src=\"a.png\"><Input class=\"x\"></Input></div>");
        let TemplateNode::Element(div) = &doc.fragment.nodes[0] else {
            panic!("Expected Element");
        };
        assert_eq!(div.children.len(), 3);
        assert!(matches!(&div.children[2], TemplateNode::Component(c) if c.name == "Input"));
    }

    #[test]
    fn test_svelte_component_elements() {
        let doc = parse_ok("<svelte:component this={A} class=\"x\"/><svelte:self class=\"y\"/>");
        let kinds: Vec<_> = doc
            .fragment
            .nodes
            .iter()
            .filter_map(|n| match n {
                TemplateNode::SvelteElement(e) => Some(e.kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![SvelteElementKind::Component, SvelteElementKind::Self_]
        );
    }

    #[test]
    fn test_custom_property_attribute() {
        let doc = parse_ok("<Slider --track-color=\"red\" class=\"x\"/>");
        let component = first_component(&doc);
        assert_eq!(component.attributes[0].name(), Some("--track-color"));
    }

    #[test]
    fn test_error_unclosed_component() {
        let result = parse("<div><Span></div>");
        assert!(matches!(
            &result.errors[0].kind,
            ParseErrorKind::MismatchedClosingTag { expected, found }
                if expected == "Span" && found == "div"
        ));
    }

    fn element_names(nodes: &[TemplateNode]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|node| match node {
                TemplateNode::Element(e) => Some(format!(
                    "{}[{}]",
                    e.name,
                    element_names(&e.children).join(",")
                )),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_sibling_implies_closing_tag() {
        let doc = parse_ok("<ul><li>a<li>b</ul>");
        assert_eq!(element_names(&doc.fragment.nodes), vec!["ul[li[],li[]]"]);

        let doc = parse_ok("<p>a<div>b</div>");
        assert_eq!(element_names(&doc.fragment.nodes), vec!["p[]", "div[]"]);

        let doc = parse_ok("<table><tr><td>1<td>2<tr><td>3</table>");
        assert_eq!(
            element_names(&doc.fragment.nodes),
            vec!["table[tr[td[],td[]],tr[td[]]]"]
        );
    }

    #[test]
    fn test_implied_element_span_ends_at_next_tag() {
        let doc = parse_ok("<ul><li>a<li>b</ul>");
        let TemplateNode::Element(ul) = &doc.fragment.nodes[0] else {
            panic!("Expected Element");
        };
        assert_eq!(ul.children[0].span().range(), 4..9);
        assert_eq!(ul.children[1].span().range(), 9..14);
        assert_eq!(ul.span.range(), 0..19);
    }

    #[test]
    fn test_parent_closing_tag_closes_open_elements() {
        let doc = parse_ok("<div><span><b>x</div><A class=\"y\"/>");
        assert_eq!(element_names(&doc.fragment.nodes), vec!["div[span[b[]]]"]);
        assert!(matches!(&doc.fragment.nodes[1], TemplateNode::Component(c) if c.name == "A"));
    }

    #[test]
    fn test_implied_close_does_not_cross_components_or_blocks() {
        assert!(!parse("<ul><Item><li>a</ul>").errors.is_empty());
        assert!(!parse("<ul>{#if a}<li>b</ul>").errors.is_empty());
        // the block is not a parent element
        let doc = parse_ok("<li>a{#if b}<li>c</li>{/if}</li>");
        assert_eq!(element_names(&doc.fragment.nodes), vec!["li[]"]);
    }

    #[test]
    fn test_textarea_content_is_text() {
        let doc = parse_ok("<textarea>{value}<A class=\"y\"/></textarea>");
        let TemplateNode::Element(textarea) = &doc.fragment.nodes[0] else {
            panic!("Expected Element");
        };
        assert_eq!(textarea.children.len(), 2);
        assert!(matches!(
            &textarea.children[0],
            TemplateNode::Expression(e) if e.expression == "value"
        ));
        assert!(matches!(
            &textarea.children[1],
            TemplateNode::Text(t) if t.data == "<A class=\"y\"/>"
        ));
    }

    #[test]
    fn test_unterminated_textarea_expression() {
        let result = parse("<textarea>{a</textarea>");
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::UnexpectedEof { .. })));
    }

    #[test]
    fn test_error_unclosed_block() {
        let result = parse("{#if a}<p>x</p>");
        assert!(matches!(
            result.errors.last().map(|e| &e.kind),
            Some(ParseErrorKind::UnclosedBlock { block_type }) if block_type == "if"
        ));
    }

    #[test]
    fn test_error_invalid_branch() {
        let result = parse("{#each a as b}x{:then}y{/each}");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            ParseErrorKind::InvalidBlockSyntax { .. }
        ));
    }

    #[test]
    fn test_error_unterminated_expression() {
        let result = parse("<A class={open(");
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e.kind, ParseErrorKind::UnexpectedEof { .. })));
    }

    #[test]
    fn test_error_stray_closing_tag() {
        let result = parse("text</p>");
        assert!(matches!(
            &result.errors[0].kind,
            ParseErrorKind::UnexpectedClosingTag { tag_name } if tag_name == "p"
        ));
    }

    #[test]
    fn test_find_closing() {
        assert_eq!(find_closing("a}", 0, b'}'), Some(1));
        assert_eq!(find_closing("'}'}", 0, b'}'), Some(3));
        assert_eq!(find_closing("f({a: [1]})}", 0, b'}'), Some(11));
        assert_eq!(find_closing("`${'}'}`}", 0, b'}'), Some(8));
        assert_eq!(find_closing("x // }\n}", 0, b'}'), Some(7));
        assert_eq!(find_closing("{", 0, b'}'), None);
    }
}
