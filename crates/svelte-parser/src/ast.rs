//! AST types for Svelte markup.
//!
//! Offsets in every span are byte offsets into the text that was parsed.

use smol_str::SmolStr;
use source_map::Span;

/// A complete Svelte document.
#[derive(Debug, Clone, Default)]
pub struct SvelteDocument {
    /// The module-level script (`<script module>` / `context="module"`).
    pub module_script: Option<Script>,
    /// The instance script (`<script>`).
    pub instance_script: Option<Script>,
    /// The top-level style block (`<style>`).
    pub style: Option<Style>,
    /// The template fragment.
    pub fragment: Fragment,
    /// The span of the entire document.
    pub span: Span,
}

/// A top-level script block.
#[derive(Debug, Clone)]
pub struct Script {
    /// The span of the entire script block including tags.
    pub span: Span,
    /// The span of just the script content.
    pub content_span: Span,
    /// The raw content of the script.
    pub content: String,
    /// The script language.
    pub lang: ScriptLang,
    /// The script context.
    pub context: ScriptContext,
    /// Attributes on the script tag.
    pub attributes: Vec<Attribute>,
}

/// The language of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptLang {
    /// JavaScript (default).
    #[default]
    JavaScript,
    /// TypeScript.
    TypeScript,
}

/// The context of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptContext {
    /// Default instance context.
    #[default]
    Default,
    /// Module context.
    Module,
}

/// The top-level style block.
#[derive(Debug, Clone)]
pub struct Style {
    /// The span of the entire style block including tags.
    pub span: Span,
    /// The span of just the style content.
    pub content_span: Span,
    /// The raw content of the style.
    pub content: String,
    /// Attributes on the style tag.
    pub attributes: Vec<Attribute>,
}

/// A sequence of template nodes.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    /// The child nodes.
    pub nodes: Vec<TemplateNode>,
    /// The span of the fragment.
    pub span: Span,
}

/// A node in the template.
#[derive(Debug, Clone)]
pub enum TemplateNode {
    /// An HTML element.
    Element(Element),
    /// A component usage (`<Button>`, `<Tooltip.Root>`).
    Component(Component),
    /// A special Svelte element (`svelte:*`).
    SvelteElement(SvelteElement),
    /// Text content.
    Text(Text),
    /// A comment.
    Comment(Comment),
    /// An expression `{expr}`.
    Expression(ExpressionTag),
    /// A special tag such as `{@html expr}`.
    Tag(SpecialTag),
    /// A logic block such as `{#if}` or `{#each}`.
    Block(Block),
}

impl TemplateNode {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Element(n) => n.span,
            TemplateNode::Component(n) => n.span,
            TemplateNode::SvelteElement(n) => n.span,
            TemplateNode::Text(n) => n.span,
            TemplateNode::Comment(n) => n.span,
            TemplateNode::Expression(n) => n.span,
            TemplateNode::Tag(n) => n.span,
            TemplateNode::Block(n) => n.span,
        }
    }

    /// Returns the direct children of this node, in source order.
    pub fn children(&self) -> Box<dyn Iterator<Item = &TemplateNode> + '_> {
        match self {
            TemplateNode::Element(n) => Box::new(n.children.iter()),
            TemplateNode::Component(n) => Box::new(n.children.iter()),
            TemplateNode::SvelteElement(n) => Box::new(n.children.iter()),
            TemplateNode::Block(block) => Box::new(
                block
                    .body
                    .nodes
                    .iter()
                    .chain(block.branches.iter().flat_map(|b| b.body.nodes.iter())),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }
}

/// Calls `enter` for every node in `nodes` and their descendants, parents
/// before children.
pub fn walk<'a>(nodes: &'a [TemplateNode], enter: &mut impl FnMut(&'a TemplateNode)) {
    for node in nodes {
        walk_node(node, enter);
    }
}

fn walk_node<'a>(node: &'a TemplateNode, enter: &mut impl FnMut(&'a TemplateNode)) {
    enter(node);
    for child in node.children() {
        walk_node(child, enter);
    }
}

/// An HTML element.
#[derive(Debug, Clone)]
pub struct Element {
    /// The span of the element.
    pub span: Span,
    /// The tag name.
    pub name: SmolStr,
    /// The attributes.
    pub attributes: Vec<Attribute>,
    /// The child nodes.
    pub children: Vec<TemplateNode>,
    /// Whether this is a self-closing tag.
    pub self_closing: bool,
}

/// A component usage.
#[derive(Debug, Clone)]
pub struct Component {
    /// The span of the component.
    pub span: Span,
    /// The component name.
    pub name: SmolStr,
    /// The attributes/props.
    pub attributes: Vec<Attribute>,
    /// The child nodes (slot content).
    pub children: Vec<TemplateNode>,
    /// Whether this is a self-closing tag.
    pub self_closing: bool,
}

/// A special Svelte element (`svelte:*`).
#[derive(Debug, Clone)]
pub struct SvelteElement {
    /// The span of the element.
    pub span: Span,
    /// The kind of special element.
    pub kind: SvelteElementKind,
    /// The attributes.
    pub attributes: Vec<Attribute>,
    /// The child nodes.
    pub children: Vec<TemplateNode>,
}

/// The kind of special Svelte element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvelteElementKind {
    /// `<svelte:self>`
    Self_,
    /// `<svelte:component>`
    Component,
    /// `<svelte:element>`
    Element,
    /// `<svelte:window>`
    Window,
    /// `<svelte:document>`
    Document,
    /// `<svelte:body>`
    Body,
    /// `<svelte:head>`
    Head,
    /// `<svelte:options>`
    Options,
    /// `<svelte:fragment>`
    Fragment,
    /// `<svelte:boundary>`
    Boundary,
}

impl SvelteElementKind {
    /// Resolves the part after `svelte:`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "self" => Self::Self_,
            "component" => Self::Component,
            "element" => Self::Element,
            "window" => Self::Window,
            "document" => Self::Document,
            "body" => Self::Body,
            "head" => Self::Head,
            "options" => Self::Options,
            "fragment" => Self::Fragment,
            "boundary" => Self::Boundary,
            _ => return None,
        })
    }

    /// Returns true for the kinds that instantiate a component.
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Self_ | Self::Component)
    }
}

/// Text content.
#[derive(Debug, Clone)]
pub struct Text {
    /// The span of the text.
    pub span: Span,
    /// The raw text.
    pub data: String,
}

/// A comment.
#[derive(Debug, Clone)]
pub struct Comment {
    /// The span of the comment.
    pub span: Span,
    /// The comment content (without `<!--` and `-->`).
    pub data: String,
}

/// An expression tag `{expr}`.
#[derive(Debug, Clone)]
pub struct ExpressionTag {
    /// The span of the tag.
    pub span: Span,
    /// The span of just the expression.
    pub expression_span: Span,
    /// The raw expression text.
    pub expression: String,
}

/// A special tag `{@kind expr}`.
#[derive(Debug, Clone)]
pub struct SpecialTag {
    /// The span of the tag.
    pub span: Span,
    /// Which tag this is.
    pub kind: SpecialTagKind,
    /// The span of the text after the keyword.
    pub expression_span: Span,
    /// The raw text after the keyword.
    pub expression: String,
}

/// The keyword of a special tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialTagKind {
    /// `{@html}`
    Html,
    /// `{@const}`
    Const,
    /// `{@debug}`
    Debug,
    /// `{@render}`
    Render,
}

impl SpecialTagKind {
    /// Resolves a tag keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "html" => Self::Html,
            "const" => Self::Const,
            "debug" => Self::Debug,
            "render" => Self::Render,
            _ => return None,
        })
    }
}

/// A logic block: `{#kind expression}body{:branch}...{/kind}`.
#[derive(Debug, Clone)]
pub struct Block {
    /// The span of the entire block.
    pub span: Span,
    /// Which block this is.
    pub kind: BlockKind,
    /// The span of the header expression.
    pub expression_span: Span,
    /// The raw header expression.
    pub expression: String,
    /// Content before the first continuation tag.
    pub body: Fragment,
    /// `{:else}`, `{:else if}`, `{:then}` and `{:catch}` branches in order.
    pub branches: Vec<BlockBranch>,
}

/// The keyword of a logic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `{#if}`
    If,
    /// `{#each}`
    Each,
    /// `{#await}`
    Await,
    /// `{#key}`
    Key,
    /// `{#snippet}`
    Snippet,
}

impl BlockKind {
    /// Resolves a block keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "if" => Self::If,
            "each" => Self::Each,
            "await" => Self::Await,
            "key" => Self::Key,
            "snippet" => Self::Snippet,
            _ => return None,
        })
    }

    /// Returns the keyword used in source.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Each => "each",
            Self::Await => "await",
            Self::Key => "key",
            Self::Snippet => "snippet",
        }
    }

    /// Returns true if `branch` may continue a block of this kind.
    pub fn accepts(&self, branch: BranchKind) -> bool {
        matches!(
            (self, branch),
            (Self::If, BranchKind::Else | BranchKind::ElseIf)
                | (Self::Each, BranchKind::Else)
                | (Self::Await, BranchKind::Then | BranchKind::Catch)
        )
    }
}

/// A continuation branch of a block.
#[derive(Debug, Clone)]
pub struct BlockBranch {
    /// The span from the continuation tag to the end of its content.
    pub span: Span,
    /// Which continuation this is.
    pub kind: BranchKind,
    /// The raw text after the keyword (condition, binding name, ...).
    pub expression: String,
    /// The branch content.
    pub body: Fragment,
}

/// The keyword of a block continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    /// `{:else}`
    Else,
    /// `{:else if}`
    ElseIf,
    /// `{:then}`
    Then,
    /// `{:catch}`
    Catch,
}

/// An attribute on an element or component.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A normal attribute or directive: `name`, `name="value"`, `name={expr}`.
    Normal(NormalAttribute),
    /// A spread attribute `{...obj}`.
    Spread(SpreadAttribute),
    /// A shorthand attribute `{value}`.
    Shorthand(ShorthandAttribute),
    /// An attach attribute `{@attach expr}`.
    Attach(AttachAttribute),
}

impl Attribute {
    /// Returns the span of this attribute.
    pub fn span(&self) -> Span {
        match self {
            Attribute::Normal(a) => a.span,
            Attribute::Spread(a) => a.span,
            Attribute::Shorthand(a) => a.span,
            Attribute::Attach(a) => a.span,
        }
    }

    /// Returns the attribute name, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Normal(a) => Some(&a.name),
            Attribute::Shorthand(a) => Some(&a.name),
            Attribute::Spread(_) | Attribute::Attach(_) => None,
        }
    }
}

/// A normal attribute.
#[derive(Debug, Clone)]
pub struct NormalAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The attribute name, including any directive prefix and modifiers.
    pub name: SmolStr,
    /// The attribute value.
    pub value: AttributeValue,
}

/// An attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// No value (boolean attribute).
    True,
    /// A literal value, quoted or not.
    Text(TextValue),
    /// An expression value `{expr}`.
    Expression(ExpressionValue),
    /// A quoted mix of text and expressions.
    Concat(Vec<AttributeValuePart>),
}

impl AttributeValue {
    /// Returns the leading literal chunk of the value, if it starts with one.
    pub fn leading_text(&self) -> Option<&TextValue> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Concat(parts) => match parts.first() {
                Some(AttributeValuePart::Text(text)) => Some(text),
                _ => None,
            },
            AttributeValue::True | AttributeValue::Expression(_) => None,
        }
    }
}

/// A part of a concatenated attribute value.
#[derive(Debug, Clone)]
pub enum AttributeValuePart {
    /// A text part.
    Text(TextValue),
    /// An expression part.
    Expression(ExpressionValue),
}

/// A literal chunk of an attribute value.
#[derive(Debug, Clone)]
pub struct TextValue {
    /// The span of the raw text (inside the quotes).
    pub span: Span,
    /// The raw text, undecoded.
    pub raw: String,
}

/// An expression in an attribute value.
#[derive(Debug, Clone)]
pub struct ExpressionValue {
    /// The span including braces.
    pub span: Span,
    /// The span of just the expression content.
    pub expression_span: Span,
    /// The raw expression text.
    pub expression: String,
}

/// A spread attribute `{...obj}`.
#[derive(Debug, Clone)]
pub struct SpreadAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The expression being spread.
    pub expression: String,
}

/// An attach attribute `{@attach expr}`.
#[derive(Debug, Clone)]
pub struct AttachAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The attachment expression.
    pub expression: String,
}

/// A shorthand attribute `{value}`.
#[derive(Debug, Clone)]
pub struct ShorthandAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The name (and expression).
    pub name: SmolStr,
}
