//! The parsed markup tree consumed by the projection.
//!
//! These nodes are produced by an external markup parser. Only elements,
//! components and their attributes are represented; text, expression tags and
//! control-flow blocks are left in place by the projection and need no nodes.

use smol_str::SmolStr;
use source_map::{ByteOffset, Span};
use text_size::TextSize;

/// A parsed component file.
#[derive(Debug, Clone, Default)]
pub struct MarkupDocument {
    /// The instance script (`<script>`).
    pub instance_script: Option<ScriptBlock>,
    /// The module script (`<script context="module">`).
    pub module_script: Option<ScriptBlock>,
    /// Spans of `<style>` blocks including their tags.
    pub styles: Vec<Span>,
    /// Top-level elements and components in source order.
    pub nodes: Vec<MarkupNode>,
}

/// A `<script>` block.
#[derive(Debug, Clone)]
pub struct ScriptBlock {
    /// The span of the entire block including tags.
    pub span: Span,
    /// The span of just the script content.
    pub content_span: Span,
    /// The value of the `lang` (or `type`) attribute, if any.
    pub lang: Option<SmolStr>,
}

impl ScriptBlock {
    /// Returns true if the block declares TypeScript.
    pub fn is_typescript(&self) -> bool {
        matches!(
            self.lang.as_deref(),
            Some("ts" | "typescript" | "text/typescript")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An HTML or `svelte:*` element.
    Element,
    /// A component (capitalized or dotted tag name).
    Component,
}

/// An element or component.
#[derive(Debug, Clone)]
pub struct MarkupNode {
    pub kind: NodeKind,
    /// The tag name as written.
    pub name: SmolStr,
    /// The span of the whole node, start tag through end tag.
    pub span: Span,
    /// The span between the start and end tags. `None` for self-closing tags.
    pub content_span: Option<Span>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    #[inline]
    pub fn is_component(&self) -> bool {
        self.kind == NodeKind::Component
    }

    /// Returns the text value of a plain attribute, e.g. `slot="header"`.
    pub fn text_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Normal(normal) if normal.name == name => match &normal.value {
                AttributeValue::Text(text) => Some(text.value.as_str()),
                _ => None,
            },
            _ => None,
        })
    }
}

/// An attribute on an element or component.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A plain attribute `name="value"`, `name={expr}` or `name`.
    Normal(NormalAttribute),
    /// A directive `use:action`, `bind:value`, etc.
    Directive(Directive),
}

impl Attribute {
    pub fn span(&self) -> Span {
        match self {
            Attribute::Normal(a) => a.span,
            Attribute::Directive(a) => a.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalAttribute {
    pub span: Span,
    pub name: SmolStr,
    pub value: AttributeValue,
}

#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// No value (boolean attribute).
    True,
    Text(TextValue),
    Expression(ExpressionValue),
}

/// A literal text value in an attribute.
#[derive(Debug, Clone)]
pub struct TextValue {
    /// The span of the text, without quotes.
    pub span: Span,
    pub value: String,
}

/// An expression value `{expr}` in an attribute.
#[derive(Debug, Clone)]
pub struct ExpressionValue {
    /// The span of just the expression, without braces or quotes.
    pub span: Span,
    /// The raw expression text.
    pub expression: String,
    /// The quote character around the braces, for `name="{expr}"`.
    pub quote: Option<char>,
}

/// The category of a directive, one per markup prefix family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `use:action`
    Action,
    /// `bind:prop`
    Binding,
    /// `on:event`
    EventHandler,
    /// `transition:name`, `in:name`, `out:name`
    Transition,
    /// `animate:name`
    Animation,
    /// `class:name`
    Class,
    /// `style:prop`
    Style,
    /// `let:name` (slot props)
    Let,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 8] = [
        DirectiveKind::Action,
        DirectiveKind::Binding,
        DirectiveKind::EventHandler,
        DirectiveKind::Transition,
        DirectiveKind::Animation,
        DirectiveKind::Class,
        DirectiveKind::Style,
        DirectiveKind::Let,
    ];

    /// Maps a markup prefix (the part before `:`) to its kind.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "use" => Self::Action,
            "bind" => Self::Binding,
            "on" => Self::EventHandler,
            "transition" | "in" | "out" => Self::Transition,
            "animate" => Self::Animation,
            "class" => Self::Class,
            "style" => Self::Style,
            "let" => Self::Let,
            _ => return None,
        })
    }
}

/// A directive attribute.
///
/// For `on:click|once={handler}` the spans are laid out as:
///
/// ```text
/// on:click|once={handler}
/// ^  ^    ^    ^ ^      ^
/// |  |    |    | |      span.end
/// |  |    |    | value span
/// |  |    |    head_end()
/// |  |    name_span.end
/// |  name_span.start
/// span.start
/// ```
#[derive(Debug, Clone)]
pub struct Directive {
    pub span: Span,
    pub kind: DirectiveKind,
    /// The name after the colon.
    pub name: SmolStr,
    pub name_span: Span,
    /// Modifiers after `|`, in order.
    pub modifiers: Vec<SmolStr>,
    pub value: DirectiveValue,
}

impl Directive {
    /// The offset just past the name and its modifiers.
    pub fn head_end(&self) -> ByteOffset {
        let modifiers: usize = self.modifiers.iter().map(|m| m.len() + 1).sum();
        self.name_span.end + TextSize::from(modifiers as u32)
    }

    pub fn expression(&self) -> Option<&ExpressionValue> {
        match &self.value {
            DirectiveValue::Expression(expr) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DirectiveValue {
    /// No value, e.g. `bind:value` or `on:click`.
    Shorthand,
    Expression(ExpressionValue),
    Text(TextValue),
}
