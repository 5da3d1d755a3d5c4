//! AST types for component blocks and template markup.

use smol_str::SmolStr;
use source_map::Span;

/// The role of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BlockKind {
    Template,
    Script,
    /// `<style>`, `<i18n>` and any other custom block.
    Other,
}

/// A named top-level region of the component source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Block {
    pub kind: BlockKind,
    /// The tag name as written (`template`, `script`, `style`, ...).
    pub tag: SmolStr,
    /// Value of the `lang` attribute.
    pub lang: Option<SmolStr>,
    /// The whole block, tags included.
    pub span: Span,
    /// `<script setup lang="ts">`
    pub open_tag: Span,
    /// `</script>`; `None` for self-closing or unterminated blocks.
    pub close_tag: Option<Span>,
    /// The text between the tags.
    pub content_span: Span,
    pub content: String,
    pub attributes: Vec<BlockAttribute>,
    /// At most one script block carries this flag.
    pub is_main_script: bool,
}

impl Block {
    /// Looks up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&BlockAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Whether the block has a `setup` marker attribute.
    pub fn is_setup(&self) -> bool {
        self.kind == BlockKind::Script && self.attribute("setup").is_some()
    }

    /// Whether the block is written in a typed dialect.
    pub fn is_typed(&self) -> bool {
        matches!(self.lang.as_deref(), Some("ts" | "tsx"))
    }

    /// Whether the block's source lives in another file.
    pub fn is_external(&self) -> bool {
        self.attribute("src").is_some()
    }
}

/// An attribute on a block's opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockAttribute {
    pub name: SmolStr,
    pub name_span: Span,
    pub span: Span,
    pub value: Option<TextValue>,
}

impl BlockAttribute {
    pub fn value_str(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.value.as_str())
    }
}

/// Literal text with the span of the text itself (quotes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextValue {
    pub value: String,
    pub span: Span,
}

/// A script-language expression embedded in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Expression {
    pub content: String,
    pub span: Span,
}

impl Expression {
    /// The expression with surrounding whitespace removed, and its span.
    pub fn trimmed(&self) -> Expression {
        let leading = self.content.len() - self.content.trim_start().len();
        let content = self.content.trim();
        let start = self.span.lo() + leading as u32;
        Expression {
            content: content.to_string(),
            span: Span::new(start, start + content.len() as u32),
        }
    }
}

/// A node of the template tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TemplateNode {
    Element(Element),
    Text(Text),
    Interpolation(Interpolation),
    Comment(Comment),
}

impl TemplateNode {
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Element(e) => e.span,
            TemplateNode::Text(t) => t.span,
            TemplateNode::Interpolation(i) => i.span,
            TemplateNode::Comment(c) => c.span,
        }
    }

    /// Whether this node is whitespace-only text.
    pub fn is_whitespace(&self) -> bool {
        matches!(self, TemplateNode::Text(t) if t.data.trim().is_empty())
    }
}

/// An element or component.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Element {
    pub span: Span,
    pub name: SmolStr,
    pub name_span: Span,
    /// From `<` through `>` (or `/>`).
    pub start_tag: Span,
    /// `</div>`; `None` for void, self-closing or unclosed elements.
    pub end_tag: Option<Span>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<TemplateNode>,
    pub self_closing: bool,
}

impl Element {
    /// Finds a directive by name (`if`, `for`, `slot`, ...).
    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Directive(d) if d.name == name => Some(d),
            _ => None,
        })
    }

    /// Finds a static attribute by name.
    pub fn static_attribute(&self, name: &str) -> Option<&StaticAttribute> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Static(a) if a.name == name => Some(a),
            _ => None,
        })
    }

    /// The span of the element's name inside its end tag.
    pub fn end_name_span(&self) -> Option<Span> {
        self.end_tag.map(|tag| {
            let start = tag.lo() + 2;
            Span::new(start, start + self.name.len() as u32)
        })
    }
}

/// Raw text between tags.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Text {
    pub span: Span,
    pub data: String,
}

/// `{{ expression }}`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Interpolation {
    pub span: Span,
    pub expression: Expression,
}

/// `<!-- data -->`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    pub span: Span,
    pub data: String,
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Attribute {
    Static(StaticAttribute),
    Directive(Directive),
}

impl Attribute {
    pub fn span(&self) -> Span {
        match self {
            Attribute::Static(a) => a.span,
            Attribute::Directive(d) => d.span,
        }
    }
}

/// `name="value"` or a bare `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StaticAttribute {
    pub span: Span,
    pub name: SmolStr,
    pub name_span: Span,
    pub value: Option<TextValue>,
}

/// `v-name:arg.modifier="value"` and its `:`, `@`, `#` shorthands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Directive {
    pub span: Span,
    /// Normalized name without the `v-` prefix (`bind`, `on`, `slot`, `model`, ...).
    pub name: SmolStr,
    /// The attribute name as written, e.g. `@click.stop`.
    pub name_span: Span,
    pub arg: Option<DirectiveArg>,
    pub modifiers: Vec<SmolStr>,
    pub value: Option<Expression>,
}

/// A directive argument.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DirectiveArg {
    Static { name: SmolStr, span: Span },
    /// `[expr]`; the expression span excludes the brackets.
    Dynamic(Expression),
}

impl DirectiveArg {
    pub fn static_name(&self) -> Option<&str> {
        match self {
            DirectiveArg::Static { name, .. } => Some(name),
            DirectiveArg::Dynamic(_) => None,
        }
    }
}
