//! Template markup reader.
//!
//! Produces element, text, interpolation and comment nodes with absolute
//! spans. There is no HTML tree construction here: elements nest exactly as
//! written, except for void elements, and mismatched tags are reported and
//! recovered from.

use crate::ast::{
    Attribute, Block, Comment, Directive, DirectiveArg, Element, Expression, Interpolation,
    StaticAttribute, TemplateNode, Text,
};
use crate::error::{ParseError, ParseErrorKind};
use crate::tag::{read_start_tag, read_tag_name, RawAttribute};
use smol_str::SmolStr;
use source_map::Span;

/// The result of reading a template block.
#[derive(Debug, Default)]
pub struct TemplateParseResult {
    pub nodes: Vec<TemplateNode>,
    pub errors: Vec<ParseError>,
}

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

/// Returns true for HTML void elements.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// Reads the content of a template block.
pub fn parse_template(source: &str, block: &Block) -> TemplateParseResult {
    parse_fragment(
        source,
        block.content_span.lo() as usize,
        block.content_span.hi() as usize,
    )
}

/// Reads `source[start..end]` as template markup.
pub fn parse_fragment(source: &str, start: usize, end: usize) -> TemplateParseResult {
    let mut parser = TemplateParser {
        source,
        pos: start,
        end: end.min(source.len()),
        stack: Vec::new(),
        errors: Vec::new(),
    };
    let (nodes, _) = parser.parse_children();
    tracing::trace!(nodes = nodes.len(), errors = parser.errors.len(), "parsed template");
    TemplateParseResult {
        nodes,
        errors: parser.errors,
    }
}

struct TemplateParser<'src> {
    source: &'src str,
    pos: usize,
    end: usize,
    /// Names of the currently open elements, outermost first.
    stack: Vec<SmolStr>,
    errors: Vec<ParseError>,
}

impl<'src> TemplateParser<'src> {
    fn rest(&self) -> &'src str {
        self.source.get(self.pos..self.end).unwrap_or_default()
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    /// Reads nodes until the close tag of the innermost open element.
    ///
    /// Returns the close tag span when it was found.
    fn parse_children(&mut self) -> (Vec<TemplateNode>, Option<Span>) {
        let mut nodes = Vec::new();

        while self.pos < self.end {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                nodes.push(self.parse_comment());
            } else if rest.starts_with("</") {
                let start = self.pos;
                let name = read_tag_name(self.source, start + 2).unwrap_or_default();
                let close_end = self.source[start..self.end]
                    .find('>')
                    .map_or(self.end, |i| start + i + 1);
                let close = Span::from_usize(start, close_end);

                if self.stack.last().is_some_and(|open| open == name) {
                    self.pos = close_end;
                    return (nodes, Some(close));
                }
                if self.stack.iter().any(|open| open == name) {
                    // Closes an ancestor; the current element is left unclosed.
                    return (nodes, None);
                }
                self.error(
                    ParseErrorKind::UnexpectedClosingTag {
                        tag_name: name.to_string(),
                    },
                    close,
                );
                self.pos = close_end;
            } else if rest.starts_with("{{") {
                nodes.push(self.parse_interpolation());
            } else if rest.starts_with('<') && read_tag_name(self.source, self.pos + 1).is_some() {
                nodes.push(self.parse_element());
            } else {
                nodes.push(self.parse_text());
            }
        }

        (nodes, None)
    }

    fn parse_comment(&mut self) -> TemplateNode {
        let start = self.pos;
        let data_start = start + 4;
        let (data_end, end) = match self.source[data_start..self.end].find("-->") {
            Some(i) => (data_start + i, data_start + i + 3),
            None => {
                self.error(
                    ParseErrorKind::UnterminatedComment,
                    Span::from_usize(start, self.end),
                );
                (self.end, self.end)
            }
        };
        self.pos = end;
        TemplateNode::Comment(Comment {
            span: Span::from_usize(start, end),
            data: self.source[data_start..data_end].to_string(),
        })
    }

    fn parse_interpolation(&mut self) -> TemplateNode {
        let start = self.pos;
        let expr_start = start + 2;
        let (expr_end, end) = match self.source[expr_start..self.end].find("}}") {
            Some(i) => (expr_start + i, expr_start + i + 2),
            None => {
                self.error(
                    ParseErrorKind::UnterminatedInterpolation,
                    Span::from_usize(start, self.end),
                );
                (self.end, self.end)
            }
        };
        self.pos = end;
        TemplateNode::Interpolation(Interpolation {
            span: Span::from_usize(start, end),
            expression: Expression {
                content: self.source[expr_start..expr_end].to_string(),
                span: Span::from_usize(expr_start, expr_end),
            },
        })
    }

    fn parse_text(&mut self) -> TemplateNode {
        let start = self.pos;
        let mut cursor = start + self.rest().chars().next().map_or(1, char::len_utf8);
        while cursor < self.end {
            let rest = &self.source[cursor..self.end];
            let Some(i) = rest.find(['<', '{']) else {
                cursor = self.end;
                break;
            };
            cursor += i;
            let at = &self.source[cursor..self.end];
            let starts_node = at.starts_with("{{")
                || at.starts_with("<!--")
                || at.starts_with("</")
                || (at.starts_with('<') && read_tag_name(self.source, cursor + 1).is_some());
            if starts_node {
                break;
            }
            cursor += 1;
        }
        self.pos = cursor;
        TemplateNode::Text(Text {
            span: Span::from_usize(start, cursor),
            data: self.source[start..cursor].to_string(),
        })
    }

    fn parse_element(&mut self) -> TemplateNode {
        let start = self.pos;
        let name = read_tag_name(self.source, start + 1).unwrap_or_default();
        let name_span = Span::from_usize(start + 1, start + 1 + name.len());
        let tag = read_start_tag(self.source, name_span.hi() as usize, name, &mut self.errors);
        let tag_end = tag.end.min(self.end);
        let start_tag = Span::from_usize(start, tag_end);
        let attributes = tag
            .attributes
            .into_iter()
            .map(|raw| self.classify_attribute(raw))
            .collect();
        let name = SmolStr::new(name);
        self.pos = tag_end;

        let mut element = Element {
            span: start_tag,
            name,
            name_span,
            start_tag,
            end_tag: None,
            attributes,
            children: Vec::new(),
            self_closing: tag.self_closing,
        };

        if tag.self_closing || !tag.terminated || is_void_element(&element.name) {
            return TemplateNode::Element(element);
        }

        if RAW_TEXT_ELEMENTS.contains(&element.name.as_str()) {
            self.parse_raw_text(&mut element);
            return TemplateNode::Element(element);
        }

        self.stack.push(element.name.clone());
        let (children, close) = self.parse_children();
        self.stack.pop();

        element.children = children;
        match close {
            Some(close) => {
                element.end_tag = Some(close);
                element.span = Span::new(element.span.start, close.end);
            }
            None => {
                self.error(
                    ParseErrorKind::UnclosedTag {
                        tag_name: element.name.to_string(),
                    },
                    start_tag,
                );
                element.span = Span::from_usize(start, self.pos);
            }
        }
        TemplateNode::Element(element)
    }

    fn parse_raw_text(&mut self, element: &mut Element) {
        let content_start = self.pos;
        let needle = format!("</{}", element.name);
        let content_end = self.source[content_start..self.end]
            .find(&needle)
            .map_or(self.end, |i| content_start + i);
        if content_end > content_start {
            element.children.push(TemplateNode::Text(Text {
                span: Span::from_usize(content_start, content_end),
                data: self.source[content_start..content_end].to_string(),
            }));
        }
        if content_end == self.end {
            self.error(
                ParseErrorKind::UnclosedTag {
                    tag_name: element.name.to_string(),
                },
                element.start_tag,
            );
            self.pos = self.end;
            element.span = Span::from_usize(element.span.lo() as usize, self.end);
            return;
        }
        let close_end = self.source[content_end..self.end]
            .find('>')
            .map_or(self.end, |i| content_end + i + 1);
        let close = Span::from_usize(content_end, close_end);
        element.end_tag = Some(close);
        element.span = Span::new(element.span.start, close.end);
        self.pos = close_end;
    }

    fn classify_attribute(&mut self, raw: RawAttribute) -> Attribute {
        match parse_directive_name(&raw.name, raw.name_span) {
            Some(parsed) => Attribute::Directive(Directive {
                span: raw.span,
                name: parsed.name,
                name_span: raw.name_span,
                arg: parsed.arg,
                modifiers: parsed.modifiers,
                value: raw.value.map(|v| Expression {
                    content: v.value,
                    span: v.span,
                }),
            }),
            None => Attribute::Static(StaticAttribute {
                span: raw.span,
                name: raw.name,
                name_span: raw.name_span,
                value: raw.value,
            }),
        }
    }
}

struct DirectiveName {
    name: SmolStr,
    arg: Option<DirectiveArg>,
    modifiers: Vec<SmolStr>,
}

/// Splits a directive attribute name into name, argument and modifiers.
///
/// Returns `None` for plain attributes.
fn parse_directive_name(raw: &str, span: Span) -> Option<DirectiveName> {
    let base = span.lo();
    let (name, rest, rest_offset, mut modifiers) = if let Some(rest) = raw.strip_prefix("v-") {
        let split = rest.find([':', '.']).unwrap_or(rest.len());
        let name = &rest[..split];
        if name.is_empty() {
            return None;
        }
        let after = &rest[split..];
        match after.strip_prefix(':') {
            Some(arg) => (SmolStr::new(name), arg, 2 + split + 1, Vec::new()),
            None => {
                let modifiers = split_modifiers(after);
                return Some(DirectiveName {
                    name: SmolStr::new(name),
                    arg: None,
                    modifiers,
                });
            }
        }
    } else if let Some(rest) = raw.strip_prefix(':') {
        (SmolStr::new_static("bind"), rest, 1, Vec::new())
    } else if let Some(rest) = raw.strip_prefix('.') {
        (SmolStr::new_static("bind"), rest, 1, vec![SmolStr::new_static("prop")])
    } else if let Some(rest) = raw.strip_prefix('@') {
        (SmolStr::new_static("on"), rest, 1, Vec::new())
    } else if let Some(rest) = raw.strip_prefix('#') {
        (SmolStr::new_static("slot"), rest, 1, Vec::new())
    } else {
        return None;
    };

    let arg_start = base + rest_offset as u32;
    let (arg, tail) = if let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']').unwrap_or(inner.len());
        let content = &inner[..close];
        let expr_start = arg_start + 1;
        let arg = DirectiveArg::Dynamic(Expression {
            content: content.to_string(),
            span: Span::new(expr_start, expr_start + content.len() as u32),
        });
        let tail = inner.get(close + 1..).unwrap_or_default();
        (Some(arg), tail)
    } else {
        let end = rest.find('.').unwrap_or(rest.len());
        let arg = (end > 0).then(|| DirectiveArg::Static {
            name: SmolStr::new(&rest[..end]),
            span: Span::new(arg_start, arg_start + end as u32),
        });
        (arg, &rest[end..])
    };
    modifiers.extend(split_modifiers(tail));

    Some(DirectiveName {
        name,
        arg,
        modifiers,
    })
}

fn split_modifiers(tail: &str) -> Vec<SmolStr> {
    tail.split('.')
        .filter(|m| !m.is_empty())
        .map(SmolStr::new)
        .collect()
}
