//! Start-tag reader shared by the block scanner and the template parser.

use crate::ast::TextValue;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;
use source_map::Span;

/// An attribute as written, before directive classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawAttribute {
    pub name: SmolStr,
    pub name_span: Span,
    pub value: Option<TextValue>,
    pub span: Span,
}

/// The interior of a start tag.
#[derive(Debug)]
pub(crate) struct StartTag {
    pub attributes: Vec<RawAttribute>,
    /// Offset just past `>` or `/>`; the offset where reading stopped otherwise.
    pub end: usize,
    pub self_closing: bool,
    /// False when the tag ran into `<` or end of input.
    pub terminated: bool,
}

/// Reads a tag name (`[A-Za-z][A-Za-z0-9_.:-]*`) at `offset`.
pub(crate) fn read_tag_name(source: &str, offset: usize) -> Option<&str> {
    let rest = source.get(offset..)?;
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if !first.is_ascii_alphabetic() {
        return None;
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
        .map_or(rest.len(), |(i, _)| i);
    Some(&rest[..end])
}

/// Reads attributes from `offset` (just past the tag name) to the end of the start tag.
pub(crate) fn read_start_tag(
    source: &str,
    offset: usize,
    tag_name: &str,
    errors: &mut Vec<ParseError>,
) -> StartTag {
    let mut tokens: Vec<Token> = Vec::new();
    for token in Lexer::new(source, offset) {
        let stop = token.kind.closes_tag()
            || matches!(
                token.kind,
                TokenKind::Eof | TokenKind::LAngle | TokenKind::Unterminated
            );
        tokens.push(token);
        if stop {
            break;
        }
    }

    let mut attributes = Vec::new();
    let mut i = 0;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Name => {
                let name_span = token.span;
                let name = SmolStr::new(name_span.text(source));
                let has_value = tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::Eq);
                if !has_value {
                    attributes.push(RawAttribute {
                        name,
                        name_span,
                        value: None,
                        span: name_span,
                    });
                    i += 1;
                    continue;
                }
                let Some(value_token) = tokens.get(i + 2) else {
                    break;
                };
                let value = match value_token.kind {
                    TokenKind::DoubleQuoted | TokenKind::SingleQuoted => {
                        let inner = Span::new(value_token.span.lo() + 1, value_token.span.hi() - 1);
                        Some(TextValue {
                            value: inner.text(source).to_string(),
                            span: inner,
                        })
                    }
                    TokenKind::Name => Some(TextValue {
                        value: value_token.span.text(source).to_string(),
                        span: value_token.span,
                    }),
                    TokenKind::Unterminated => {
                        errors.push(ParseError::new(
                            ParseErrorKind::UnterminatedAttributeValue {
                                name: name.to_string(),
                            },
                            value_token.span,
                        ));
                        let inner = Span::new(value_token.span.lo() + 1, value_token.span.hi());
                        Some(TextValue {
                            value: inner.text(source).to_string(),
                            span: inner,
                        })
                    }
                    _ => {
                        errors.push(ParseError::new(
                            ParseErrorKind::InvalidAttribute {
                                message: format!(
                                    "expected a value for `{name}`, found {}",
                                    value_token.kind.name()
                                ),
                            },
                            value_token.span,
                        ));
                        attributes.push(RawAttribute {
                            name,
                            name_span,
                            value: None,
                            span: name_span,
                        });
                        i += 2;
                        continue;
                    }
                };
                attributes.push(RawAttribute {
                    name,
                    name_span,
                    value,
                    span: name_span.cover(value_token.span),
                });
                i += 3;
            }
            TokenKind::RAngle | TokenKind::SlashRAngle => {
                return StartTag {
                    attributes,
                    end: token.span.hi() as usize,
                    self_closing: token.kind == TokenKind::SlashRAngle,
                    terminated: true,
                };
            }
            TokenKind::Eof | TokenKind::LAngle | TokenKind::Unterminated => break,
            TokenKind::Eq | TokenKind::Slash | TokenKind::DoubleQuoted
            | TokenKind::SingleQuoted | TokenKind::Error => {
                errors.push(ParseError::new(
                    ParseErrorKind::InvalidAttribute {
                        message: format!("unexpected {}", token.kind.name()),
                    },
                    token.span,
                ));
                i += 1;
            }
        }
    }

    let end = tokens
        .last()
        .map_or(source.len(), |t| match t.kind {
            TokenKind::LAngle => t.span.lo() as usize,
            _ => t.span.hi() as usize,
        });
    errors.push(ParseError::new(
        ParseErrorKind::UnterminatedStartTag {
            tag_name: tag_name.to_string(),
        },
        Span::from_usize(offset, end),
    ));
    StartTag {
        attributes,
        end,
        self_closing: false,
        terminated: false,
    }
}
