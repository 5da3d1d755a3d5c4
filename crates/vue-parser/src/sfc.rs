//! Top-level block scanner.
//!
//! Splits a component file into `<template>`, `<script>` and custom blocks.
//! Anything outside a block (whitespace, comments, stray text) is left where
//! it is and belongs to no block.

use crate::ast::{Block, BlockAttribute, BlockKind};
use crate::error::{ParseError, ParseErrorKind};
use crate::tag::{read_start_tag, read_tag_name};
use smol_str::SmolStr;
use source_map::Span;

/// Scans `source` for top-level blocks.
pub(crate) fn scan_blocks(source: &str, errors: &mut Vec<ParseError>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(rel) = source.get(pos..).and_then(|rest| rest.find('<')) {
        let start = pos + rel;
        let rest = &source[start..];

        if rest.starts_with("<!--") {
            pos = match source[start + 4..].find("-->") {
                Some(end) => start + 4 + end + 3,
                None => source.len(),
            };
            continue;
        }

        if rest.starts_with("</") {
            let name = read_tag_name(source, start + 2).unwrap_or_default();
            let end = source[start..].find('>').map_or(source.len(), |i| start + i + 1);
            errors.push(ParseError::new(
                ParseErrorKind::UnexpectedClosingTag {
                    tag_name: name.to_string(),
                },
                Span::from_usize(start, end),
            ));
            pos = end;
            continue;
        }

        let Some(name) = read_tag_name(source, start + 1) else {
            pos = start + 1;
            continue;
        };
        let name_end = start + 1 + name.len();
        let tag = read_start_tag(source, name_end, name, errors);
        if !tag.terminated {
            pos = tag.end.max(start + 1);
            continue;
        }

        let kind = match name.to_ascii_lowercase().as_str() {
            "template" => BlockKind::Template,
            "script" => BlockKind::Script,
            _ => BlockKind::Other,
        };
        let attributes: Vec<BlockAttribute> = tag
            .attributes
            .into_iter()
            .map(|attr| BlockAttribute {
                name: attr.name,
                name_span: attr.name_span,
                span: attr.span,
                value: attr.value,
            })
            .collect();
        let lang = attributes
            .iter()
            .find(|attr| attr.name == "lang")
            .and_then(|attr| attr.value_str())
            .map(SmolStr::new);
        let open_tag = Span::from_usize(start, tag.end);

        let (content_end, close_tag, end) = if tag.self_closing {
            (tag.end, None, tag.end)
        } else {
            match find_close_tag(source, tag.end, name, kind == BlockKind::Template) {
                Some((close_start, close_end)) => (
                    close_start,
                    Some(Span::from_usize(close_start, close_end)),
                    close_end,
                ),
                None => {
                    errors.push(ParseError::new(
                        ParseErrorKind::UnclosedBlock {
                            tag: name.to_string(),
                        },
                        open_tag,
                    ));
                    (source.len(), None, source.len())
                }
            }
        };

        tracing::debug!(tag = name, start, end, "found block");
        blocks.push(Block {
            kind,
            tag: SmolStr::new(name),
            lang,
            span: Span::from_usize(start, end),
            open_tag,
            close_tag,
            content_span: Span::from_usize(tag.end, content_end),
            content: source[tag.end..content_end].to_string(),
            attributes,
            is_main_script: false,
        });
        pos = end;
    }

    resolve_roles(&mut blocks, errors);
    blocks
}

/// Finds `</name>` after `from`, returning the close tag's bounds.
///
/// When `nested` is set, inner `<name>` elements are balanced and comments
/// are skipped, so a template can contain `<template>` elements.
fn find_close_tag(source: &str, from: usize, name: &str, nested: bool) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut pos = from;

    while let Some(rel) = source.get(pos..).and_then(|rest| rest.find('<')) {
        let start = pos + rel;
        let rest = &source[start..];

        if nested && rest.starts_with("<!--") {
            pos = start + 4 + source[start + 4..].find("-->")? + 3;
            continue;
        }

        if let Some(close_name) = rest
            .strip_prefix("</")
            .and_then(|_| read_tag_name(source, start + 2))
        {
            if close_name.eq_ignore_ascii_case(name) {
                if depth == 0 {
                    let end = source[start..].find('>').map_or(source.len(), |i| start + i + 1);
                    return Some((start, end));
                }
                depth -= 1;
            }
            pos = start + 2;
            continue;
        }

        if nested {
            if let Some(open_name) = read_tag_name(source, start + 1) {
                if open_name.eq_ignore_ascii_case(name) {
                    let mut scratch = Vec::new();
                    let tag = read_start_tag(source, start + 1 + open_name.len(), open_name, &mut scratch);
                    if tag.terminated && !tag.self_closing {
                        depth += 1;
                    }
                    pos = tag.end.max(start + 1);
                    continue;
                }
            }
        }

        pos = start + 1;
    }

    None
}

/// Picks the main script and demotes duplicate templates.
fn resolve_roles(blocks: &mut [Block], errors: &mut Vec<ParseError>) {
    let mut seen_template = false;
    let mut seen_setup = false;
    for block in blocks.iter_mut() {
        match block.kind {
            BlockKind::Template if seen_template => {
                errors.push(ParseError::new(
                    ParseErrorKind::DuplicateBlock {
                        tag: block.tag.to_string(),
                    },
                    block.open_tag,
                ));
                block.kind = BlockKind::Other;
            }
            BlockKind::Template => seen_template = true,
            BlockKind::Script if block.is_setup() => {
                if seen_setup {
                    errors.push(ParseError::new(
                        ParseErrorKind::DuplicateBlock {
                            tag: "script setup".to_string(),
                        },
                        block.open_tag,
                    ));
                }
                seen_setup = true;
            }
            _ => {}
        }
    }

    let main = blocks
        .iter()
        .position(|b| b.is_setup())
        .or_else(|| {
            blocks
                .iter()
                .position(|b| b.kind == BlockKind::Script && !b.is_external())
        });
    if let Some(index) = main {
        blocks[index].is_main_script = true;
    }
}
