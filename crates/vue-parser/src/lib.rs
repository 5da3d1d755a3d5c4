//! Vue single-file component parser.
//!
//! This crate provides:
//! - The block scanner that splits a component into template, script and
//!   custom blocks
//! - A template markup reader producing an element tree with directive
//!   attributes
//! - Script and expression parsing glue over `swc_ecma_parser`
//!
//! Every span is an absolute byte range into the component source.
//!
//! # Example
//!
//! ```
//! use vue_parser::parse;
//!
//! let source = r#"
//! <script setup lang="ts">
//! const count = ref(0)
//! </script>
//!
//! <template>
//!   <button @click="count++">{{ count }}</button>
//! </template>
//! "#;
//!
//! let result = parse(source);
//! assert!(result.errors.is_empty());
//! assert_eq!(result.blocks.len(), 2);
//! ```

mod ast;
mod error;
mod lexer;
mod script;
mod sfc;
mod tag;
mod template;

pub use ast::*;
pub use error::{ParseError, ParseErrorKind};
pub use lexer::{Lexer, Token, TokenKind};
pub use script::{
    has_top_level_await, item_has_top_level_await, parse_expression, parse_params, parse_script, syntax_for,
    ParsedExpression, ParsedParams, ScriptAst, SpanConverter,
};
pub use source_map::{PatchBuffer, Span};
pub use template::{is_void_element, parse_fragment, parse_template, TemplateParseResult};

/// Filename used when none is given.
pub const DEFAULT_FILENAME: &str = "anonymous.vue";

/// Options for parsing component files.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// The component's filename.
    pub filename: Option<String>,
}

/// The result of parsing a component file.
#[derive(Debug)]
pub struct SfcParseResult {
    pub filename: String,
    /// Blocks in source order.
    pub blocks: Vec<Block>,
    /// Overlay buffer seeded with the whole source.
    pub buffer: PatchBuffer,
    /// The main script's `generic` attribute.
    pub generic: Option<String>,
    /// Whether the main script awaits at top level.
    pub is_async: bool,
    /// The parsed main script, when it parsed.
    pub script: Option<ScriptAst>,
    /// Block structure and script syntax errors.
    pub errors: Vec<ParseError>,
}

impl SfcParseResult {
    /// The main script block.
    pub fn main_script(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.is_main_script)
    }

    /// The index of the main script block.
    pub fn main_script_index(&self) -> Option<usize> {
        self.blocks.iter().position(|b| b.is_main_script)
    }

    /// The first template block.
    pub fn template(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == BlockKind::Template)
    }

    /// The component source.
    pub fn source(&self) -> &str {
        self.buffer.original()
    }
}

/// Parses a component file.
///
/// Never fails: structural problems are reported in
/// [`SfcParseResult::errors`] and the rest of the file is still parsed.
pub fn parse(source: &str) -> SfcParseResult {
    parse_with_options(source, ParseOptions::default())
}

/// Parses a component file with custom options.
pub fn parse_with_options(source: &str, options: ParseOptions) -> SfcParseResult {
    let filename = options
        .filename
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let mut errors = Vec::new();
    let blocks = sfc::scan_blocks(source, &mut errors);

    let main = blocks.iter().find(|b| b.is_main_script);
    let generic = main
        .and_then(|b| b.attribute("generic"))
        .and_then(|attr| attr.value_str())
        .map(str::to_string);

    let script = main.and_then(|block| {
        match parse_script(&block.content, block.lang.as_deref(), block.content_span.lo()) {
            Ok(ast) => {
                errors.extend(ast.errors.iter().cloned());
                Some(ast)
            }
            Err(error) => {
                tracing::debug!(%error, "main script failed to parse");
                errors.push(error);
                None
            }
        }
    });
    let is_async = script
        .as_ref()
        .is_some_and(|ast| has_top_level_await(&ast.module));

    tracing::debug!(
        filename = %filename,
        blocks = blocks.len(),
        errors = errors.len(),
        is_async,
        "parsed component"
    );

    SfcParseResult {
        filename,
        blocks,
        buffer: PatchBuffer::new(source),
        generic,
        is_async,
        script,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let result = parse("");
        assert!(result.errors.is_empty());
        assert!(result.blocks.is_empty());
        assert_eq!(result.buffer.to_string(), "");
        assert_eq!(result.filename, DEFAULT_FILENAME);
    }

    #[test]
    fn test_generic_and_async() {
        let source = r#"<script setup lang="ts" generic="T extends string">const x = await f()</script>"#;
        let result = parse(source);
        assert!(result.errors.is_empty());
        assert_eq!(result.generic.as_deref(), Some("T extends string"));
        assert!(result.is_async);
        assert!(result.script.is_some());
    }

    #[test]
    fn test_buffer_holds_whole_source() {
        let source = "<template><div/></template>\n<script>let a</script>\n";
        let result = parse(source);
        assert_eq!(result.buffer.to_string(), source);
        assert_eq!(result.main_script_index(), Some(1));
    }

    #[test]
    fn test_script_syntax_error_is_collected() {
        let result = parse("<script>let = </script>");
        assert!(result.script.is_none());
        assert_eq!(result.errors.len(), 1);
    }
}
