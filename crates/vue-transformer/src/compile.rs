//! The end-to-end compiler: component source in, TSX out.

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::SourceMap;
use vue_parser::{parse_template, parse_with_options, Block, BlockKind, ParseError, ParseOptions};

use crate::context::{prefix_naming, ContextOptions, Diagnostic, ProcessContext, Severity};
use crate::engine::{process_script, process_template, TransformResult};
use crate::facts::TemplateFacts;
use crate::items::{
    extract_script_items, extract_template_items, BindingKind, ItemDiagnostic, ScriptItem, TemplateExtractOptions,
    TemplateItem,
};
use crate::options::CompileOptions;

/// The output of [`compile`].
#[derive(Debug)]
pub struct CompileOutput {
    /// The generated TSX program.
    pub code: String,
    /// Maps offsets in `code` back to the component source.
    pub source_map: SourceMap,
    /// Parse errors and transform warnings, deduplicated, in discovery order.
    pub diagnostics: Vec<Diagnostic>,
    /// The final state of the script pipeline.
    pub context: ProcessContext,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Compiles a component into a TSX program for type-checking.
///
/// Malformed input never fails the call; problems are reported as
/// diagnostics next to a best-effort output. Errors are reserved for
/// configuration mistakes and plugin failures.
pub fn compile(source: &str, options: &CompileOptions) -> TransformResult<CompileOutput> {
    let script_plugins = options.script_plugins()?;
    let template_plugins = options.template_plugins()?;

    let parsed = parse_with_options(
        source,
        ParseOptions {
            filename: options.filename.clone(),
        },
    );
    let mut diagnostics: IndexSet<Diagnostic> = parsed.errors.iter().map(parse_diagnostic).collect();
    let typed = options
        .typed
        .unwrap_or_else(|| parsed.main_script().is_some_and(Block::is_typed));

    let script_items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
    let script_bindings = top_level_names(&script_items);

    let template_items = match parsed.template() {
        Some(block) if is_markup(block) => {
            let template = parse_template(source, block);
            diagnostics.extend(template.errors.iter().map(parse_diagnostic));
            let extraction = extract_template_items(
                &template.nodes,
                &TemplateExtractOptions {
                    typed,
                    script_bindings: script_bindings.iter().cloned().collect::<FxHashSet<_>>(),
                },
            );
            diagnostics.extend(extraction.diagnostics.iter().map(warning));
            extraction.items
        }
        _ => Vec::<TemplateItem>::new(),
    };

    let mut context = ContextOptions::from_parse(&parsed);
    context.is_typed = typed;
    context.narrow = options.narrow;
    context.naming = prefix_naming(options.prefix.clone());
    context.template = TemplateFacts::collect(&template_items, typed);
    context.script_bindings = script_bindings;

    let template_run = process_template(&template_items, &template_plugins, &context)?;
    diagnostics.extend(template_run.context.diagnostics.iter().cloned());

    context.buffer = template_run.buffer;
    context.used_helpers = template_run.context.used_helpers;
    context.declared_helpers = template_run.context.declared_helpers;
    let script_run = process_script(&script_items, &script_plugins, &context)?;
    diagnostics.extend(script_run.context.diagnostics.iter().cloned());

    tracing::debug!(
        filename = %script_run.context.filename,
        len = script_run.result.len(),
        diagnostics = diagnostics.len(),
        "compiled component"
    );
    Ok(CompileOutput {
        code: script_run.result,
        source_map: script_run.buffer.source_map(),
        diagnostics: diagnostics.into_iter().collect(),
        context: script_run.context,
    })
}

/// Whether the template block is plain markup rather than a preprocessor
/// language.
fn is_markup(block: &Block) -> bool {
    block.kind == BlockKind::Template && block.lang.as_deref().map_or(true, |lang| lang == "html")
}

/// The value names declared at the top level of the script.
fn top_level_names(items: &[ScriptItem]) -> IndexSet<SmolStr> {
    let mut names = IndexSet::new();
    for item in items {
        match item {
            ScriptItem::Import(import) if !import.type_only => {
                names.extend(import.specifiers.iter().filter(|s| !s.type_only).map(|s| s.local.clone()));
            }
            ScriptItem::Declaration(decl) if decl.kind != BindingKind::Type => {
                names.insert(decl.name.clone());
            }
            ScriptItem::Binding(binding) if binding.kind != BindingKind::Type => {
                names.insert(binding.name.clone());
            }
            _ => {}
        }
    }
    names
}

fn parse_diagnostic(error: &ParseError) -> Diagnostic {
    Diagnostic {
        severity: if error.is_warning() {
            Severity::Warning
        } else {
            Severity::Error
        },
        message: error.to_string(),
        span: error.span,
    }
}

fn warning(item: &ItemDiagnostic) -> Diagnostic {
    Diagnostic {
        severity: Severity::Warning,
        message: item.message.clone(),
        span: item.span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_top_level_names() {
        let parsed = vue_parser::parse(
            "<script setup lang=\"ts\">\nimport A, { type B } from './a'\nconst { c } = x\nfunction d() {}\ntype E = 1\n</script>",
        );
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let names = top_level_names(&items);
        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, ["A", "c", "d"]);
    }

    #[test]
    fn test_unknown_plugin_fails() {
        let mut options = CompileOptions::default();
        options.plugins.script.push("missing".to_string());
        assert!(matches!(
            compile("<template/>", &options),
            Err(crate::engine::TransformError::Config(_))
        ));
    }

    #[test]
    fn test_preprocessed_template_is_skipped() {
        let source = "<script setup lang=\"ts\"></script><template lang=\"pug\">div</template>";
        let output = compile(source, &CompileOptions::default()).unwrap();
        assert!(output.code.contains("/* <template lang=\"pug\"> */"));
        assert!(!output.has_errors());
        assert!(output.diagnostics.iter().any(|d| d.message.contains("pug")));
    }
}
