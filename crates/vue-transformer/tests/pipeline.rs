//! Driving the pipelines directly with plugins defined outside the crate.

use pretty_assertions::assert_eq;
use source_map::PatchBuffer;
use vue_parser::{parse, parse_template};
use vue_transformer::engine::{Enforce, Handles, ScriptPlugin, TemplatePlugin};
use vue_transformer::items::{
    extract_script_items, extract_template_items, ScriptItem, ScriptItemKind, TemplateExtractOptions, TemplateItem,
    TemplateItemKind,
};
use vue_transformer::plugins::{default_script_plugins, default_template_plugins};
use vue_transformer::{process_script, process_template, ContextOptions, Plugin, ProcessContext, TransformResult};

const SOURCE: &str = "<script setup lang=\"ts\">\nconst msg = 'hi'\nfunction greet() {}\n</script>\n<template><p title=\"x\">{{ msg }}</p></template>";

/// Marks every interpolation with a comment naming its position.
struct MarkInterpolations;

impl Plugin<TemplateItem> for MarkInterpolations {
    fn name(&self) -> &'static str {
        "mark-interpolations"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Interpolation])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let id = ctx.next_id();
        buffer.append_left(item.span().lo(), &format!("/*{id}*/"))?;
        Ok(())
    }
}

/// Lists the script's declarations in a trailing comment.
struct ListDeclarations;

impl Plugin<ScriptItem> for ListDeclarations {
    fn name(&self) -> &'static str {
        "list-declarations"
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Post)
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[ScriptItemKind::Declaration])
    }

    fn transform(&self, item: &ScriptItem, buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
        if let ScriptItem::Declaration(decl) = item {
            buffer.append(&format!("// {}\n", decl.name));
        }
        Ok(())
    }
}

fn template_items(source: &str) -> Vec<TemplateItem> {
    let parsed = parse(source);
    let block = parsed.template().unwrap();
    let template = parse_template(source, block);
    extract_template_items(&template.nodes, &TemplateExtractOptions::default()).items
}

#[test]
fn test_no_plugins_is_identity() {
    let parsed = parse(SOURCE);
    let options = ContextOptions::from_parse(&parsed);
    let items = template_items(SOURCE);
    let result = process_template(&items, &[], &options).unwrap();
    assert_eq!(result.result, SOURCE);
    let script = extract_script_items(parsed.script.as_ref().unwrap());
    let result = process_script(&script, &[], &options).unwrap();
    assert_eq!(result.result, SOURCE);
}

#[test]
fn test_external_template_plugin() {
    let parsed = parse(SOURCE);
    let options = ContextOptions::from_parse(&parsed);
    let plugins: Vec<TemplatePlugin> = vec![Box::new(MarkInterpolations)];
    let result = process_template(&template_items(SOURCE), &plugins, &options).unwrap();
    assert!(result.result.ends_with("<template><p title=\"x\">/*0*/{{ msg }}</p></template>"));
}

#[test]
fn test_external_plugin_joins_default_pipeline() {
    let parsed = parse(SOURCE);
    let options = ContextOptions::from_parse(&parsed).with_prefix("");
    let mut plugins: Vec<ScriptPlugin> = vec![Box::new(ListDeclarations)];
    plugins.extend(default_script_plugins());
    let items = extract_script_items(parsed.script.as_ref().unwrap());
    let result = process_script(&items, &plugins, &options).unwrap();
    assert!(result.result.contains("// greet\n"), "{}", result.result);
    assert!(result.result.contains("greet: greet as typeof greet"));
}

#[test]
fn test_default_template_pipeline_leaves_script_alone() {
    let parsed = parse(SOURCE);
    let options = ContextOptions::from_parse(&parsed).with_prefix("");
    let result = process_template(&template_items(SOURCE), &default_template_plugins(), &options).unwrap();
    assert!(result.result.starts_with("<script setup lang=\"ts\">\nconst msg = 'hi'\n"));
    assert!(result.result.contains("<p title=\"x\">{ ctx.msg }</p>"));
}
