use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::PatchBuffer;

use crate::context::{ContextItem, ProcessContext};
use crate::engine::{Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{BindingKind, MacroName, ScriptItem};

/// Declares what the render function sees: the setup bindings the template
/// reads, refs unwrapped, plus the `$props`/`$slots`/`$emit`/`$attrs`
/// instance properties.
pub struct TemplateBindingPlugin;

impl Plugin<ScriptItem> for TemplateBindingPlugin {
    fn name(&self) -> &'static str {
        "template-binding"
    }

    fn post(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let binding_type = ctx.name("TemplateBinding");
        let components = ctx.name("Components");
        let (defs, refs) = (ctx.generic_defs(), ctx.generic_refs());

        if !ctx.is_setup() {
            buffer.append(&format!(
                "\ntype {binding_type}{defs} = Record<string, any>;\n\
                 type {components}{defs} = {binding_type}{refs} & import(\"vue\").GlobalComponents;\n"
            ));
            return Ok(());
        }

        let fc = ctx.name("fc");
        let mut entries = Vec::new();
        let props = ctx.macro_value(MacroName::DefineProps).cloned();
        if let Some(props) = &props {
            entries.push(format!("...{fc}.{props}"));
        }
        let used = template_names(ctx);
        if used.values().any(|kind| kind.is_some_and(BindingKind::is_variable)) {
            let unref = ctx.helper(Helper::Unref);
            for (name, kind) in &used {
                entries.push(match kind {
                    Some(kind) if kind.is_variable() => format!("{name}: {unref}({fc}.{name})"),
                    _ => format!("{name}: {fc}.{name}"),
                });
            }
        } else {
            entries.extend(used.keys().map(|name| format!("{name}: {fc}.{name}")));
        }

        let instance_value = |macro_name: MacroName, fallback: &str| -> String {
            ctx.macro_value(macro_name)
                .map_or_else(|| fallback.to_string(), |value| format!("{fc}.{value}"))
        };
        entries.push(format!("$props: {}", instance_value(MacroName::DefineProps, "{} as {}")));
        entries.push(format!(
            "$slots: {}",
            instance_value(
                MacroName::DefineSlots,
                "{} as Record<string, ((...args: any[]) => any) | undefined>"
            )
        ));
        entries.push(format!(
            "$emit: {}",
            instance_value(MacroName::DefineEmits, "{} as (...args: any[]) => void")
        ));
        entries.push("$attrs: {} as Record<string, unknown>".to_string());

        let function = ctx.name("templateBinding");
        let full_context = ctx.name("FullContext");
        buffer.append(&format!(
            "\nfunction {function}{defs}({fc}: {full_context}{refs}) {{\n\
             return {{ {} }};\n\
             }}\n\
             type {binding_type}{defs} = ReturnType<typeof {function}{refs}>;\n\
             type {components}{defs} = {binding_type}{refs} & import(\"vue\").GlobalComponents;\n",
            entries.join(", ")
        ));
        tracing::trace!(bindings = used.len(), "declared template bindings");
        Ok(())
    }
}

/// Setup names the template reads, in template order, with the kind of
/// their declaration. Generated macro value names have no kind.
fn template_names(ctx: &ProcessContext) -> IndexMap<SmolStr, Option<BindingKind>> {
    let mut declared: IndexMap<&SmolStr, Option<BindingKind>> = IndexMap::new();
    for item in &ctx.items {
        match item {
            ContextItem::Binding { name, kind, .. } if *kind != BindingKind::Type => {
                declared.entry(name).or_insert(Some(*kind));
            }
            ContextItem::MacroBinding { value_name, .. } => {
                declared.entry(value_name).or_insert(None);
            }
            ContextItem::Binding { .. } => {}
        }
    }
    ctx.template
        .bindings
        .iter()
        .filter_map(|name| declared.get(name).map(|kind| (name.clone(), *kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ScriptPlugin};
    use crate::facts::TemplateFacts;
    use crate::items::extract_script_items;
    use crate::plugins::script::{BindingsPlugin, MacrosPlugin};

    fn run(source: &str, template_bindings: &[&str]) -> String {
        let parsed = vue_parser::parse(source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let mut options = ContextOptions::from_parse(&parsed);
        options.template = TemplateFacts {
            bindings: template_bindings.iter().map(|s| SmolStr::new(*s)).collect(),
            ..TemplateFacts::default()
        };
        let plugins: Vec<ScriptPlugin> = vec![
            Box::new(BindingsPlugin),
            Box::new(MacrosPlugin),
            Box::new(TemplateBindingPlugin),
        ];
        let result = process_script(&items, &plugins, &options).unwrap().result;
        let start = result.find("\nfunction ___GENERATED___templateBinding").unwrap_or(0);
        result[start..].trim().to_string()
    }

    #[test]
    fn test_only_template_names_are_exposed() {
        let out = run(
            "<script setup lang=\"ts\">\nconst count = ref(0)\nfunction inc() {}\nconst hidden = 1\nconst props = defineProps<{ a: string }>()\n</script>",
            &["inc", "count", "missing"],
        );
        insta::assert_snapshot!(out, @r#"
        function ___GENERATED___templateBinding(___GENERATED___fc: ___GENERATED___FullContext) {
        return { ...___GENERATED___fc.props, inc: ___GENERATED___fc.inc, count: ___GENERATED___unref(___GENERATED___fc.count), $props: ___GENERATED___fc.props, $slots: {} as Record<string, ((...args: any[]) => any) | undefined>, $emit: {} as (...args: any[]) => void, $attrs: {} as Record<string, unknown> };
        }
        type ___GENERATED___TemplateBinding = ReturnType<typeof ___GENERATED___templateBinding>;
        type ___GENERATED___Components = ___GENERATED___TemplateBinding & import("vue").GlobalComponents;
        "#);
    }

    #[test]
    fn test_options_component_is_untyped() {
        let parsed = vue_parser::parse("<script>export default {}</script>");
        let options = ContextOptions::from_parse(&parsed);
        let plugins: Vec<ScriptPlugin> = vec![Box::new(TemplateBindingPlugin)];
        let result = process_script(&[], &plugins, &options).unwrap().result;
        assert!(result.ends_with(
            "\ntype ___GENERATED___TemplateBinding = Record<string, any>;\n\
             type ___GENERATED___Components = ___GENERATED___TemplateBinding & import(\"vue\").GlobalComponents;\n"
        ));
    }
}
