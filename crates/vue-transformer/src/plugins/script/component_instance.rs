use source_map::PatchBuffer;

use crate::context::ProcessContext;
use crate::engine::{Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{MacroName, ScriptItem};

/// Exports the public instance type of a `<script setup>` component.
///
/// Generic parameters are redeclared under sanitized names defaulted to
/// `any`, so the exports stay usable without type arguments.
pub struct ComponentInstancePlugin;

impl Plugin<ScriptItem> for ComponentInstancePlugin {
    fn name(&self) -> &'static str {
        "component-instance"
    }

    fn post(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        if !ctx.is_setup() {
            let span = ctx.main_script().map(|b| b.open_tag).unwrap_or_default();
            ctx.warn("component instance types are only generated for <script setup>", span);
            return Ok(());
        }

        let (defs, refs) = (ctx.sanitized_defs(), ctx.sanitized_refs());
        let full_context = format!("{}{refs}", ctx.name("FullContext"));
        let member = |macro_name: MacroName| -> String {
            ctx.macro_value(macro_name)
                .map_or_else(|| "{}".to_string(), |value| format!("{full_context}[\"{value}\"]"))
        };
        let props = member(MacroName::DefineProps);
        let emits = member(MacroName::DefineEmits);
        let slots = member(MacroName::DefineSlots);

        let public = ctx.helper(Helper::PublicInstance);
        let default_component = ctx.name("DefaultComponent");
        let instance = ctx.name("Instance");
        let instance_test = ctx.name("Instance_TEST");
        let component = ctx.name("Component");
        let template_binding = format!("{}{refs}", ctx.name("TemplateBinding"));

        buffer.append(&format!(
            "\ndeclare const {default_component}: import(\"vue\").DefineComponent<{{}}, {{}}, any>;\n\
             export type {instance}{defs} = InstanceType<typeof {default_component}> & {public}<{props}, {emits}, {slots}, {{}}, {{}}>;\n\
             export type {instance_test}{defs} = InstanceType<typeof {default_component}> & {public}<{props}, {emits}, {slots}, {{}}, {template_binding}>;\n\
             export declare const {component}: {{ new {defs}(): {instance}{refs} }};\n"
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ScriptPlugin};
    use crate::items::extract_script_items;
    use crate::plugins::script::{BindingsPlugin, MacrosPlugin};

    fn run(source: &str) -> (String, Vec<crate::context::Diagnostic>) {
        let parsed = vue_parser::parse(source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let options = ContextOptions::from_parse(&parsed);
        let plugins: Vec<ScriptPlugin> = vec![
            Box::new(BindingsPlugin),
            Box::new(MacrosPlugin),
            Box::new(ComponentInstancePlugin),
        ];
        let result = process_script(&items, &plugins, &options).unwrap();
        let start = result.result.find("\ndeclare const").unwrap_or(result.result.len());
        (result.result[start..].trim().to_string(), result.context.diagnostics)
    }

    #[test]
    fn test_generic_instance() {
        let (out, _) = run(
            "<script setup lang=\"ts\" generic=\"T\">\nconst props = defineProps<{ item: T }>()\n</script>",
        );
        insta::assert_snapshot!(out, @r#"
        declare const ___GENERATED___DefaultComponent: import("vue").DefineComponent<{}, {}, any>;
        export type ___GENERATED___Instance<___GENERATED___T = any> = InstanceType<typeof ___GENERATED___DefaultComponent> & ___GENERATED___PublicInstance<___GENERATED___FullContext<___GENERATED___T>["props"], {}, {}, {}, {}>;
        export type ___GENERATED___Instance_TEST<___GENERATED___T = any> = InstanceType<typeof ___GENERATED___DefaultComponent> & ___GENERATED___PublicInstance<___GENERATED___FullContext<___GENERATED___T>["props"], {}, {}, {}, ___GENERATED___TemplateBinding<___GENERATED___T>>;
        export declare const ___GENERATED___Component: { new <___GENERATED___T = any>(): ___GENERATED___Instance<___GENERATED___T> };
        "#);
    }

    #[test]
    fn test_options_component_warns() {
        let (out, diagnostics) = run("<script>export default {}</script>");
        assert_eq!(out, "");
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("<script setup>"));
    }
}
