use indexmap::IndexSet;
use smol_str::SmolStr;
use source_map::PatchBuffer;

use crate::context::{ContextItem, ProcessContext};
use crate::engine::{Plugin, TransformResult};
use crate::items::{BindingKind, ScriptItem};

/// Wraps `<script setup>` in a function returning every top-level binding,
/// and declares `FullContext` as its return type.
pub struct FullContextPlugin;

impl Plugin<ScriptItem> for FullContextPlugin {
    fn name(&self) -> &'static str {
        "full-context"
    }

    fn pre(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        if !ctx.is_setup() {
            return Ok(());
        }
        let Some(open) = ctx.main_script().map(|b| b.open_tag) else {
            return Ok(());
        };
        let header = format!(
            "{}function {}{}() {{",
            if ctx.is_async { "async " } else { "" },
            ctx.name("setup"),
            ctx.generic_defs()
        );
        buffer.overwrite(open.lo(), open.hi(), &header)?;
        Ok(())
    }

    fn post(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let full_context = ctx.name("FullContext");
        let defs = ctx.generic_defs();
        let Some(block) = ctx.main_script().filter(|b| b.is_setup()) else {
            buffer.append(&format!("\ntype {full_context}{defs} = {{}};\n"));
            return Ok(());
        };
        let (close, content_end) = (block.close_tag, block.content_span.hi());

        let names = returned_names(ctx);
        let entries: Vec<String> = names
            .iter()
            .map(|name| format!("{name}: {name} as typeof {name}"))
            .collect();
        let setup = format!("typeof {}{}", ctx.name("setup"), ctx.generic_refs());
        let context_type = if ctx.is_async {
            format!("Awaited<ReturnType<{setup}>>")
        } else {
            format!("ReturnType<{setup}>")
        };
        let footer = format!(
            "\nreturn {{ {} }};\n}}\ntype {full_context}{defs} = {context_type};\n",
            entries.join(", ")
        );
        match close {
            Some(close) => buffer.overwrite(close.lo(), close.hi(), &footer)?,
            None => buffer.append_left(content_end, &footer)?,
        }
        tracing::trace!(bindings = names.len(), "wrapped setup");
        Ok(())
    }
}

/// Value bindings of the setup scope, in declaration order.
fn returned_names(ctx: &ProcessContext) -> IndexSet<SmolStr> {
    let mut names = IndexSet::new();
    for item in &ctx.items {
        match item {
            ContextItem::Binding { name, kind, .. } if *kind != BindingKind::Type => {
                names.insert(name.clone());
            }
            ContextItem::MacroBinding { value_name, .. } => {
                names.insert(value_name.clone());
            }
            ContextItem::Binding { .. } => {}
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ScriptPlugin};
    use crate::items::extract_script_items;
    use crate::plugins::script::BindingsPlugin;

    fn run(source: &str) -> String {
        let parsed = vue_parser::parse(source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let options = ContextOptions::from_parse(&parsed);
        let plugins: Vec<ScriptPlugin> = vec![Box::new(FullContextPlugin), Box::new(BindingsPlugin)];
        process_script(&items, &plugins, &options).unwrap().result
    }

    #[test]
    fn test_generic_is_propagated() {
        let out = run(r#"<script setup lang="ts" generic="T">let a = {} as unknown as T</script>"#);
        insta::assert_snapshot!(out.trim_end(), @r"
        function ___GENERATED___setup<T>() {let a = {} as unknown as T
        return { a: a as typeof a };
        }
        type ___GENERATED___FullContext<T> = ReturnType<typeof ___GENERATED___setup<T>>;
        ");
    }

    #[test]
    fn test_async_unwraps_promise() {
        let out = run("<script setup lang=\"ts\">\nconst data = await load()\ntype X = 1\n</script>");
        assert!(out.starts_with("async function ___GENERATED___setup() {"));
        assert!(out.contains("return { data: data as typeof data };"));
        assert!(out.contains("= Awaited<ReturnType<typeof ___GENERATED___setup>>;"));
    }

    #[test]
    fn test_options_component_has_empty_context() {
        let out = run("<script>export default {}</script>");
        assert!(out.ends_with("\ntype ___GENERATED___FullContext = {};\n"));
    }
}
