use source_map::PatchBuffer;

use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::facts::{RefName, Target};
use crate::items::{ArgumentValue, ScriptItem, ScriptItemKind};

const ACCESSOR: &str = "useTemplateRef";

/// Adds explicit type arguments to `useTemplateRef` calls from the template
/// element carrying the matching `ref`.
pub struct TemplateRefPlugin;

impl Plugin<ScriptItem> for TemplateRefPlugin {
    fn name(&self) -> &'static str {
        "template-ref"
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[ScriptItemKind::FunctionCall])
    }

    fn transform(&self, item: &ScriptItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        if !ctx.is_typed {
            return Ok(());
        }
        let ScriptItem::FunctionCall(call) = item else {
            return Ok(());
        };
        if call.callee != ACCESSOR || call.type_args.is_some() {
            return Ok(());
        }

        let type_args = match call.args.first().map(|arg| &arg.value) {
            Some(ArgumentValue::String(name)) => {
                let element = resolve(ctx, name);
                format!("<{element}, \"{name}\">")
            }
            Some(ArgumentValue::Identifier(ident)) => format!("<unknown, typeof {ident}>"),
            Some(ArgumentValue::Other) | None => "<unknown>".to_string(),
        };
        buffer.append_left(call.callee_span.hi(), &type_args)?;
        tracing::trace!(args = %type_args, "typed template ref");
        Ok(())
    }
}

/// The type of the single template element with the static ref `name`.
fn resolve(ctx: &ProcessContext, name: &str) -> String {
    let mut matches = ctx
        .template
        .refs
        .iter()
        .filter(|r| matches!(&r.name, RefName::Static(n) if n == name));
    let dynamic = ctx.template.refs.iter().any(|r| r.name == RefName::Dynamic);
    let (Some(found), None, false) = (matches.next(), matches.next(), dynamic) else {
        return "unknown".to_string();
    };
    match &found.target {
        Target::Element(tag) => format!("HTMLElementTagNameMap[\"{tag}\"]"),
        Target::Component(component) => {
            let root = component.split('.').next().unwrap_or(component);
            if ctx.script_bindings.contains(root) {
                format!("InstanceType<typeof {component}>")
            } else {
                "unknown".to_string()
            }
        }
        Target::Unknown => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ScriptPlugin};
    use crate::facts::TemplateFacts;
    use crate::items::{extract_script_items, extract_template_items, TemplateExtractOptions};
    use pretty_assertions::assert_eq;
    use smol_str::SmolStr;

    fn run(script: &str, template: &str) -> String {
        let source = format!("<script setup lang=\"ts\">\n{script}\n</script>");
        let parsed = vue_parser::parse(&source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let fragment = vue_parser::parse_fragment(template, 0, template.len());
        let template_items = extract_template_items(&fragment.nodes, &TemplateExtractOptions::default()).items;
        let mut options = ContextOptions::from_parse(&parsed);
        options.template = TemplateFacts::collect(&template_items, true);
        options.script_bindings = ["Child"].into_iter().map(SmolStr::new).collect();
        let plugins: Vec<ScriptPlugin> = vec![Box::new(TemplateRefPlugin)];
        let out = process_script(&items, &plugins, &options).unwrap().result;
        let start = "<script setup lang=\"ts\">\n".len();
        out[start..out.len() - "\n</script>".len()].to_string()
    }

    #[test]
    fn test_element_ref() {
        let out = run("const el = useTemplateRef('input')", r#"<input ref="input"/>"#);
        assert_eq!(out, r#"const el = useTemplateRef<HTMLElementTagNameMap["input"], "input">('input')"#);
    }

    #[test]
    fn test_component_ref() {
        let out = run("const c = useTemplateRef('child')", r#"<Child ref="child"/>"#);
        assert_eq!(out, r#"const c = useTemplateRef<InstanceType<typeof Child>, "child">('child')"#);
    }

    #[test]
    fn test_unresolved_refs_are_unknown() {
        let out = run("const a = useTemplateRef('missing')", r#"<div ref="box"/>"#);
        assert_eq!(out, r#"const a = useTemplateRef<unknown, "missing">('missing')"#);

        let out = run("const a = useTemplateRef('box')", r#"<div ref="box"/><span :ref="name"/>"#);
        assert_eq!(out, r#"const a = useTemplateRef<unknown, "box">('box')"#);

        let out = run("const a = useTemplateRef(key)", r#"<div ref="box"/>"#);
        assert_eq!(out, "const a = useTemplateRef<unknown, typeof key>(key)");
    }

    #[test]
    fn test_explicit_type_arguments_are_kept() {
        let script = "const a = useTemplateRef<HTMLDivElement>('box')";
        assert_eq!(run(script, r#"<div ref="box"/>"#), script);
    }
}
