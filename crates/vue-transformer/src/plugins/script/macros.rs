//! Compiler macro expansion.
//!
//! Macro calls stay in place so the runtime shape is unchanged, but their
//! payloads are hoisted into named declarations the synthesized types can
//! refer to:
//!
//! ```text
//! const props = defineProps<{ a: string }>()
//! // becomes
//! type ___definePropsType = { a: string };
//! const props = defineProps<___definePropsType & {}>()
//! ```
//!
//! A runtime payload is hoisted into a `const` and passed back through
//! `extractValue`. Every macro's value ends up in a named variable; calls
//! without a plain declarator are assigned to a generated one.

use smol_str::SmolStr;
use source_map::PatchBuffer;

use crate::context::{ContextItem, ProcessContext};
use crate::engine::{Handles, Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{DeclarationType, MacroBindingItem, MacroName, ScriptItem, ScriptItemKind};

pub struct MacrosPlugin;

impl Plugin<ScriptItem> for MacrosPlugin {
    fn name(&self) -> &'static str {
        "macros"
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[ScriptItemKind::MacroBinding])
    }

    fn transform(&self, item: &ScriptItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let ScriptItem::MacroBinding(binding) = item else {
            return Ok(());
        };
        if !ctx.is_setup() {
            ctx.warn(
                format!("{} is only available in <script setup>", binding.macro_name.as_str()),
                binding.call,
            );
            return Ok(());
        }

        let declaration_name = binding.declaration_name.as_deref().map(|name| ctx.name(name));
        match (binding.declaration_type, &declaration_name) {
            (DeclarationType::Type, Some(name)) => hoist_type(buffer, binding, name)?,
            (DeclarationType::Object, Some(name)) => {
                let extract = ctx.helper(Helper::ExtractValue);
                hoist_object(buffer, binding, name, &extract)?;
            }
            _ => {}
        }

        // `withDefaults(defineProps(), ...)`: the inner call is assigned
        // through the outer one.
        let nested = binding.declarator.is_none() && binding.call.lo() != binding.statement.lo();
        let value_name = if nested {
            unique_value_name(ctx, binding.macro_name)
        } else {
            assign_value(buffer, ctx, binding)?
        };

        if binding.macro_name == MacroName::WithDefaults {
            if let Some(ContextItem::MacroBinding { value_name: props, .. }) = ctx.items.iter_mut().rev().find(
                |item| matches!(item, ContextItem::MacroBinding { macro_name: MacroName::DefineProps, .. }),
            ) {
                *props = value_name.clone();
            }
        }

        tracing::trace!(
            macro_name = binding.macro_name.as_str(),
            value = %value_name,
            "expanded macro"
        );
        ctx.items.push(ContextItem::MacroBinding {
            macro_name: binding.macro_name,
            declaration_type: binding.declaration_type,
            declaration_name,
            value_name,
        });
        Ok(())
    }
}

/// `defineProps<T>()` -> `type Name = T;` before the statement and
/// `defineProps<Name & {}>()`.
fn hoist_type(buffer: &mut PatchBuffer, binding: &MacroBindingItem, name: &str) -> TransformResult<()> {
    let Some(ty) = binding.type_params else {
        return Ok(());
    };
    buffer.prepend_right(ty.lo(), &format!("type {name} = "))?;
    buffer.append_left(ty.hi(), ";\n")?;
    buffer.move_range(ty.lo(), ty.hi(), binding.statement.lo())?;
    buffer.append_left(ty.lo(), &format!("{name} & {{}}"))?;
    Ok(())
}

/// `defineProps(ARG)` -> `const Name = ARG;` before the statement and
/// `defineProps(extractValue(Name))`.
fn hoist_object(buffer: &mut PatchBuffer, binding: &MacroBindingItem, name: &str, extract: &str) -> TransformResult<()> {
    let Some(args) = binding.args else {
        return Ok(());
    };
    buffer.prepend_right(args.lo(), &format!("const {name} = "))?;
    buffer.append_left(args.hi(), ";\n")?;
    buffer.move_range(args.lo(), args.hi(), binding.statement.lo())?;
    buffer.append_left(args.lo(), &format!("{extract}({name})"))?;
    Ok(())
}

/// Makes sure the macro's value lives in a variable and returns its name.
fn assign_value(buffer: &mut PatchBuffer, ctx: &ProcessContext, binding: &MacroBindingItem) -> TransformResult<SmolStr> {
    match &binding.declarator {
        Some(declarator) => {
            if let Some(name) = &declarator.name {
                return Ok(name.clone());
            }
            // let { a, b } = defineProps()
            // -> let v = defineProps();
            //    let { a, b } = v
            let value_name = unique_value_name(ctx, binding.macro_name);
            let (pattern, init) = (declarator.pattern, declarator.init);
            let terminated = buffer.slice(binding.statement).trim_end().ends_with(';');
            let separator = if terminated { "\n" } else { ";\n" };
            buffer.move_range(pattern.lo(), init.lo(), binding.statement.hi())?;
            buffer.append_left(pattern.lo(), &format!("{value_name} = "))?;
            buffer.prepend_right(pattern.lo(), &format!("{separator}{} ", declarator.kind.keyword()))?;
            buffer.append_left(init.lo(), &value_name)?;
            Ok(value_name)
        }
        None => {
            let value_name = unique_value_name(ctx, binding.macro_name);
            buffer.prepend_right(binding.call.lo(), &format!("const {value_name} = "))?;
            Ok(value_name)
        }
    }
}

fn unique_value_name(ctx: &ProcessContext, macro_name: MacroName) -> SmolStr {
    let base = ctx.name(macro_name.as_str());
    // An unprefixed name must not shadow the macro it is assigned from.
    let taken = |candidate: &str| {
        candidate == macro_name.as_str()
            || ctx.items.iter().any(|item| match item {
                ContextItem::MacroBinding { value_name, .. } => value_name == candidate,
                ContextItem::Binding { .. } => false,
            })
    };
    if !taken(&base) {
        return SmolStr::new(base);
    }
    let mut n = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return SmolStr::new(candidate);
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ProcessResult, ScriptPlugin};
    use crate::items::extract_script_items;
    use crate::plugins::script::BindingsPlugin;
    use pretty_assertions::assert_eq;

    fn run(script: &str) -> (String, ProcessResult) {
        let source = format!("<script setup lang=\"ts\">\n{script}\n</script>");
        let parsed = vue_parser::parse(&source);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let plugins: Vec<ScriptPlugin> = vec![Box::new(MacrosPlugin), Box::new(BindingsPlugin)];
        let result = process_script(&items, &plugins, &ContextOptions::from_parse(&parsed)).unwrap();
        let start = "<script setup lang=\"ts\">\n".len();
        let end = result.result.len() - "\n</script>".len();
        (result.result[start..end].to_string(), result)
    }

    #[test]
    fn test_type_payload() {
        let (out, _) = run("const props = defineProps<{ a: string }>()");
        assert_eq!(
            out,
            "type ___GENERATED___definePropsType = { a: string };\n\
             const props = defineProps<___GENERATED___definePropsType & {}>()"
        );
    }

    #[test]
    fn test_object_payload_with_declarator() {
        let (out, result) = run("const props = defineProps(['foo', 'bar'])");
        assert_eq!(
            out,
            "const ___GENERATED___definePropsRaw = ['foo', 'bar'];\n\
             const props = defineProps(___GENERATED___extractValue(___GENERATED___definePropsRaw))"
        );
        assert_eq!(
            result.context.items[0],
            ContextItem::MacroBinding {
                macro_name: MacroName::DefineProps,
                declaration_type: DeclarationType::Object,
                declaration_name: Some("___GENERATED___definePropsRaw".to_string()),
                value_name: "props".into(),
            }
        );
        assert!(matches!(&result.context.items[1], ContextItem::Binding { name, .. } if name == "props"));
    }

    #[test]
    fn test_bare_statement_is_assigned() {
        let (out, result) = run("defineEmits<{ (e: 'go'): void }>()");
        assert_eq!(
            out,
            "type ___GENERATED___defineEmitsType = { (e: 'go'): void };\n\
             const ___GENERATED___defineEmits = defineEmits<___GENERATED___defineEmitsType & {}>()"
        );
        assert_eq!(
            result.context.macro_value(MacroName::DefineEmits).map(|s| s.as_str()),
            Some("___GENERATED___defineEmits")
        );
    }

    #[test]
    fn test_destructured_declarator() {
        let (out, result) = run("const { a, ...rest } = defineProps<{ a: number; b: number }>()");
        assert_eq!(
            out,
            "type ___GENERATED___definePropsType = { a: number; b: number };\n\
             const ___GENERATED___defineProps = defineProps<___GENERATED___definePropsType & {}>();\n\
             const { a, ...rest } = ___GENERATED___defineProps"
        );
        let names: Vec<&str> = result.context.bindings().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "rest"]);
    }

    #[test]
    fn test_destructured_let_keeps_its_keyword() {
        let (out, _) = run("let { a } = defineProps<{ a: number }>();");
        assert_eq!(
            out,
            "type ___GENERATED___definePropsType = { a: number };\n\
             let ___GENERATED___defineProps = defineProps<___GENERATED___definePropsType & {}>();\n\
             let { a } = ___GENERATED___defineProps"
        );
    }

    #[test]
    fn test_with_defaults() {
        let (out, result) = run("const props = withDefaults(defineProps<{ a?: string }>(), { a: 'x' })");
        assert_eq!(
            out,
            "type ___GENERATED___definePropsType = { a?: string };\n\
             const props = withDefaults(defineProps<___GENERATED___definePropsType & {}>(), { a: 'x' })"
        );
        assert_eq!(
            result.context.macro_value(MacroName::DefineProps).map(|s| s.as_str()),
            Some("props")
        );
    }

    #[test]
    fn test_empty_payload_untouched() {
        let (out, _) = run("const slots = defineSlots()");
        assert_eq!(out, "const slots = defineSlots()");
    }
}
