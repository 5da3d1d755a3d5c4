use source_map::PatchBuffer;
use vue_parser::{Directive, DirectiveArg};

use super::{directive_value, modifiers_object, qualified, qualify_expr, wrap_value};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{DirectiveItem, ElementInfo, ElementKind, TemplateItem, TemplateItemKind};
use crate::util::{camelize, is_simple_identifier, pascalize, string_literal};

/// Lowers every directive except events to JSX attributes or spreads.
///
/// | directive           | output                                   |
/// |---------------------|------------------------------------------|
/// | `:foo="x"`          | `foo={ctx.x}`                            |
/// | `:foo`              | `foo={ctx.foo}`                          |
/// | `v-bind="obj"`      | `{...ctx.obj}`                           |
/// | `:[key]="x"`        | `{...{[ctx.key]: ctx.x }}`               |
/// | `v-model="x"`       | `{...{ "value": ctx.x, "onUpdate:value": ... }}` |
/// | `v-show="x"`        | `hidden={!(ctx.x)}`                      |
/// | `v-once`, `v-pre`, `v-cloak` | kept as hyphenated attributes   |
/// | `v-focus:a.b="x"`   | `{...{ [directiveSymbol]: () => directiveBinding(...) }}` |
pub struct DirectivePlugin;

impl Plugin<TemplateItem> for DirectivePlugin {
    fn name(&self) -> &'static str {
        "directive"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Directive])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Directive(item) = item else {
            return Ok(());
        };
        let directive = &item.directive;
        if ctx.handled_attributes.contains(&directive.span) {
            return Ok(());
        }
        match directive.name.as_str() {
            "on" => Ok(()),
            "bind" => bind(item, buffer, ctx),
            "model" => model(item, buffer, ctx),
            "text" | "html" | "show" => content(item, buffer, ctx),
            "once" | "pre" | "cloak" => Ok(()),
            "memo" | "is" => spread(item, buffer, ctx),
            "slot" => {
                ctx.warn("v-slot can only be used on components and <template>", directive.span);
                remove(directive, buffer)
            }
            "if" | "else-if" | "else" | "for" => remove(directive, buffer),
            _ => custom(item, buffer, ctx),
        }
    }
}

fn remove(directive: &Directive, buffer: &mut PatchBuffer) -> TransformResult<()> {
    buffer.remove(directive.span.lo(), directive.span.hi())?;
    Ok(())
}

fn bind(item: &DirectiveItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let directive = &item.directive;
    let span = directive.span;
    let value = directive_value(directive);

    match (&directive.arg, value) {
        (None, Some(value)) => {
            qualify_expr(buffer, ctx, value, &item.locals)?;
            wrap_value(buffer, directive, value, "{...", "}")
        }
        (None, None) => {
            ctx.warn("v-bind requires a value", span);
            remove(directive, buffer)
        }
        (Some(DirectiveArg::Dynamic(arg)), value) => {
            let key = qualified(ctx, arg, &item.locals);
            match value {
                Some(value) => {
                    qualify_expr(buffer, ctx, value, &item.locals)?;
                    wrap_value(buffer, directive, value, &format!("{{...{{[{key}]: "), " }}")
                }
                None => {
                    buffer.overwrite(span.lo(), span.hi(), &format!("{{...{{[{key}]: undefined }}}}"))?;
                    Ok(())
                }
            }
        }
        (Some(DirectiveArg::Static { name, .. }), None) => {
            let prop = prop_name(directive, name);
            let ident = camelize(name);
            let text = if item.locals.iter().any(|l| *l == ident) || !is_simple_identifier(&ident) {
                ident
            } else {
                format!("{}.{ident}", ctx.ctx_name())
            };
            buffer.overwrite(span.lo(), span.hi(), &format!("{prop}={{{text}}}"))?;
            Ok(())
        }
        (Some(DirectiveArg::Static { name, .. }), Some(value)) => {
            let prop = prop_name(directive, name);
            qualify_expr(buffer, ctx, value, &item.locals)?;
            let merged = match prop.as_str() {
                "class" => item.element.static_class.as_ref().map(|attr| (attr, Helper::NormalizeClass)),
                "style" => item.element.static_style.as_ref().map(|attr| (attr, Helper::NormalizeStyle)),
                _ => None,
            };
            let Some((attr, helper)) = merged else {
                return wrap_value(buffer, directive, value, &format!("{prop}={{"), "}");
            };
            let normalize = ctx.helper(helper);
            let literal = string_literal(attr.value.as_ref().map_or("", |v| v.value.as_str()));
            buffer.remove(attr.span.lo(), attr.span.hi())?;
            ctx.handled_attributes.insert(attr.span);
            wrap_value(
                buffer,
                directive,
                value,
                &format!("{prop}={{{normalize}([{literal}, "),
                "])}",
            )
        }
    }
}

fn prop_name(directive: &Directive, name: &str) -> String {
    if directive.modifiers.iter().any(|m| m == "camel") {
        camelize(name)
    } else {
        name.to_string()
    }
}

fn model(item: &DirectiveItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let directive = &item.directive;
    let element = &item.element;
    let Some(value) = directive_value(directive) else {
        ctx.warn("v-model requires a value", directive.span);
        return remove(directive, buffer);
    };
    let target = qualify_expr(buffer, ctx, value, &item.locals)?;

    let (key, update, modifiers_key) = match &directive.arg {
        Some(DirectiveArg::Static { name, .. }) => {
            let prop = camelize(name);
            (
                string_literal(&prop),
                string_literal(&format!("onUpdate:{prop}")),
                Some(string_literal(&format!("{prop}Modifiers"))),
            )
        }
        Some(DirectiveArg::Dynamic(arg)) => {
            let key = qualified(ctx, arg, &item.locals);
            (format!("[{key}]"), format!("[`onUpdate:${{{key}}}`]"), None)
        }
        None => {
            let prop = default_model_prop(element);
            (
                string_literal(prop),
                string_literal(&format!("onUpdate:{prop}")),
                Some(string_literal("modelModifiers")),
            )
        }
    };
    let modifiers = match modifiers_key {
        Some(key) if element.kind != ElementKind::Native && !directive.modifiers.is_empty() => {
            format!(", {key}: {}", modifiers_object(&directive.modifiers))
        }
        _ => String::new(),
    };
    wrap_value(
        buffer,
        directive,
        value,
        &format!("{{...{{ {key}: "),
        &format!(", {update}: ($event: any) => {{ {target} = $event; }}{modifiers} }}}}"),
    )
}

/// The prop `v-model` binds without an argument.
fn default_model_prop(element: &ElementInfo) -> &'static str {
    match element.kind {
        ElementKind::Native => match element.input_type.as_deref() {
            Some("checkbox" | "radio") => "checked",
            _ => "value",
        },
        _ => "modelValue",
    }
}

/// `v-text`, `v-html` and `v-show`.
fn content(item: &DirectiveItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let directive = &item.directive;
    if item.element.kind != ElementKind::Native {
        return spread(item, buffer, ctx);
    }
    let Some(value) = directive_value(directive) else {
        ctx.warn(format!("v-{} requires a value", directive.name), directive.span);
        return remove(directive, buffer);
    };
    qualify_expr(buffer, ctx, value, &item.locals)?;
    let (head, tail) = match directive.name.as_str() {
        "text" => ("textContent={", "}"),
        "html" => ("innerHTML={", "}"),
        _ => ("hidden={!(", ")}"),
    };
    wrap_value(buffer, directive, value, head, tail)
}

/// `{...{ "v-name": value }}`
fn spread(item: &DirectiveItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let directive = &item.directive;
    let Some(value) = directive_value(directive) else {
        return remove(directive, buffer);
    };
    qualify_expr(buffer, ctx, value, &item.locals)?;
    let key = string_literal(&format!("v-{}", directive.name));
    wrap_value(buffer, directive, value, &format!("{{...{{ {key}: "), " }}")
}

fn custom(item: &DirectiveItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let directive = &item.directive;
    let symbol = ctx.helper(Helper::DirectiveSymbol);
    let binding = ctx.helper(Helper::DirectiveBinding);
    let accessor_name = format!("v{}", pascalize(&directive.name));
    let accessor = if ctx.script_bindings.contains(accessor_name.as_str()) {
        format!("{}.{accessor_name}", ctx.ctx_name())
    } else {
        "undefined".to_string()
    };

    let mut fields = Vec::new();
    match &directive.arg {
        Some(DirectiveArg::Static { name, .. }) => fields.push(format!("arg: {}", string_literal(name))),
        Some(DirectiveArg::Dynamic(arg)) => fields.push(format!("arg: {}", qualified(ctx, arg, &item.locals))),
        None => {}
    }
    if !directive.modifiers.is_empty() {
        fields.push(format!("modifiers: {}", modifiers_object(&directive.modifiers)));
    }
    let head = format!("{{...{{ [{symbol}]: () => {binding}({accessor}, {{ ");

    match directive_value(directive) {
        Some(value) => {
            qualify_expr(buffer, ctx, value, &item.locals)?;
            fields.push("value: ".to_string());
            wrap_value(buffer, directive, value, &format!("{head}{}", fields.join(", ")), " }) }}")
        }
        None => {
            let span = directive.span;
            buffer.overwrite(span.lo(), span.hi(), &format!("{head}{} }}) }}}}", fields.join(", ")))?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::template::test_support::{run, run_with};
    use crate::plugins::template::ElementPlugin;
    use pretty_assertions::assert_eq;

    fn lower(template: &str) -> String {
        run(template, vec![Box::new(ElementPlugin), Box::new(DirectivePlugin)])
    }

    #[test]
    fn test_bind() {
        assert_eq!(lower("<a :href=\"url\" :title></a>"), "<a href={ctx.url} title={ctx.title}></a>");
        assert_eq!(lower("<a v-bind=\"attrs\"/>"), "<a {...ctx.attrs}/>");
        assert_eq!(lower("<a :[key]=\"v\"/>"), "<a {...{[ctx.key]: ctx.v }}/>");
        assert_eq!(lower("<svg :view-box.camel=\"box\"/>"), "<svg viewBox={ctx.box}/>");
    }

    #[test]
    fn test_class_and_style_merge() {
        let out = lower("<div class=\"a b\" :class=\"{ c: on }\" style=\"color: red\" :style=\"s\"/>");
        assert_eq!(
            out,
            "<div  class={normalizeClass([\"a b\", { c: ctx.on }])}  style={normalizeStyle([\"color: red\", ctx.s])}/>"
        );
    }

    #[test]
    fn test_model() {
        assert_eq!(
            lower("<input v-model=\"text\">"),
            "<input {...{ \"value\": ctx.text, \"onUpdate:value\": ($event: any) => { ctx.text = $event; } }}>"
        );
        assert_eq!(
            lower("<input type=\"checkbox\" v-model=\"done\">"),
            "<input type=\"checkbox\" {...{ \"checked\": ctx.done, \"onUpdate:checked\": ($event: any) => { ctx.done = $event; } }}>"
        );
        assert_eq!(
            lower("<Field v-model:first-name.trim=\"name\"/>"),
            "<components.Field {...{ \"firstName\": ctx.name, \"onUpdate:firstName\": ($event: any) => { ctx.name = $event; }, \"firstNameModifiers\": { \"trim\": true } }}/>"
        );
    }

    #[test]
    fn test_content_directives() {
        assert_eq!(lower("<p v-text=\"msg\"/>"), "<p textContent={ctx.msg}/>");
        assert_eq!(lower("<p v-html=\"raw\"/>"), "<p innerHTML={ctx.raw}/>");
        assert_eq!(lower("<p v-show=\"open\" v-once v-cloak/>"), "<p hidden={!(ctx.open)} v-once v-cloak/>");
    }

    #[test]
    fn test_custom_directive() {
        let result = run_with(
            "<input v-focus:delay.lazy=\"100\" v-tooltip>",
            vec![Box::new(DirectivePlugin)],
            false,
            &["vFocus"],
        );
        assert_eq!(
            result.result,
            "<input {...{ [directiveSymbol]: () => directiveBinding(ctx.vFocus, { arg: \"delay\", modifiers: { \"lazy\": true }, value: 100 }) }} \
             {...{ [directiveSymbol]: () => directiveBinding(undefined, {  }) }}>"
        );
    }
}
