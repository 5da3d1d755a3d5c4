use source_map::PatchBuffer;
use vue_parser::DirectiveArg;

use super::{analyze_handler_or_warn, directive_value, guard_prefix, qualified, qualify_expr, wrap_value};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::expression::{qualify, ExprShape};
use crate::helpers::Helper;
use crate::items::{TemplateItem, TemplateItemKind};
use crate::util::{is_simple_identifier, string_literal, to_handler_key};

/// Event listener modifiers that change the handler key.
const KEY_MODIFIERS: &[(&str, &str)] = &[("once", "Once"), ("capture", "Capture"), ("passive", "Passive")];

/// Lowers `@event="handler"` to an `onEvent` prop.
///
/// Function references pass through as written. Inline statements are
/// wrapped in a callback taking `$event`.
pub struct EventPlugin;

impl Plugin<TemplateItem> for EventPlugin {
    fn name(&self) -> &'static str {
        "event"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Directive])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Directive(item) = item else {
            return Ok(());
        };
        let directive = &item.directive;
        if directive.name != "on" || ctx.handled_attributes.contains(&directive.span) {
            return Ok(());
        }
        let Some(value) = directive_value(directive) else {
            buffer.remove(directive.span.lo(), directive.span.hi())?;
            return Ok(());
        };

        let Some(arg) = &directive.arg else {
            qualify_expr(buffer, ctx, value, &item.locals)?;
            return wrap_value(buffer, directive, value, "{...", "}");
        };

        let (callback_head, callback_tail) = match analyze_handler_or_warn(ctx, value, &item.locals) {
            Some(analysis) => {
                qualify(buffer, &analysis, &ctx.ctx_name())?;
                match analysis.shape {
                    ExprShape::Identifier | ExprShape::Member | ExprShape::Function => (String::new(), ""),
                    ExprShape::Other | ExprShape::Statements => {
                        let callback = ctx.helper(Helper::EventCallback);
                        let prefix = guard_prefix(ctx, directive.span);
                        (format!("{callback}((...[$event]: any[]) => {{ {prefix}"), "; })")
                    }
                }
            }
            None => (String::new(), ""),
        };

        let suffix: String = KEY_MODIFIERS
            .iter()
            .filter(|(modifier, _)| directive.modifiers.iter().any(|m| m == modifier))
            .map(|(_, suffix)| *suffix)
            .collect();
        let (head, tail) = match arg {
            DirectiveArg::Static { name, .. } => {
                let key = format!("{}{suffix}", to_handler_key(name));
                if suffix.is_empty() && is_simple_identifier(&key) {
                    (format!("{key}={{{callback_head}"), format!("{callback_tail}}}"))
                } else {
                    (
                        format!("{{...{{ {}: {callback_head}", string_literal(&key)),
                        format!("{callback_tail} }}}}"),
                    )
                }
            }
            DirectiveArg::Dynamic(event) => {
                let event = qualified(ctx, event, &item.locals);
                (
                    format!("{{...{{ [`on${{{event}}}{suffix}`]: {callback_head}"),
                    format!("{callback_tail} }}}}"),
                )
            }
        };
        wrap_value(buffer, directive, value, &head, &tail)
    }
}
