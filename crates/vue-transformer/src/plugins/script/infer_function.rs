use source_map::PatchBuffer;

use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::facts::Target;
use crate::items::{BindingKind, ScriptItem, ScriptItemKind};
use crate::util::to_handler_key;

/// Types the parameters of unannotated functions used as template event
/// handlers from the event they handle.
///
/// `function onClick(e) {}` bound with `@click="onClick"` on a `<button>`
/// becomes `function onClick(...[e]: [HTMLElementEventMap["click"]]) {}`.
pub struct InferFunctionPlugin;

impl Plugin<ScriptItem> for InferFunctionPlugin {
    fn name(&self) -> &'static str {
        "infer-function"
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[ScriptItemKind::Declaration])
    }

    fn transform(&self, item: &ScriptItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        if !ctx.is_typed {
            return Ok(());
        }
        let ScriptItem::Declaration(decl) = item else {
            return Ok(());
        };
        if decl.kind != BindingKind::Function {
            return Ok(());
        }
        let Some(function) = &decl.function else {
            return Ok(());
        };
        if function.params.is_empty() || function.params.iter().any(|p| p.annotated) {
            return Ok(());
        }
        let Some(handler) = ctx.template.handlers_for(&decl.name).next() else {
            return Ok(());
        };

        let tuple = match &handler.target {
            Target::Element(_) => format!("[HTMLElementEventMap[\"{}\"]]", handler.event),
            Target::Component(component) => {
                let root = component.split('.').next().unwrap_or(component);
                if !ctx.script_bindings.contains(root) {
                    return Ok(());
                }
                format!(
                    "Parameters<NonNullable<InstanceType<typeof {component}>[\"$props\"][\"{}\"]>>",
                    to_handler_key(&handler.event)
                )
            }
            Target::Unknown => return Ok(()),
        };
        let Some(params) = function.params_span() else {
            return Ok(());
        };
        buffer.prepend_right(params.lo(), "...[")?;
        buffer.append_left(params.hi(), &format!("]: {tuple}"))?;
        tracing::trace!(function = %decl.name, event = %handler.event, "inferred handler parameters");
        Ok(())
    }
}
