use source_map::PatchBuffer;

use super::{component_expr, directive_value, guard_prefix, qualified, wrap_value};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{ElementInfo, SlotItem, SlotKind, SlotName, TemplateItem, TemplateItemKind};
use crate::util::string_literal;

/// Lowers slot outlets and slot content.
///
/// An outlet `<slot name="row" :item="x">` renders a functional component
/// typed from `$slots.row`. Slot content, whether `<template #row="props">`
/// children or `v-slot` on the component itself, becomes a `v-slot` callback
/// on the component that receives its instance and renders each slot from
/// the instance's `$slots`, so slot props are typed by the component.
pub struct SlotPlugin;

impl Plugin<TemplateItem> for SlotPlugin {
    fn name(&self) -> &'static str {
        "slot"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Slot])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Slot(slot) = item else {
            return Ok(());
        };
        match &slot.kind {
            SlotKind::Outlet { name_attribute } => outlet(slot, *name_attribute, buffer, ctx),
            SlotKind::Template {
                component,
                index,
                count,
            } => slot_template(slot, component, *index, *count, buffer, ctx),
            SlotKind::Component => component_slot(slot, buffer, ctx),
        }
    }
}

fn outlet(
    slot: &SlotItem,
    name_attribute: Option<source_map::Span>,
    buffer: &mut PatchBuffer,
    ctx: &mut ProcessContext,
) -> TransformResult<()> {
    let element = &slot.element;
    let local = format!("{}{}", ctx.name("slotComponent"), ctx.next_id());
    let helper = ctx.helper(Helper::SlotComponent);
    let base = format!("{}.$slots", ctx.ctx_name());
    let access = slot_access(ctx, &base, &slot.name, &slot.locals);
    let prefix = guard_prefix(ctx, element.span);

    buffer.append_right(
        element.start_tag.lo(),
        &format!("{{(() => {{ {prefix}const {local} = {helper}({access}); return "),
    )?;
    buffer.overwrite(element.name_span.lo(), element.name_span.hi(), &local)?;
    if let Some(end) = element.end_name_span() {
        buffer.overwrite(end.lo(), end.hi(), &local)?;
    }
    if let Some(span) = name_attribute {
        buffer.remove(span.lo(), span.hi())?;
    }
    buffer.prepend_left(element.span.hi(), " })()}")?;
    Ok(())
}

fn slot_template(
    slot: &SlotItem,
    component: &ElementInfo,
    index: usize,
    count: usize,
    buffer: &mut PatchBuffer,
    ctx: &mut ProcessContext,
) -> TransformResult<()> {
    let element = &slot.element;
    let instance = ctx.name("instance");
    let render = ctx.helper(Helper::RenderSlot);
    let access = slot_access(ctx, &format!("{instance}.$slots"), &slot.name, &slot.locals);
    let prefix = guard_prefix(ctx, element.span);
    let start = element.start_tag;
    let body = match element.end_tag {
        Some(_) => format!(") => {{ {prefix}<>"),
        None => format!(") => {{ {prefix}<></>; }});"),
    };

    match slot.params().filter(|v| !v.content.trim().is_empty()) {
        Some(params) if params.span.lo() > start.lo() && params.span.hi() < start.hi() => {
            buffer.overwrite(start.lo(), params.span.lo(), &format!("{render}({access}, ("))?;
            buffer.overwrite(params.span.hi(), start.hi(), &body)?;
        }
        _ => buffer.overwrite(start.lo(), start.hi(), &format!("{render}({access}, ({body}"))?,
    }
    if let Some(end) = element.end_tag {
        buffer.overwrite(end.lo(), end.hi(), "</>; });")?;
    }

    if index == 0 {
        let instance_type = instance_type(ctx, component);
        buffer.prepend_right(element.span.lo(), &format!(" v-slot={{({instance}: {instance_type}) => {{ "))?;
    }
    if index + 1 == count {
        buffer.append_left(element.span.hi(), " }}")?;
    }
    buffer.move_range(element.span.lo(), element.span.hi(), component.start_tag.hi() - 1)?;
    Ok(())
}

fn component_slot(slot: &SlotItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
    let Some(directive) = &slot.directive else {
        return Ok(());
    };
    let component = &slot.element;
    let instance = ctx.name("instance");
    let render = ctx.helper(Helper::RenderSlot);
    let access = slot_access(ctx, &format!("{instance}.$slots"), &slot.name, &slot.locals);
    let instance_type = instance_type(ctx, component);
    let prefix = guard_prefix(ctx, component.span);

    let head = format!("v-slot={{({instance}: {instance_type}) => {{ {render}({access}, (");
    let tail = format!(") => {{ {prefix}<>");
    match directive_value(directive) {
        Some(params) => wrap_value(buffer, directive, params, &head, &tail)?,
        None => buffer.overwrite(directive.span.lo(), directive.span.hi(), &format!("{head}{tail}"))?,
    }
    if let Some(end) = component.end_tag {
        let content = component.start_tag.hi();
        if end.lo() > content {
            buffer.move_range(content, end.lo(), directive.span.hi())?;
        }
    }
    buffer.prepend_right(directive.span.hi(), "</>; }); }}")?;
    Ok(())
}

/// `base["name"]`, or `base[expr]` for dynamic names.
fn slot_access(ctx: &mut ProcessContext, base: &str, name: &SlotName, locals: &[smol_str::SmolStr]) -> String {
    match name {
        SlotName::Default => format!("{base}[\"default\"]"),
        SlotName::Static(name) => format!("{base}[{}]", string_literal(name)),
        SlotName::Dynamic(expr) => format!("{base}[{}]", qualified(ctx, expr, locals)),
    }
}

fn instance_type(ctx: &mut ProcessContext, component: &ElementInfo) -> String {
    match component_expr(ctx, component) {
        Some(expr) => format!("{}<typeof {expr}>", ctx.helper(Helper::InstanceOf)),
        None => "any".to_string(),
    }
}
