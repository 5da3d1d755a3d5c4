use source_map::PatchBuffer;

use super::{component_expr, quote_static, rename_tag};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{ElementKind, TemplateItem, TemplateItemKind};
use crate::util::string_literal;

/// Resolves tags: components to `components.Name`, `<component>` to the
/// dynamic component helper, and plain `<template>` wrappers to fragments.
pub struct ElementPlugin;

impl Plugin<TemplateItem> for ElementPlugin {
    fn name(&self) -> &'static str {
        "element"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Element])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Element(item) = item else {
            return Ok(());
        };
        let element = &item.element;

        if element.kind == ElementKind::Fragment {
            ctx.handled_attributes.extend(item.attributes.iter().map(|a| a.span));
            ctx.handled_attributes.extend(item.children.iter().filter_map(|child| match child {
                TemplateItem::Directive(d) => Some(d.directive.span),
                _ => None,
            }));
            let start = element.start_tag;
            match element.end_tag {
                Some(end) => {
                    buffer.overwrite(start.lo(), start.hi(), "<>")?;
                    buffer.overwrite(end.lo(), end.hi(), "</>")?;
                }
                None if element.self_closing => buffer.overwrite(start.lo(), start.hi(), "<></>")?,
                None => {
                    buffer.overwrite(start.lo(), start.hi(), "<>")?;
                    buffer.append_left(element.span.hi(), "</>")?;
                }
            }
            return Ok(());
        }

        for attr in &item.attributes {
            quote_static(buffer, attr)?;
        }
        match element.kind {
            ElementKind::Dynamic => {
                let name = ctx.helper(Helper::DynamicComponent);
                rename_tag(buffer, element, &name)?;
            }
            ElementKind::Component => match component_expr(ctx, element) {
                Some(expr) => rename_tag(buffer, element, &expr)?,
                None => {
                    let local = ctx.name("component");
                    let name = element.component.as_deref().unwrap_or(&element.name);
                    buffer.append_right(
                        element.start_tag.lo(),
                        &format!(
                            "{{(() => {{ const {local} = ({} as Record<string, any>)[{}]; return ",
                            ctx.name("components"),
                            string_literal(name)
                        ),
                    )?;
                    rename_tag(buffer, element, &local)?;
                    buffer.prepend_left(element.span.hi(), " })()}")?;
                }
            },
            ElementKind::Native | ElementKind::Fragment => {}
        }
        Ok(())
    }
}
