use source_map::PatchBuffer;

use crate::context::ProcessContext;
use crate::engine::{Enforce, Plugin, TransformResult};
use crate::items::TemplateItem;

/// Turns the `<template>` block into a render function returning a fragment.
pub struct RenderPlugin;

impl Plugin<TemplateItem> for RenderPlugin {
    fn name(&self) -> &'static str {
        "render"
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Pre)
    }

    fn pre(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let Some(block) = ctx.template_block().cloned() else {
            return Ok(());
        };
        if let Some(lang) = block.lang.as_deref().filter(|lang| *lang != "html") {
            ctx.warn(format!("template language `{lang}` is not supported"), block.open_tag);
            let comment = format!("/* {} */", ctx.block_name(&block));
            buffer.overwrite(block.span.lo(), block.span.hi(), &comment)?;
            return Ok(());
        }

        let (defs, refs) = (ctx.generic_defs(), ctx.generic_refs());
        let header = format!(
            "function {}{defs}({}: {}{refs}, {}: {}{refs}) {{\nreturn <>",
            ctx.name("render"),
            ctx.ctx_name(),
            ctx.name("TemplateBinding"),
            ctx.name("components"),
            ctx.name("Components"),
        );
        buffer.overwrite(block.open_tag.lo(), block.open_tag.hi(), &header)?;
        match block.close_tag {
            Some(close) => buffer.overwrite(close.lo(), close.hi(), "</>;\n}")?,
            None => buffer.append_left(block.span.hi(), "</>;\n}")?,
        }
        Ok(())
    }
}
