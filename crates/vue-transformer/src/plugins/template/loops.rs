use source_map::PatchBuffer;

use super::{guard_prefix, qualify_expr};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::helpers::Helper;
use crate::items::{TemplateItem, TemplateItemKind};

/// Lowers `v-for="alias in source"` to `{renderList(source, (alias) => { ... })}`.
pub struct LoopPlugin;

impl Plugin<TemplateItem> for LoopPlugin {
    fn name(&self) -> &'static str {
        "loop"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Loop])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Loop(l) = item else {
            return Ok(());
        };
        let prefix = guard_prefix(ctx, l.span);
        let render_list = ctx.helper(Helper::RenderList);
        let (directive, aliases, source) = (l.directive.span, l.aliases.span, l.source.span);
        let start = l.element.start_tag.lo();

        qualify_expr(buffer, ctx, &l.source, &l.locals)?;
        buffer.move_range(source.lo(), source.hi(), start)?;
        buffer.prepend_right(source.lo(), &format!("{{{render_list}("))?;

        let open_paren = if l.aliases.content.starts_with('(') { ", " } else { ", (" };
        let close_paren = if l.aliases.content.starts_with('(') { "" } else { ")" };
        buffer.overwrite(directive.lo(), aliases.lo(), open_paren)?;
        buffer.overwrite(aliases.hi(), source.lo(), &format!("{close_paren} => {{ {prefix}"))?;
        buffer.move_range(directive.lo(), source.lo(), start)?;
        if directive.hi() > source.hi() {
            buffer.remove(source.hi(), directive.hi())?;
        }
        buffer.prepend_left(l.element.span.hi(), "; })}")?;
        tracing::trace!(aliases = ?l.alias_names, "lowered loop");
        Ok(())
    }
}
