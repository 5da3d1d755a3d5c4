use source_map::PatchBuffer;
use vue_parser::BlockKind;

use crate::context::ProcessContext;
use crate::engine::{Enforce, Handles, Plugin, TransformResult};
use crate::items::{ScriptItem, ScriptItemKind};

/// Lays out the blocks of the component as one module.
///
/// Custom blocks become comments, secondary scripts lose their tags, and the
/// gaps between blocks collapse to a newline. For `<script setup>`, imports
/// and exported types are hoisted above the setup function.
pub struct ScriptBlockPlugin;

impl Plugin<ScriptItem> for ScriptBlockPlugin {
    fn name(&self) -> &'static str {
        "script-block"
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Pre)
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[ScriptItemKind::Import, ScriptItemKind::Export])
    }

    fn pre(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let setup = ctx.is_setup();
        let mut cursor = 0u32;
        for block in &ctx.blocks {
            let (start, end) = (block.span.lo(), block.span.hi());
            if start > cursor {
                if cursor == 0 {
                    buffer.remove(cursor, start)?;
                } else {
                    buffer.overwrite(cursor, start, "\n")?;
                }
            }
            cursor = cursor.max(end);

            match block.kind {
                BlockKind::Template => {}
                BlockKind::Other => {
                    buffer.overwrite(start, end, &format!("/* {} */", ctx.block_name(block)))?;
                }
                BlockKind::Script if block.is_main_script && setup => {}
                BlockKind::Script => {
                    buffer.remove(block.open_tag.lo(), block.open_tag.hi())?;
                    if let Some(close) = block.close_tag {
                        buffer.remove(close.lo(), close.hi())?;
                    }
                }
            }
        }
        if cursor > 0 && cursor < buffer.len() {
            buffer.overwrite(cursor, buffer.len(), "\n")?;
        }
        tracing::trace!(blocks = ctx.blocks.len(), "laid out blocks");
        Ok(())
    }

    fn transform(&self, item: &ScriptItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        if !ctx.is_setup() {
            return Ok(());
        }
        let span = match item {
            ScriptItem::Import(import) => import.span,
            ScriptItem::Export(export) if export.type_only => export.span,
            _ => return Ok(()),
        };
        let Some(open) = ctx.main_script().map(|b| b.open_tag) else {
            return Ok(());
        };
        buffer.move_range(span.lo(), span.hi(), open.lo())?;
        buffer.append_left(span.hi(), "\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::{process_script, ScriptPlugin};
    use crate::items::extract_script_items;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        let parsed = vue_parser::parse(source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let options = ContextOptions::from_parse(&parsed);
        let plugins: Vec<ScriptPlugin> = vec![Box::new(ScriptBlockPlugin)];
        process_script(&items, &plugins, &options).unwrap().result
    }

    #[test]
    fn test_hoists_imports_out_of_setup() {
        let out = run("<script setup>\nimport { ref } from 'vue'\nconst a = ref(1)\n</script>");
        assert_eq!(out, "import { ref } from 'vue'\n<script setup>\n\nconst a = ref(1)\n</script>");
    }

    #[test]
    fn test_custom_blocks_and_secondary_scripts() {
        let out = run("<script>export const x = 1</script>\n\n<style>.a{}</style>\n<script setup>let b</script>\n");
        assert_eq!(out, "export const x = 1\n/* <style> */\n<script setup>let b</script>\n");
    }
}
