use source_map::PatchBuffer;

use crate::context::ProcessContext;
use crate::engine::{Enforce, PipelineItem, Plugin, TransformResult};

/// Declares every helper the run used and nobody declared yet.
pub struct HelpersPlugin;

impl<I: PipelineItem> Plugin<I> for HelpersPlugin {
    fn name(&self) -> &'static str {
        "helpers"
    }

    fn enforce(&self) -> Option<Enforce> {
        Some(Enforce::Post)
    }

    fn post(&self, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let pending: Vec<_> = ctx
            .used_helpers
            .iter()
            .copied()
            .filter(|h| !ctx.declared_helpers.contains(h))
            .collect();
        if pending.is_empty() {
            return Ok(());
        }
        buffer.append("\n");
        for helper in pending {
            buffer.append(&helper.declaration(&ctx.name(helper.base_name())));
            ctx.declared_helpers.insert(helper);
        }
        tracing::trace!(declared = ctx.declared_helpers.len(), "declared helpers");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextOptions;
    use crate::engine::process_script;
    use crate::engine::ScriptPlugin;
    use crate::helpers::Helper;

    #[test]
    fn test_declares_each_helper_once() {
        let mut options = ContextOptions::new(PatchBuffer::new("x"));
        options.used_helpers.insert(Helper::Unref);
        options.used_helpers.insert(Helper::ExtractValue);
        options.declared_helpers.insert(Helper::Unref);
        let plugins: Vec<ScriptPlugin> = vec![Box::new(HelpersPlugin)];
        let result = process_script(&[], &plugins, &options).unwrap();
        insta::assert_snapshot!(result.result.trim_end(), @r"
        x
        declare function ___GENERATED___extractValue<T>(value: T): T;
        ");
        assert!(result.context.declared_helpers.contains(&Helper::ExtractValue));
    }
}
