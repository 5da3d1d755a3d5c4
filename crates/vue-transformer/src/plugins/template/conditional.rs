use source_map::PatchBuffer;

use super::{directive_value, guard_prefix, qualify_expr, wrap_value};
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::items::{BranchKind, TemplateItem, TemplateItemKind};

/// Lowers a `v-if`/`v-else-if`/`v-else` chain to an `if` statement inside an
/// immediately invoked arrow function.
///
/// Each branch records the condition it runs under as a guard, so nested
/// callbacks can re-assert it when narrowing is enabled.
pub struct ConditionalPlugin;

impl Plugin<TemplateItem> for ConditionalPlugin {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[TemplateItemKind::Conditional])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        let TemplateItem::Conditional(chain) = item else {
            return Ok(());
        };
        let prefix = guard_prefix(ctx, chain.span);
        let mut negated: Vec<String> = Vec::new();
        let count = chain.branches.len();

        for (i, branch) in chain.branches.iter().enumerate() {
            let directive = &branch.directive;
            let element = &branch.element;
            let head = match branch.kind {
                BranchKind::If => format!("{{(() => {{ {prefix}if ("),
                BranchKind::ElseIf | BranchKind::Else => " else if (".to_string(),
            };

            let condition = match (branch.kind, directive_value(directive)) {
                (BranchKind::Else, _) => {
                    buffer.overwrite(directive.span.lo(), directive.span.hi(), " else { ")?;
                    None
                }
                (_, Some(value)) => {
                    let text = qualify_expr(buffer, ctx, value, &chain.locals)?;
                    wrap_value(buffer, directive, value, &head, ") { ")?;
                    Some(text)
                }
                (_, None) => {
                    ctx.warn(format!("v-{} requires a value", directive.name), directive.span);
                    buffer.overwrite(directive.span.lo(), directive.span.hi(), &format!("{head}undefined) {{ "))?;
                    Some("undefined".to_string())
                }
            };
            buffer.move_range(directive.span.lo(), directive.span.hi(), element.start_tag.lo())?;

            if i > 0 {
                let previous = chain.branches[i - 1].element.span.hi();
                if element.span.lo() > previous {
                    buffer.remove(previous, element.span.lo())?;
                }
            }
            let close = if i + 1 == count { " } })()}" } else { " }" };
            buffer.prepend_left(element.span.hi(), close)?;

            let mut guard = negated.clone();
            if let Some(condition) = condition {
                guard.push(format!("({condition})"));
                negated.push(format!("!({condition})"));
            }
            ctx.guards.push((element.span, guard.join(" && ")));
        }
        tracing::trace!(branches = count, "lowered conditional");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::template::test_support::{run, run_with};
    use crate::plugins::template::{InterpolationPlugin, LoopPlugin};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_if_else_if_else() {
        let out = run(
            "<div v-if=\"a\">A</div>\n<!-- between -->\n<p v-else-if=\"b > 1\">B</p>\n<span v-else>C</span>",
            vec![Box::new(ConditionalPlugin)],
        );
        assert_eq!(
            out,
            "{(() => { if (ctx.a) { <div >A</div> } else if (ctx.b > 1) { <p >B</p> } else { <span >C</span> } })()}"
        );
    }

    #[test]
    fn test_branch_guards() {
        let result = run_with(
            "<div v-if=\"a\"/><p v-else-if=\"b\"/><i v-else/>",
            vec![Box::new(ConditionalPlugin)],
            false,
            &[],
        );
        let guards: Vec<&str> = result.context.guards.iter().map(|(_, g)| g.as_str()).collect();
        assert_eq!(guards, ["(ctx.a)", "!(ctx.a) && (ctx.b)", "!(ctx.a) && !(ctx.b)"]);
    }

    #[test]
    fn test_nested_chain_is_narrowed() {
        let result = run_with(
            "<div v-if=\"user\"><li v-for=\"item in user.items\">{{ item }}</li></div>",
            vec![
                Box::new(ConditionalPlugin),
                Box::new(LoopPlugin),
                Box::new(InterpolationPlugin),
            ],
            true,
            &[],
        );
        insta::assert_snapshot!(result.result, @"{(() => { if (ctx.user) { <div >{renderList(ctx.user.items, (item) => { if (!((ctx.user))) return; <li >{ item }</li>; })}</div> } })()}");
    }

    #[test]
    fn test_missing_condition_warns() {
        let result = run_with("<div v-if></div>", vec![Box::new(ConditionalPlugin)], false, &[]);
        assert_eq!(result.result, "{(() => { if (undefined) { <div ></div> } })()}");
        assert_eq!(result.context.diagnostics.len(), 1);
    }
}
