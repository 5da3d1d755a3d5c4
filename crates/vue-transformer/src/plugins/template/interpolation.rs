use source_map::{PatchBuffer, Span};

use super::qualify_expr;
use crate::context::ProcessContext;
use crate::engine::{Handles, Plugin, TransformResult};
use crate::items::{TemplateItem, TemplateItemKind};

/// Lowers template text: `{{ expr }}` to `{expr}`, comments to JSX comments,
/// and escapes characters that are not valid in JSX text.
pub struct InterpolationPlugin;

impl Plugin<TemplateItem> for InterpolationPlugin {
    fn name(&self) -> &'static str {
        "interpolation"
    }

    fn handles(&self) -> Handles<TemplateItemKind> {
        Handles::Kinds(&[
            TemplateItemKind::Interpolation,
            TemplateItemKind::Text,
            TemplateItemKind::Comment,
        ])
    }

    fn transform(&self, item: &TemplateItem, buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        match item {
            TemplateItem::Interpolation(interp) => {
                let (lo, hi) = (interp.span.lo(), interp.span.hi());
                buffer.overwrite(lo, lo + 2, "{")?;
                if hi >= lo + 4 && buffer.slice(Span::new(hi - 2, hi)) == "}}" {
                    buffer.overwrite(hi - 2, hi, "}")?;
                } else {
                    ctx.warn("unterminated interpolation", interp.span);
                    buffer.append_left(hi, "}")?;
                }
                if !interp.expression.content.trim().is_empty() {
                    qualify_expr(buffer, ctx, &interp.expression, &interp.locals)?;
                }
            }
            TemplateItem::Text(text) => {
                let base = text.span.lo();
                let escapes: Vec<(u32, char)> = buffer
                    .slice(text.span)
                    .char_indices()
                    .filter(|(_, c)| matches!(c, '{' | '}' | '<' | '>'))
                    .map(|(offset, c)| (base + offset as u32, c))
                    .collect();
                for (at, c) in escapes {
                    buffer.overwrite(at, at + 1, &format!("{{\"{c}\"}}"))?;
                }
            }
            TemplateItem::Comment(comment) => {
                let (lo, hi) = (comment.span.lo(), comment.span.hi());
                let body = buffer.slice(comment.span);
                if hi - lo < 7 || body.contains("*/") || !body.ends_with("-->") {
                    buffer.overwrite(lo, hi, "{/* */}")?;
                } else {
                    buffer.overwrite(lo, lo + 4, "{/*")?;
                    buffer.overwrite(hi - 3, hi, "*/}")?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::template::test_support::run;
    use pretty_assertions::assert_eq;

    fn lower(template: &str) -> String {
        run(template, vec![Box::new(InterpolationPlugin)])
    }

    #[test]
    fn test_interpolation() {
        assert_eq!(lower("<p>{{ count + 1 }} of {{total}}</p>"), "<p>{ ctx.count + 1 } of {ctx.total}</p>");
        assert_eq!(lower("<p>{{ Math.max(a, 1) }}</p>"), "<p>{ Math.max(ctx.a, 1) }</p>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(lower("<p>a > b {c}</p>"), "<p>a {\">\"} b {\"{\"}c{\"}\"}</p>");
    }

    #[test]
    fn test_pre_content_stays_text() {
        assert_eq!(
            lower("<p v-pre>{{ a }}<b>x</b></p>"),
            r#"<p v-pre>{"{"}{"{"} a {"}"}{"}"}{"<"}b{">"}x{"<"}/b{">"}</p>"#
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(lower("<div><!-- note --></div>"), "<div>{/* note */}</div>");
        assert_eq!(lower("<div><!-- a */ b --></div>"), "<div>{/* */}</div>");
    }
}
