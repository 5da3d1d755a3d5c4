//! Plugins of the template pipeline.
//!
//! Together they lower the template into the body of a render function
//! returning a TSX fragment. Elements stay in place; structural directives
//! are moved in front of the element they belong to and closed after it:
//!
//! ```text
//! <li v-if="ok" v-for="item in items">{{ item }}</li>
//! // becomes
//! {(() => { if (ctx.ok) { {renderList(ctx.items, (item) => { return <li >{ item }</li>; })} } })()}
//! ```
//!
//! Openers are moved to the element's start, closers are prepended to the
//! element's end, so the first plugin to visit an element owns the
//! outermost wrapper.

mod conditional;
mod directives;
mod element;
mod events;
mod interpolation;
mod loops;
mod render;
mod slots;

pub use conditional::ConditionalPlugin;
pub use directives::DirectivePlugin;
pub use element::ElementPlugin;
pub use events::EventPlugin;
pub use interpolation::InterpolationPlugin;
pub use loops::LoopPlugin;
pub use render::RenderPlugin;
pub use slots::SlotPlugin;

use smol_str::SmolStr;
use source_map::{PatchBuffer, Span};
use vue_parser::{Directive, Expression, StaticAttribute};

use crate::context::ProcessContext;
use crate::engine::TransformResult;
use crate::expression::{analyze, analyze_handler, qualified_text, qualify, ExprAnalysis};
use crate::items::ElementInfo;
use crate::util::{is_simple_identifier, pascalize};

/// The directive's value, unless it is missing or blank.
pub(crate) fn directive_value(directive: &Directive) -> Option<&Expression> {
    directive.value.as_ref().filter(|v| !v.content.trim().is_empty())
}

/// Rewrites a directive attribute to `head VALUE tail`, keeping the value
/// text in place.
pub(crate) fn wrap_value(
    buffer: &mut PatchBuffer,
    directive: &Directive,
    value: &Expression,
    head: &str,
    tail: &str,
) -> TransformResult<()> {
    let (d, v) = (directive.span, value.span);
    if v.lo() > d.lo() {
        buffer.overwrite(d.lo(), v.lo(), head)?;
    } else {
        buffer.prepend_right(v.lo(), head)?;
    }
    if v.hi() < d.hi() {
        buffer.overwrite(v.hi(), d.hi(), tail)?;
    } else {
        buffer.append_left(v.hi(), tail)?;
    }
    Ok(())
}

/// Parses `expr`, warning when it does not parse.
pub(crate) fn analyze_or_warn(ctx: &mut ProcessContext, expr: &Expression, locals: &[SmolStr]) -> Option<ExprAnalysis> {
    match analyze(expr, ctx.is_typed, locals) {
        Ok(analysis) => Some(analysis),
        Err(error) => {
            ctx.warn(format!("invalid expression: {}", error.kind), expr.span);
            None
        }
    }
}

/// Like [`analyze_or_warn`] for event handlers, which may be statements.
pub(crate) fn analyze_handler_or_warn(
    ctx: &mut ProcessContext,
    expr: &Expression,
    locals: &[SmolStr],
) -> Option<ExprAnalysis> {
    match analyze_handler(expr, ctx.is_typed, locals) {
        Ok(analysis) => Some(analysis),
        Err(error) => {
            ctx.warn(format!("invalid event handler: {}", error.kind), expr.span);
            None
        }
    }
}

/// Qualifies `expr` in the buffer and returns its qualified text.
///
/// An expression that does not parse is left as written.
pub(crate) fn qualify_expr(
    buffer: &mut PatchBuffer,
    ctx: &mut ProcessContext,
    expr: &Expression,
    locals: &[SmolStr],
) -> TransformResult<String> {
    let Some(analysis) = analyze_or_warn(ctx, expr, locals) else {
        return Ok(expr.content.trim().to_string());
    };
    qualify(buffer, &analysis, &ctx.ctx_name())?;
    Ok(qualified_text(expr, &analysis, &ctx.ctx_name()))
}

/// The qualified text of `expr` without touching the buffer.
pub(crate) fn qualified(ctx: &mut ProcessContext, expr: &Expression, locals: &[SmolStr]) -> String {
    match analyze_or_warn(ctx, expr, locals) {
        Some(analysis) => qualified_text(expr, &analysis, &ctx.ctx_name()),
        None => expr.content.trim().to_string(),
    }
}

/// `if (!(a && b)) return; ` re-asserting the conditions around `span`.
///
/// Empty unless narrowing is enabled.
pub(crate) fn guard_prefix(ctx: &ProcessContext, span: Span) -> String {
    if !ctx.narrow {
        return String::new();
    }
    let guards: Vec<&str> = ctx
        .guards
        .iter()
        .filter(|(scope, _)| scope.contains_span(span))
        .map(|(_, guard)| guard.as_str())
        .collect();
    if guards.is_empty() {
        String::new()
    } else {
        format!("if (!({})) return; ", guards.join(" && "))
    }
}

/// The expression a component tag resolves to, e.g. `components.MyButton`.
///
/// `None` when the name is not a valid member path.
pub(crate) fn component_expr(ctx: &ProcessContext, element: &ElementInfo) -> Option<String> {
    let name = element.component.as_deref()?;
    let components = ctx.name("components");
    if name.split('.').all(is_simple_identifier) {
        return Some(format!("{components}.{name}"));
    }
    let pascal = pascalize(name);
    is_simple_identifier(&pascal).then(|| format!("{components}.{pascal}"))
}

/// Renames an element's start and end tag.
pub(crate) fn rename_tag(buffer: &mut PatchBuffer, element: &ElementInfo, name: &str) -> TransformResult<()> {
    buffer.overwrite(element.name_span.lo(), element.name_span.hi(), name)?;
    if let Some(end) = element.end_name_span() {
        buffer.overwrite(end.lo(), end.hi(), name)?;
    }
    Ok(())
}

/// Quotes an unquoted attribute value: `type=checkbox` -> `type="checkbox"`.
pub(crate) fn quote_static(buffer: &mut PatchBuffer, attr: &StaticAttribute) -> TransformResult<()> {
    let Some(value) = &attr.value else {
        return Ok(());
    };
    let lo = value.span.lo();
    if lo == 0 {
        return Ok(());
    }
    let before = buffer.slice(Span::new(lo - 1, lo));
    if before == "\"" || before == "'" {
        return Ok(());
    }
    let quote = if value.value.contains('"') { "'" } else { "\"" };
    buffer.prepend_right(lo, quote)?;
    buffer.append_left(value.span.hi(), quote)?;
    Ok(())
}

/// `{ "a": true, "b": true }`
pub(crate) fn modifiers_object(modifiers: &[SmolStr]) -> String {
    let entries: Vec<String> = modifiers
        .iter()
        .map(|m| format!("{}: true", crate::util::string_literal(m)))
        .collect();
    format!("{{ {} }}", entries.join(", "))
}
