//! Template expression analysis and identifier qualification.
//!
//! Template expressions read component state implicitly. The generated render
//! function receives that state as a context parameter, so every free
//! identifier must be rewritten to a property access on it: `count + 1`
//! becomes `___ctx.count + 1`. Parameters, locals introduced by `v-for` and
//! slot props, and well-known globals are left alone.

use smol_str::SmolStr;
use source_map::{PatchBuffer, PatchError, Span};
use swc_ecma_ast::{
    ArrowExpr, CatchClause, Expr, FnExpr, Function, Ident, Prop, SimpleAssignTarget, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};
use vue_parser::{parse_expression, parse_script, Expression, ParseError, SpanConverter};

use crate::util::{collect_pattern_names, is_global_allowed};

/// A free identifier inside an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentRef {
    pub name: SmolStr,
    pub span: Span,
    /// `{ name }` object shorthand; qualifying it needs an explicit key.
    pub shorthand: bool,
}

/// The top-level form of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprShape {
    Identifier,
    Member,
    Function,
    Other,
    /// Not an expression; parsed as a statement list (event handlers only).
    Statements,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprAnalysis {
    /// Free identifiers, in source order.
    pub refs: Vec<IdentRef>,
    pub shape: ExprShape,
    /// Whether `$event` is referenced.
    pub uses_event: bool,
}

impl ExprAnalysis {
    /// The single free identifier of a bare-identifier expression.
    pub fn identifier(&self) -> Option<&SmolStr> {
        match (self.shape, self.refs.as_slice()) {
            (ExprShape::Identifier, [only]) => Some(&only.name),
            _ => None,
        }
    }
}

/// Parses `expr` and collects its free identifiers.
pub fn analyze(expr: &Expression, typed: bool, locals: &[SmolStr]) -> Result<ExprAnalysis, ParseError> {
    let parsed = parse_expression(&expr.content, typed, expr.span.lo())?;
    let mut collector = RefCollector::new(parsed.spans, locals);
    parsed.expr.visit_with(&mut collector);
    Ok(collector.finish(shape_of(&parsed.expr)))
}

/// Like [`analyze`], but accepts a statement list such as `a++; b()`.
pub fn analyze_handler(
    expr: &Expression,
    typed: bool,
    locals: &[SmolStr],
) -> Result<ExprAnalysis, ParseError> {
    match analyze(expr, typed, locals) {
        Ok(analysis) => Ok(analysis),
        Err(expr_error) => {
            let lang = typed.then_some("ts");
            let Ok(ast) = parse_script(&expr.content, lang, expr.span.lo()) else {
                return Err(expr_error);
            };
            if !ast.errors.is_empty() {
                return Err(expr_error);
            }
            let mut collector = RefCollector::new(ast.spans, locals);
            collector.scopes.push(Vec::new());
            ast.module.visit_with(&mut collector);
            Ok(collector.finish(ExprShape::Statements))
        }
    }
}

/// Prefixes every free identifier in the buffer with `ctx.`.
pub fn qualify(buffer: &mut PatchBuffer, analysis: &ExprAnalysis, ctx: &str) -> Result<(), PatchError> {
    for r in &analysis.refs {
        buffer.append_right(r.span.lo(), &qualifier(r, ctx))?;
    }
    Ok(())
}

/// The expression's text with every free identifier qualified.
pub fn qualified_text(expr: &Expression, analysis: &ExprAnalysis, ctx: &str) -> String {
    let base = expr.span.lo();
    let mut out = String::with_capacity(expr.content.len() + analysis.refs.len() * ctx.len());
    let mut last = 0usize;
    for r in &analysis.refs {
        let at = (r.span.lo() - base) as usize;
        if at < last || at > expr.content.len() {
            continue;
        }
        out.push_str(&expr.content[last..at]);
        out.push_str(&qualifier(r, ctx));
        last = at;
    }
    out.push_str(&expr.content[last..]);
    out.trim().to_string()
}

fn qualifier(r: &IdentRef, ctx: &str) -> String {
    if r.shorthand {
        format!("{}: {}.", r.name, ctx)
    } else {
        format!("{ctx}.")
    }
}

fn shape_of(expr: &Expr) -> ExprShape {
    match expr {
        Expr::Paren(paren) => shape_of(&paren.expr),
        Expr::Ident(_) => ExprShape::Identifier,
        Expr::Member(_) | Expr::OptChain(_) => ExprShape::Member,
        Expr::Arrow(_) | Expr::Fn(_) => ExprShape::Function,
        _ => ExprShape::Other,
    }
}

struct RefCollector<'a> {
    spans: SpanConverter,
    locals: &'a [SmolStr],
    scopes: Vec<Vec<SmolStr>>,
    refs: Vec<IdentRef>,
    uses_event: bool,
}

impl<'a> RefCollector<'a> {
    fn new(spans: SpanConverter, locals: &'a [SmolStr]) -> Self {
        Self {
            spans,
            locals,
            scopes: Vec::new(),
            refs: Vec::new(),
            uses_event: false,
        }
    }

    fn is_bound(&self, name: &str) -> bool {
        self.locals.iter().any(|l| l == name) || self.scopes.iter().flatten().any(|l| l == name)
    }

    fn record(&mut self, ident: &Ident, shorthand: bool) {
        let name = &*ident.sym;
        if name == "$event" {
            self.uses_event = true;
        }
        if is_global_allowed(name) || self.is_bound(name) {
            return;
        }
        self.refs.push(IdentRef {
            name: SmolStr::new(name),
            span: self.spans.span(ident.span),
            shorthand,
        });
    }

    fn finish(mut self, shape: ExprShape) -> ExprAnalysis {
        self.refs.sort_by_key(|r| r.span.start);
        ExprAnalysis {
            refs: self.refs,
            shape,
            uses_event: self.uses_event,
        }
    }
}

impl Visit for RefCollector<'_> {
    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.record(ident, false),
            _ => expr.visit_children_with(self),
        }
    }

    fn visit_prop(&mut self, prop: &Prop) {
        match prop {
            Prop::Shorthand(ident) => self.record(ident, true),
            _ => prop.visit_children_with(self),
        }
    }

    fn visit_simple_assign_target(&mut self, target: &SimpleAssignTarget) {
        match target {
            SimpleAssignTarget::Ident(binding) => self.record(&binding.id, false),
            _ => target.visit_children_with(self),
        }
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        let mut names = Vec::new();
        for param in &arrow.params {
            collect_pattern_names(param, &mut names);
        }
        self.scopes.push(names);
        arrow.params.visit_with(self);
        arrow.body.visit_with(self);
        self.scopes.pop();
    }

    fn visit_fn_expr(&mut self, f: &FnExpr) {
        let name = f.ident.iter().map(|id| SmolStr::new(&*id.sym)).collect();
        self.scopes.push(name);
        f.function.visit_with(self);
        self.scopes.pop();
    }

    fn visit_function(&mut self, function: &Function) {
        let mut names = Vec::new();
        for param in &function.params {
            collect_pattern_names(&param.pat, &mut names);
        }
        self.scopes.push(names);
        function.params.visit_with(self);
        function.body.visit_with(self);
        self.scopes.pop();
    }

    fn visit_var_declarator(&mut self, decl: &VarDeclarator) {
        let mut names = Vec::new();
        collect_pattern_names(&decl.name, &mut names);
        match self.scopes.last_mut() {
            Some(scope) => scope.extend(names),
            None => self.scopes.push(names),
        }
        decl.name.visit_with(self);
        decl.init.visit_with(self);
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause) {
        let mut names = Vec::new();
        if let Some(param) = &clause.param {
            collect_pattern_names(param, &mut names);
        }
        self.scopes.push(names);
        clause.body.visit_with(self);
        self.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr(content: &str) -> Expression {
        Expression {
            content: content.to_string(),
            span: Span::from_usize(0, content.len()),
        }
    }

    fn names(analysis: &ExprAnalysis) -> Vec<&str> {
        analysis.refs.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_free_identifiers() {
        let analysis = analyze(&expr("count + item.price * Math.max(a, b)"), false, &["item".into()]).unwrap();
        assert_eq!(names(&analysis), vec!["count", "a", "b"]);
        assert_eq!(analysis.shape, ExprShape::Other);
    }

    #[test]
    fn test_arrow_params_are_local() {
        let analysis = analyze(&expr("(x) => x + y"), false, &[]).unwrap();
        assert_eq!(names(&analysis), vec!["y"]);
        assert_eq!(analysis.shape, ExprShape::Function);
    }

    #[test]
    fn test_shapes() {
        assert_eq!(analyze(&expr("onClick"), false, &[]).unwrap().shape, ExprShape::Identifier);
        assert_eq!(analyze(&expr(" a.b "), false, &[]).unwrap().shape, ExprShape::Member);
        let analysis = analyze(&expr("onClick"), false, &[]).unwrap();
        assert_eq!(analysis.identifier().map(|s| s.as_str()), Some("onClick"));
    }

    #[test]
    fn test_qualified_text() {
        let e = expr("{ a, b: c } && $event");
        let analysis = analyze(&e, false, &[]).unwrap();
        assert!(analysis.uses_event);
        assert_eq!(qualified_text(&e, &analysis, "ctx"), "{ a: ctx.a, b: ctx.c } && $event");
    }

    #[test]
    fn test_qualify_in_buffer() {
        let source = "count++";
        let analysis = analyze(&expr(source), false, &[]).unwrap();
        let mut buffer = PatchBuffer::new(source);
        qualify(&mut buffer, &analysis, "ctx").unwrap();
        assert_eq!(buffer.to_string(), "ctx.count++");
    }

    #[test]
    fn test_handler_statements() {
        let e = expr("a = 1; b()");
        assert!(analyze(&e, false, &[]).is_err());
        let analysis = analyze_handler(&e, false, &[]).unwrap();
        assert_eq!(analysis.shape, ExprShape::Statements);
        assert_eq!(names(&analysis), vec!["a", "b"]);
    }

    #[test]
    fn test_typed_expression() {
        let analysis = analyze(&expr("value as string"), true, &[]).unwrap();
        assert_eq!(names(&analysis), vec!["value"]);
    }
}
