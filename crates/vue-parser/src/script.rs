//! Script and expression parsing over `swc_ecma_parser`.
//!
//! Every parse gets its own `swc_common::SourceMap`; [`SpanConverter`] turns
//! the resulting swc positions back into absolute component offsets.

use crate::error::{ParseError, ParseErrorKind};
use source_map::Span;
use swc_common::{sync::Lrc, FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    ArrowExpr, Class, Constructor, Expr, ForOfStmt, Function, GetterProp, Module, ModuleItem,
    Pat, SetterProp,
};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

/// Converts swc spans of one parse into absolute component spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanConverter {
    shift: i64,
}

impl SpanConverter {
    fn new(file_start: u32, base: i64) -> Self {
        Self {
            shift: base - i64::from(file_start),
        }
    }

    /// Converts an swc span.
    pub fn span(&self, span: swc_common::Span) -> Span {
        Span::new(self.offset(span.lo.0), self.offset(span.hi.0))
    }

    /// Converts an swc position.
    pub fn offset(&self, pos: u32) -> u32 {
        (i64::from(pos) + self.shift).max(0) as u32
    }
}

/// A parsed script block.
#[derive(Debug)]
pub struct ScriptAst {
    pub module: Module,
    pub spans: SpanConverter,
    /// Errors the parser recovered from.
    pub errors: Vec<ParseError>,
}

/// A parsed template expression.
#[derive(Debug)]
pub struct ParsedExpression {
    pub expr: Box<Expr>,
    pub spans: SpanConverter,
}

/// Parsed parameter patterns, e.g. `v-for` aliases or slot props.
#[derive(Debug)]
pub struct ParsedParams {
    pub params: Vec<Pat>,
    pub spans: SpanConverter,
}

/// The swc syntax for a block language.
pub fn syntax_for(typed: bool, tsx: bool) -> Syntax {
    if typed {
        Syntax::Typescript(TsSyntax {
            tsx,
            decorators: true,
            dts: false,
            no_early_errors: true,
            disallow_ambiguous_jsx_like: false,
        })
    } else {
        Syntax::Es(Default::default())
    }
}

fn syntax_for_lang(lang: Option<&str>) -> Syntax {
    match lang {
        Some("ts") => syntax_for(true, false),
        Some("tsx") => syntax_for(true, true),
        _ => syntax_for(false, false),
    }
}

fn syntax_error(error: swc_ecma_parser::error::Error, spans: &SpanConverter) -> ParseError {
    ParseError::new(
        ParseErrorKind::SyntaxError {
            message: error.kind().msg().to_string(),
        },
        spans.span(error.span()),
    )
}

/// Parses a script block's content as a module.
///
/// `base` is the absolute offset of the content in the component source.
pub fn parse_script(content: &str, lang: Option<&str>, base: u32) -> Result<ScriptAst, ParseError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), content.to_string());
    let spans = SpanConverter::new(fm.start_pos.0, i64::from(base));

    let mut parser = Parser::new(syntax_for_lang(lang), StringInput::from(&*fm), None);
    let module = parser
        .parse_module()
        .map_err(|error| syntax_error(error, &spans))?;
    let errors = parser
        .take_errors()
        .into_iter()
        .map(|error| syntax_error(error, &spans))
        .collect();

    tracing::trace!(items = module.body.len(), "parsed script block");
    Ok(ScriptAst {
        module,
        spans,
        errors,
    })
}

/// Parses a single template expression.
///
/// The whole trimmed `content` must be one expression; trailing input is an
/// error.
pub fn parse_expression(content: &str, typed: bool, base: u32) -> Result<ParsedExpression, ParseError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), content.to_string());
    let spans = SpanConverter::new(fm.start_pos.0, i64::from(base));

    let mut parser = Parser::new(syntax_for(typed, false), StringInput::from(&*fm), None);
    let expr = parser
        .parse_expr()
        .map_err(|error| syntax_error(error, &spans))?;
    if let Some(error) = parser.take_errors().into_iter().next() {
        return Err(syntax_error(error, &spans));
    }

    let end = spans.offset(expr.span().hi.0);
    let expected = base + content.trim_end().len() as u32;
    if end != expected {
        return Err(ParseError::new(
            ParseErrorKind::SyntaxError {
                message: "unexpected input after expression".to_string(),
            },
            Span::new(end, expected),
        ));
    }

    Ok(ParsedExpression { expr, spans })
}

/// Parses a comma-separated parameter list such as `(item, index)` or
/// `{ id, name }`.
///
/// Surrounding parentheses are optional.
pub fn parse_params(content: &str, typed: bool, base: u32) -> Result<ParsedParams, ParseError> {
    let trimmed = content.trim();
    let parenthesized = trimmed.starts_with('(') && trimmed.ends_with(')');
    let (prefix, suffix) = if parenthesized { ("", " => 0") } else { ("(", ") => 0") };
    let wrapped = format!("{prefix}{content}{suffix}");

    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), wrapped);
    let spans = SpanConverter::new(fm.start_pos.0, i64::from(base) - prefix.len() as i64);

    let mut parser = Parser::new(syntax_for(typed, false), StringInput::from(&*fm), None);
    let expr = parser
        .parse_expr()
        .map_err(|error| syntax_error(error, &spans))?;
    match *expr {
        Expr::Arrow(ArrowExpr { params, .. }) => Ok(ParsedParams { params, spans }),
        other => Err(ParseError::new(
            ParseErrorKind::SyntaxError {
                message: "expected a parameter list".to_string(),
            },
            spans.span(other.span()),
        )),
    }
}

/// Returns true when the module awaits outside of any nested function.
pub fn has_top_level_await(module: &Module) -> bool {
    module.body.iter().any(item_has_top_level_await)
}

/// Returns true when a module item awaits outside of any nested function.
pub fn item_has_top_level_await(item: &ModuleItem) -> bool {
    let mut collector = AwaitCollector::default();
    item.visit_with(&mut collector);
    collector.found
}

#[derive(Default)]
struct AwaitCollector {
    found: bool,
}

impl Visit for AwaitCollector {
    fn visit_await_expr(&mut self, _: &swc_ecma_ast::AwaitExpr) {
        self.found = true;
    }

    fn visit_for_of_stmt(&mut self, stmt: &ForOfStmt) {
        if stmt.is_await {
            self.found = true;
        }
        stmt.visit_children_with(self);
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_getter_prop(&mut self, _: &GetterProp) {}
    fn visit_setter_prop(&mut self, _: &SetterProp) {}
    fn visit_constructor(&mut self, _: &Constructor) {}
    fn visit_class(&mut self, _: &Class) {}
}
