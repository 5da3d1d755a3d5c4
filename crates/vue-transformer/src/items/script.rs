//! Script item extraction.
//!
//! Walks the top level of the main script and reduces it to flat items:
//! imports, exports, declarations, compiler macro calls and other calls the
//! plugins care about. Nothing below the top level is visited except to find
//! misplaced macro calls.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use source_map::Span;
use swc_common::Spanned;
use swc_ecma_ast::{
    ArrowExpr, CallExpr, Callee, Decl, Expr, Function, ImportSpecifier, ModuleDecl,
    ModuleItem, Pat, Stmt, VarDeclKind, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};
use vue_parser::{item_has_top_level_await, ScriptAst, SpanConverter};

use crate::engine::{ItemKind, PipelineItem};
use crate::util::collect_pattern_names;

/// What a name is bound to at the top level of the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingKind {
    Const,
    Let,
    Var,
    Function,
    Class,
    Enum,
    Import,
    /// Types and interfaces; never part of the runtime context.
    Type,
}

impl BindingKind {
    /// Whether the binding holds a value that may be a ref.
    pub fn is_variable(self) -> bool {
        matches!(self, BindingKind::Const | BindingKind::Let | BindingKind::Var)
    }

    /// The declaration keyword for variable bindings.
    pub fn keyword(self) -> &'static str {
        match self {
            BindingKind::Let => "let",
            BindingKind::Var => "var",
            _ => "const",
        }
    }

    fn from_var(kind: VarDeclKind) -> Self {
        match kind {
            VarDeclKind::Const => BindingKind::Const,
            VarDeclKind::Let => BindingKind::Let,
            VarDeclKind::Var => BindingKind::Var,
        }
    }
}

/// A compiler macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum MacroName {
    DefineProps,
    DefineEmits,
    DefineSlots,
    DefineExpose,
    DefineOptions,
    DefineModel,
    WithDefaults,
}

impl MacroName {
    pub const ALL: &'static [MacroName] = &[
        MacroName::DefineProps,
        MacroName::DefineEmits,
        MacroName::DefineSlots,
        MacroName::DefineExpose,
        MacroName::DefineOptions,
        MacroName::DefineModel,
        MacroName::WithDefaults,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MacroName::DefineProps => "defineProps",
            MacroName::DefineEmits => "defineEmits",
            MacroName::DefineSlots => "defineSlots",
            MacroName::DefineExpose => "defineExpose",
            MacroName::DefineOptions => "defineOptions",
            MacroName::DefineModel => "defineModel",
            MacroName::WithDefaults => "withDefaults",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.as_str() == name)
    }
}

/// The shape of a macro's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationType {
    /// No arguments and no type arguments.
    Empty,
    /// A runtime argument, e.g. `defineProps(['a'])`.
    Object,
    /// A type argument, e.g. `defineProps<{ a: string }>()`.
    Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifierInfo {
    pub local: SmolStr,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub span: Span,
    pub source: String,
    pub type_only: bool,
    pub specifiers: Vec<ImportSpecifierInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem {
    pub span: Span,
    /// `export type`, `export interface` and type-only named exports.
    pub type_only: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub span: Span,
    pub annotated: bool,
}

/// The parameter list of a declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub params: Vec<ParamInfo>,
}

impl FunctionInfo {
    /// The span covering every parameter.
    pub fn params_span(&self) -> Option<Span> {
        let first = self.params.first()?;
        let last = self.params.last()?;
        Some(first.span.cover(last.span))
    }
}

/// A top-level declaration introducing a single name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationItem {
    /// The whole statement.
    pub span: Span,
    pub name: SmolStr,
    pub name_span: Span,
    pub kind: BindingKind,
    pub function: Option<FunctionInfo>,
    pub exported: bool,
}

/// A name bound by a destructuring declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingItem {
    pub span: Span,
    pub name: SmolStr,
    pub kind: BindingKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaratorInfo {
    pub kind: BindingKind,
    /// The binding pattern, including any type annotation.
    pub pattern: Span,
    /// The initializer expression.
    pub init: Span,
    /// The declared identifier; `None` for destructuring patterns.
    pub name: Option<SmolStr>,
}

/// A compiler macro call at the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBindingItem {
    pub macro_name: MacroName,
    /// The whole top-level statement.
    pub statement: Span,
    pub call: Span,
    pub callee: Span,
    pub declaration_type: DeclarationType,
    /// Unprefixed name for the hoisted payload, e.g. `definePropsType`.
    pub declaration_name: Option<String>,
    /// The type arguments without their angle brackets.
    pub type_params: Option<Span>,
    /// The first runtime argument, the payload; `defineModel('v', opts)`
    /// keeps its options in place.
    pub args: Option<Span>,
    /// `withDefaults` defaults object.
    pub defaults: Option<Span>,
    pub declarator: Option<DeclaratorInfo>,
}

impl MacroBindingItem {
    /// The name the macro's value is assigned to in source.
    pub fn declared_name(&self) -> Option<&SmolStr> {
        self.declarator.as_ref().and_then(|d| d.name.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    String(String),
    Identifier(SmolStr),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgument {
    pub span: Span,
    pub value: ArgumentValue,
}

/// A top-level call to a plain function, e.g. `useTemplateRef('input')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCallItem {
    pub span: Span,
    pub callee: SmolStr,
    pub callee_span: Span,
    pub type_args: Option<Span>,
    pub args: Vec<CallArgument>,
    /// The variable the result is assigned to.
    pub declarator: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDiagnostic {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    Import(ImportItem),
    Export(ExportItem),
    Declaration(DeclarationItem),
    Binding(BindingItem),
    MacroBinding(MacroBindingItem),
    FunctionCall(FunctionCallItem),
    /// A top-level statement that awaits.
    AsyncMarker(Span),
    Warning(ItemDiagnostic),
    Error(ItemDiagnostic),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptItemKind {
    Import,
    Export,
    Declaration,
    Binding,
    MacroBinding,
    FunctionCall,
    AsyncMarker,
    Warning,
    Error,
}

impl ItemKind for ScriptItemKind {
    const ALL: &'static [Self] = &[
        ScriptItemKind::Import,
        ScriptItemKind::Export,
        ScriptItemKind::Declaration,
        ScriptItemKind::Binding,
        ScriptItemKind::MacroBinding,
        ScriptItemKind::FunctionCall,
        ScriptItemKind::AsyncMarker,
        ScriptItemKind::Warning,
        ScriptItemKind::Error,
    ];
}

impl PipelineItem for ScriptItem {
    type Kind = ScriptItemKind;

    fn kind(&self) -> ScriptItemKind {
        match self {
            ScriptItem::Import(_) => ScriptItemKind::Import,
            ScriptItem::Export(_) => ScriptItemKind::Export,
            ScriptItem::Declaration(_) => ScriptItemKind::Declaration,
            ScriptItem::Binding(_) => ScriptItemKind::Binding,
            ScriptItem::MacroBinding(_) => ScriptItemKind::MacroBinding,
            ScriptItem::FunctionCall(_) => ScriptItemKind::FunctionCall,
            ScriptItem::AsyncMarker(_) => ScriptItemKind::AsyncMarker,
            ScriptItem::Warning(_) => ScriptItemKind::Warning,
            ScriptItem::Error(_) => ScriptItemKind::Error,
        }
    }
}

/// Extracts the items of a parsed script block.
pub fn extract_script_items(ast: &ScriptAst) -> Vec<ScriptItem> {
    let mut extractor = ScriptExtractor {
        spans: ast.spans,
        items: Vec::new(),
        shadowed: FxHashSet::default(),
        declaration_names: FxHashMap::default(),
    };

    for error in &ast.errors {
        extractor.items.push(ScriptItem::Error(ItemDiagnostic {
            message: error.kind.to_string(),
            span: error.span,
        }));
    }
    for item in &ast.module.body {
        extractor.module_item(item);
    }

    tracing::debug!(items = extractor.items.len(), "extracted script items");
    extractor.items
}

struct ScriptExtractor {
    spans: SpanConverter,
    items: Vec<ScriptItem>,
    /// Macro names rebound by the user; no longer recognized.
    shadowed: FxHashSet<SmolStr>,
    declaration_names: FxHashMap<String, u32>,
}

impl ScriptExtractor {
    fn span(&self, node: &impl Spanned) -> Span {
        self.spans.span(node.span())
    }

    fn macro_name(&self, call: &CallExpr) -> Option<MacroName> {
        let Callee::Expr(callee) = &call.callee else {
            return None;
        };
        let Expr::Ident(ident) = &**callee else {
            return None;
        };
        if self.shadowed.contains(ident.sym.as_str()) {
            return None;
        }
        MacroName::from_name(&ident.sym)
    }

    fn shadow(&mut self, name: &str) {
        if MacroName::from_name(name).is_some() {
            self.shadowed.insert(SmolStr::new(name));
        }
    }

    fn module_item(&mut self, item: &ModuleItem) {
        let span = self.span(item);
        if item_has_top_level_await(item) {
            self.items.push(ScriptItem::AsyncMarker(span));
        }

        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                let source = import.src.value.to_string_lossy().into_owned();
                let specifiers = import
                    .specifiers
                    .iter()
                    .map(|spec| match spec {
                        ImportSpecifier::Named(named) => ImportSpecifierInfo {
                            local: SmolStr::new(named.local.sym.as_str()),
                            type_only: named.is_type_only,
                        },
                        ImportSpecifier::Default(default) => ImportSpecifierInfo {
                            local: SmolStr::new(default.local.sym.as_str()),
                            type_only: false,
                        },
                        ImportSpecifier::Namespace(ns) => ImportSpecifierInfo {
                            local: SmolStr::new(ns.local.sym.as_str()),
                            type_only: false,
                        },
                    })
                    .collect::<Vec<_>>();
                if source != "vue" {
                    for spec in &specifiers {
                        self.shadow(&spec.local);
                    }
                }
                self.items.push(ScriptItem::Import(ImportItem {
                    span,
                    source,
                    type_only: import.type_only,
                    specifiers,
                }));
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                let type_only = matches!(export.decl, Decl::TsInterface(_) | Decl::TsTypeAlias(_));
                self.items.push(ScriptItem::Export(ExportItem {
                    span,
                    type_only,
                    is_default: false,
                }));
                self.declaration(&export.decl, span, true);
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => {
                self.items.push(ScriptItem::Export(ExportItem {
                    span,
                    type_only: named.type_only,
                    is_default: false,
                }));
            }
            ModuleItem::ModuleDecl(
                ModuleDecl::ExportDefaultDecl(_) | ModuleDecl::ExportDefaultExpr(_),
            ) => {
                self.items.push(ScriptItem::Export(ExportItem {
                    span,
                    type_only: false,
                    is_default: true,
                }));
            }
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(_)) => {
                self.items.push(ScriptItem::Export(ExportItem {
                    span,
                    type_only: false,
                    is_default: false,
                }));
            }
            ModuleItem::ModuleDecl(_) => {}
            ModuleItem::Stmt(Stmt::Decl(decl)) => self.declaration(decl, span, false),
            ModuleItem::Stmt(Stmt::Expr(stmt)) => match &*stmt.expr {
                Expr::Call(call) if self.macro_name(call).is_some() => {
                    self.macro_call(call, span, None);
                }
                expr => {
                    let expr = unwrap_await(expr);
                    if let Expr::Call(call) = expr {
                        self.function_call(call, None);
                    }
                    self.misplaced_macros(item);
                }
            },
            ModuleItem::Stmt(_) => self.misplaced_macros(item),
        }
    }

    fn declaration(&mut self, decl: &Decl, span: Span, exported: bool) {
        match decl {
            Decl::Fn(f) if !f.declare => {
                self.shadow(&f.ident.sym);
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name: SmolStr::new(f.ident.sym.as_str()),
                    name_span: self.span(&f.ident),
                    kind: BindingKind::Function,
                    function: Some(self.function_info(&f.function)),
                    exported,
                }));
                self.misplaced_macros(&*f.function);
            }
            Decl::Class(c) if !c.declare => {
                self.shadow(&c.ident.sym);
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name: SmolStr::new(c.ident.sym.as_str()),
                    name_span: self.span(&c.ident),
                    kind: BindingKind::Class,
                    function: None,
                    exported,
                }));
            }
            Decl::Var(var) if !var.declare => {
                let kind = BindingKind::from_var(var.kind);
                let macro_decls = var
                    .decls
                    .iter()
                    .filter(|d| self.declarator_macro(d).is_some())
                    .count();
                if macro_decls > 0 && var.decls.len() > 1 {
                    self.warn("compiler macros must be the only declarator in their statement", span);
                }
                for declarator in &var.decls {
                    if var.decls.len() == 1 {
                        if let Some(call) = self.declarator_macro(declarator) {
                            let info = DeclaratorInfo {
                                kind,
                                pattern: self.span(&declarator.name),
                                init: self.span(call),
                                name: match &declarator.name {
                                    Pat::Ident(ident) => Some(SmolStr::new(ident.id.sym.as_str())),
                                    _ => None,
                                },
                            };
                            self.macro_call(call, span, Some(info));
                            self.declarator_bindings(declarator, span, kind, exported);
                            continue;
                        }
                    }
                    if let Some(Expr::Call(call)) = declarator.init.as_deref().map(unwrap_await) {
                        if let Pat::Ident(ident) = &declarator.name {
                            self.function_call(call, Some(SmolStr::new(ident.id.sym.as_str())));
                        }
                    }
                    self.declarator_bindings(declarator, span, kind, exported);
                    self.misplaced_macros(declarator);
                }
            }
            Decl::TsEnum(e) if !e.declare => {
                self.shadow(&e.id.sym);
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name: SmolStr::new(e.id.sym.as_str()),
                    name_span: self.span(&e.id),
                    kind: BindingKind::Enum,
                    function: None,
                    exported,
                }));
            }
            Decl::TsInterface(i) => {
                self.shadow(&i.id.sym);
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name: SmolStr::new(i.id.sym.as_str()),
                    name_span: self.span(&i.id),
                    kind: BindingKind::Type,
                    function: None,
                    exported,
                }));
            }
            Decl::TsTypeAlias(t) => {
                self.shadow(&t.id.sym);
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name: SmolStr::new(t.id.sym.as_str()),
                    name_span: self.span(&t.id),
                    kind: BindingKind::Type,
                    function: None,
                    exported,
                }));
            }
            _ => {}
        }
    }

    fn declarator_macro<'d>(&self, declarator: &'d VarDeclarator) -> Option<&'d CallExpr> {
        match declarator.init.as_deref()? {
            Expr::Call(call) if self.macro_name(call).is_some() => Some(call),
            _ => None,
        }
    }

    fn declarator_bindings(&mut self, declarator: &VarDeclarator, span: Span, kind: BindingKind, exported: bool) {
        match &declarator.name {
            Pat::Ident(ident) => {
                let name = SmolStr::new(ident.id.sym.as_str());
                self.shadow(&name);
                let function = match declarator.init.as_deref() {
                    Some(Expr::Arrow(arrow)) => Some(self.arrow_info(arrow)),
                    Some(Expr::Fn(f)) => Some(self.function_info(&f.function)),
                    _ => None,
                };
                self.items.push(ScriptItem::Declaration(DeclarationItem {
                    span,
                    name,
                    name_span: self.span(&ident.id),
                    kind,
                    function,
                    exported,
                }));
            }
            pattern => {
                let mut names = Vec::new();
                collect_pattern_names(pattern, &mut names);
                let pattern_span = self.span(pattern);
                for name in names {
                    self.shadow(&name);
                    self.items.push(ScriptItem::Binding(BindingItem {
                        span: pattern_span,
                        name,
                        kind,
                    }));
                }
            }
        }
    }

    fn function_info(&self, function: &Function) -> FunctionInfo {
        FunctionInfo {
            params: function
                .params
                .iter()
                .map(|param| ParamInfo {
                    span: self.span(&param.pat),
                    annotated: is_annotated(&param.pat),
                })
                .collect(),
        }
    }

    fn arrow_info(&self, arrow: &ArrowExpr) -> FunctionInfo {
        FunctionInfo {
            params: arrow
                .params
                .iter()
                .map(|pat| ParamInfo {
                    span: self.span(pat),
                    annotated: is_annotated(pat),
                })
                .collect(),
        }
    }

    fn next_declaration_name(&mut self, base: String) -> String {
        let count = self.declaration_names.entry(base.clone()).or_insert(0);
        let name = if *count == 0 {
            base
        } else {
            format!("{base}_{count}")
        };
        *count += 1;
        name
    }

    fn macro_call(&mut self, call: &CallExpr, statement: Span, declarator: Option<DeclaratorInfo>) {
        let Some(macro_name) = self.macro_name(call) else {
            return;
        };
        let Callee::Expr(callee) = &call.callee else {
            return;
        };

        if macro_name == MacroName::WithDefaults {
            let inner = call.args.first().and_then(|arg| match &*arg.expr {
                Expr::Call(inner) if self.macro_name(inner) == Some(MacroName::DefineProps) => {
                    Some(inner)
                }
                _ => None,
            });
            let Some(inner) = inner else {
                self.warn("withDefaults expects a defineProps call as its first argument", self.span(call));
                return;
            };
            self.macro_call(inner, statement, None);
            let defaults = call.args.get(1).map(|arg| self.span(&*arg.expr));
            self.items.push(ScriptItem::MacroBinding(MacroBindingItem {
                macro_name,
                statement,
                call: self.span(call),
                callee: self.span(&**callee),
                declaration_type: DeclarationType::Empty,
                declaration_name: None,
                type_params: None,
                args: None,
                defaults,
                declarator,
            }));
            return;
        }

        if call.args.iter().any(|arg| arg.spread.is_some()) {
            self.warn(
                &format!("{} does not accept spread arguments", macro_name.as_str()),
                self.span(call),
            );
            return;
        }

        let type_params = call.type_args.as_ref().and_then(|args| {
            let first = args.params.first()?;
            let last = args.params.last()?;
            Some(self.span(&**first).cover(self.span(&**last)))
        });
        let args = call.args.first().map(|arg| self.span(&*arg.expr));
        let declaration_type = if type_params.is_some() {
            DeclarationType::Type
        } else if args.is_some() {
            DeclarationType::Object
        } else {
            DeclarationType::Empty
        };
        let declaration_name = match declaration_type {
            DeclarationType::Type => Some(self.next_declaration_name(format!("{}Type", macro_name.as_str()))),
            DeclarationType::Object => Some(self.next_declaration_name(format!("{}Raw", macro_name.as_str()))),
            DeclarationType::Empty => None,
        };

        self.items.push(ScriptItem::MacroBinding(MacroBindingItem {
            macro_name,
            statement,
            call: self.span(call),
            callee: self.span(&**callee),
            declaration_type,
            declaration_name,
            type_params,
            args,
            defaults: None,
            declarator,
        }));
    }

    fn function_call(&mut self, call: &CallExpr, declarator: Option<SmolStr>) {
        let Callee::Expr(callee) = &call.callee else {
            return;
        };
        let Expr::Ident(ident) = &**callee else {
            return;
        };
        let args = call
            .args
            .iter()
            .map(|arg| CallArgument {
                span: self.span(&*arg.expr),
                value: match &*arg.expr {
                    Expr::Lit(swc_ecma_ast::Lit::Str(s)) => {
                        ArgumentValue::String(s.value.to_string_lossy().into_owned())
                    }
                    Expr::Ident(ident) => ArgumentValue::Identifier(SmolStr::new(ident.sym.as_str())),
                    _ => ArgumentValue::Other,
                },
            })
            .collect();
        self.items.push(ScriptItem::FunctionCall(FunctionCallItem {
            span: self.span(call),
            callee: SmolStr::new(ident.sym.as_str()),
            callee_span: self.span(ident),
            type_args: call.type_args.as_ref().map(|args| self.span(&**args)),
            args,
            declarator,
        }));
    }

    /// Warns about macro calls nested inside other code.
    fn misplaced_macros<N: for<'a> VisitWith<MacroFinder<'a>>>(&mut self, node: &N) {
        let mut finder = MacroFinder {
            shadowed: &self.shadowed,
            found: Vec::new(),
        };
        node.visit_with(&mut finder);
        let found = finder.found;
        for (name, span) in found {
            let span = self.spans.span(span);
            self.warn(&format!("{name} must be called at the top level of <script setup>"), span);
        }
    }

    fn warn(&mut self, message: &str, span: Span) {
        self.items.push(ScriptItem::Warning(ItemDiagnostic {
            message: message.to_string(),
            span,
        }));
    }
}

pub(crate) struct MacroFinder<'a> {
    shadowed: &'a FxHashSet<SmolStr>,
    found: Vec<(&'static str, swc_common::Span)>,
}

impl Visit for MacroFinder<'_> {
    fn visit_call_expr(&mut self, call: &CallExpr) {
        if let Callee::Expr(callee) = &call.callee {
            if let Expr::Ident(ident) = &**callee {
                if !self.shadowed.contains(ident.sym.as_str()) {
                    if let Some(name) = MacroName::from_name(&ident.sym) {
                        self.found.push((name.as_str(), call.span));
                    }
                }
            }
        }
        call.visit_children_with(self);
    }
}

fn unwrap_await(expr: &Expr) -> &Expr {
    match expr {
        Expr::Await(await_expr) => unwrap_await(&await_expr.arg),
        Expr::Paren(paren) => unwrap_await(&paren.expr),
        other => other,
    }
}

fn is_annotated(pat: &Pat) -> bool {
    match pat {
        Pat::Ident(ident) => ident.type_ann.is_some(),
        Pat::Array(array) => array.type_ann.is_some(),
        Pat::Object(object) => object.type_ann.is_some(),
        Pat::Rest(rest) => rest.type_ann.is_some(),
        Pat::Assign(assign) => is_annotated(&assign.left),
        Pat::Invalid(_) | Pat::Expr(_) => false,
    }
}
