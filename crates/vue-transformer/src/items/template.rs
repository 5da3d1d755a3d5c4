//! Template item extraction.
//!
//! Turns the parsed template tree into the items template plugins consume.
//! Structural directives become wrapping items: a `v-if`/`v-else-if`/`v-else`
//! chain is one [`ConditionalItem`] holding its branches, a `v-for` element is
//! wrapped in a [`LoopItem`], and slot outlets and slot templates become
//! [`SlotItem`]s. Every item that carries an expression also carries the
//! names local to it (loop aliases and slot props in scope).

use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::Span;
use vue_parser::{parse_params, Attribute, Directive, DirectiveArg, Element, Expression, StaticAttribute, TemplateNode};

use crate::engine::{ItemKind, PipelineItem};
use crate::items::script::ItemDiagnostic;
use crate::util::{collect_pattern_names, is_builtin_component, pascalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Native,
    Component,
    /// A plain `<template>` wrapper.
    Fragment,
    /// `<component :is="...">`
    Dynamic,
}

/// Facts about an element shared by every item derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub name: SmolStr,
    pub span: Span,
    pub name_span: Span,
    pub start_tag: Span,
    pub end_tag: Option<Span>,
    pub self_closing: bool,
    pub kind: ElementKind,
    /// The name the component resolves to, e.g. `MyButton` for `<my-button>`.
    pub component: Option<SmolStr>,
    pub static_class: Option<StaticAttribute>,
    pub static_style: Option<StaticAttribute>,
    /// The static `type` of an `<input>`.
    pub input_type: Option<String>,
}

impl ElementInfo {
    pub fn end_name_span(&self) -> Option<Span> {
        self.end_tag.map(|tag| {
            let start = tag.lo() + 2;
            Span::new(start, start + self.name.len() as u32)
        })
    }

    pub fn is_component(&self) -> bool {
        self.kind == ElementKind::Component
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementItem {
    pub element: ElementInfo,
    pub attributes: Vec<StaticAttribute>,
    /// Directive items first, then child nodes.
    pub children: Vec<TemplateItem>,
}

/// Literal text; the content of a `v-pre` element is one raw text item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationItem {
    pub span: Span,
    pub expression: Expression,
    pub locals: Vec<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentItem {
    pub span: Span,
}

/// A non-structural directive on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveItem {
    pub directive: Directive,
    pub element: ElementInfo,
    pub locals: Vec<SmolStr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    If,
    ElseIf,
    Else,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalBranch {
    pub kind: BranchKind,
    pub directive: Directive,
    pub element: ElementInfo,
}

impl ConditionalBranch {
    pub fn condition(&self) -> Option<&Expression> {
        self.directive.value.as_ref()
    }
}

/// A `v-if` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalItem {
    pub span: Span,
    pub branches: Vec<ConditionalBranch>,
    pub locals: Vec<SmolStr>,
    /// One item per branch, in branch order.
    pub children: Vec<TemplateItem>,
}

/// A `v-for` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopItem {
    pub span: Span,
    pub directive: Directive,
    pub aliases: Expression,
    pub source: Expression,
    pub alias_names: Vec<SmolStr>,
    pub element: ElementInfo,
    /// Names in scope around the loop; the aliases are not included.
    pub locals: Vec<SmolStr>,
    pub children: Vec<TemplateItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotName {
    Default,
    Static(String),
    Dynamic(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotKind {
    /// `<slot>`; `name_attribute` is the `name` or `:name` attribute.
    Outlet { name_attribute: Option<Span> },
    /// `<template #name>` directly inside a component.
    Template {
        component: ElementInfo,
        index: usize,
        count: usize,
    },
    /// `v-slot` on the component itself; `element` is the component.
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotItem {
    pub kind: SlotKind,
    pub name: SlotName,
    pub element: ElementInfo,
    /// The `v-slot` directive; `None` for outlets.
    pub directive: Option<Directive>,
    pub locals: Vec<SmolStr>,
    pub children: Vec<TemplateItem>,
}

impl SlotItem {
    /// The slot props pattern, e.g. `{ item }`.
    pub fn params(&self) -> Option<&Expression> {
        self.directive.as_ref().and_then(|d| d.value.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateItem {
    Element(ElementItem),
    Text(TextItem),
    Interpolation(InterpolationItem),
    Comment(CommentItem),
    Directive(DirectiveItem),
    Conditional(ConditionalItem),
    Loop(LoopItem),
    Slot(SlotItem),
}

impl TemplateItem {
    pub fn span(&self) -> Span {
        match self {
            TemplateItem::Element(e) => e.element.span,
            TemplateItem::Text(t) => t.span,
            TemplateItem::Interpolation(i) => i.span,
            TemplateItem::Comment(c) => c.span,
            TemplateItem::Directive(d) => d.directive.span,
            TemplateItem::Conditional(c) => c.span,
            TemplateItem::Loop(l) => l.span,
            TemplateItem::Slot(s) => s.element.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateItemKind {
    Element,
    Text,
    Interpolation,
    Comment,
    Directive,
    Conditional,
    Loop,
    Slot,
}

impl ItemKind for TemplateItemKind {
    const ALL: &'static [Self] = &[
        TemplateItemKind::Element,
        TemplateItemKind::Text,
        TemplateItemKind::Interpolation,
        TemplateItemKind::Comment,
        TemplateItemKind::Directive,
        TemplateItemKind::Conditional,
        TemplateItemKind::Loop,
        TemplateItemKind::Slot,
    ];
}

impl PipelineItem for TemplateItem {
    type Kind = TemplateItemKind;

    fn kind(&self) -> TemplateItemKind {
        match self {
            TemplateItem::Element(_) => TemplateItemKind::Element,
            TemplateItem::Text(_) => TemplateItemKind::Text,
            TemplateItem::Interpolation(_) => TemplateItemKind::Interpolation,
            TemplateItem::Comment(_) => TemplateItemKind::Comment,
            TemplateItem::Directive(_) => TemplateItemKind::Directive,
            TemplateItem::Conditional(_) => TemplateItemKind::Conditional,
            TemplateItem::Loop(_) => TemplateItemKind::Loop,
            TemplateItem::Slot(_) => TemplateItemKind::Slot,
        }
    }

    fn children(&self) -> &[Self] {
        match self {
            TemplateItem::Element(e) => &e.children,
            TemplateItem::Conditional(c) => &c.children,
            TemplateItem::Loop(l) => &l.children,
            TemplateItem::Slot(s) => &s.children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateExtractOptions {
    pub typed: bool,
    /// Top-level script names; lowercase tags matching one are components.
    pub script_bindings: FxHashSet<SmolStr>,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateExtraction {
    pub items: Vec<TemplateItem>,
    pub diagnostics: Vec<ItemDiagnostic>,
}

/// Extracts template items from parsed template nodes.
pub fn extract_template_items(nodes: &[TemplateNode], options: &TemplateExtractOptions) -> TemplateExtraction {
    let mut extractor = TemplateExtractor {
        options,
        diagnostics: Vec::new(),
    };
    let items = extractor.nodes(nodes, &[], None);
    tracing::debug!(items = items.len(), "extracted template items");
    TemplateExtraction {
        items,
        diagnostics: extractor.diagnostics,
    }
}

struct TemplateExtractor<'a> {
    options: &'a TemplateExtractOptions,
    diagnostics: Vec<ItemDiagnostic>,
}

impl TemplateExtractor<'_> {
    fn warn(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(ItemDiagnostic {
            message: message.into(),
            span,
        });
    }

    fn nodes(
        &mut self,
        nodes: &[TemplateNode],
        locals: &[SmolStr],
        component: Option<&ElementInfo>,
    ) -> Vec<TemplateItem> {
        let mut out = Vec::new();
        let mut chain: Option<ConditionalItem> = None;
        // Whitespace-free nodes seen after an open chain's last branch.
        let mut pending: Vec<TemplateItem> = Vec::new();

        let slot_count = match component {
            Some(_) => nodes
                .iter()
                .filter(|n| matches!(n, TemplateNode::Element(el) if is_slot_template(el)))
                .count(),
            None => 0,
        };
        let mut slot_index = 0;

        for node in nodes {
            match node {
                TemplateNode::Element(el) => {
                    let slot = match component {
                        Some(component) if is_slot_template(el) => {
                            let slot = (component, slot_index, slot_count);
                            slot_index += 1;
                            Some(slot)
                        }
                        _ => None,
                    };
                    let branch = conditional_directive(el);
                    match branch {
                        Some((BranchKind::If, directive)) if slot.is_none() => {
                            flush(&mut out, &mut chain, &mut pending);
                            let info = self.element_info(el);
                            let item = self.element(el, locals, None, &[directive.span]);
                            chain = Some(ConditionalItem {
                                span: el.span,
                                branches: vec![ConditionalBranch {
                                    kind: BranchKind::If,
                                    directive: directive.clone(),
                                    element: info,
                                }],
                                locals: locals.to_vec(),
                                children: vec![item],
                            });
                        }
                        Some((kind, directive)) if chain.is_some() && slot.is_none() => {
                            pending.clear();
                            let info = self.element_info(el);
                            let item = self.element(el, locals, None, &[directive.span]);
                            if let Some(open) = chain.as_mut() {
                                open.span = open.span.cover(el.span);
                                open.branches.push(ConditionalBranch {
                                    kind,
                                    directive: directive.clone(),
                                    element: info,
                                });
                                open.children.push(item);
                            }
                            if kind == BranchKind::Else {
                                flush(&mut out, &mut chain, &mut pending);
                            }
                        }
                        other => {
                            if let Some((kind, directive)) = other {
                                let message = if slot.is_some() {
                                    "conditional slot templates are not supported"
                                } else if kind == BranchKind::Else {
                                    "v-else has no adjacent v-if"
                                } else {
                                    "v-else-if has no adjacent v-if"
                                };
                                self.warn(message, directive.span);
                            }
                            flush(&mut out, &mut chain, &mut pending);
                            out.push(self.element(el, locals, slot, &[]));
                        }
                    }
                }
                TemplateNode::Text(text) if text.data.trim().is_empty() => {}
                TemplateNode::Comment(comment) if chain.is_some() => {
                    pending.push(TemplateItem::Comment(CommentItem { span: comment.span }));
                }
                TemplateNode::Comment(comment) => {
                    out.push(TemplateItem::Comment(CommentItem { span: comment.span }));
                }
                TemplateNode::Text(text) => {
                    flush(&mut out, &mut chain, &mut pending);
                    out.push(TemplateItem::Text(TextItem { span: text.span }));
                }
                TemplateNode::Interpolation(interp) => {
                    flush(&mut out, &mut chain, &mut pending);
                    out.push(TemplateItem::Interpolation(InterpolationItem {
                        span: interp.span,
                        expression: interp.expression.clone(),
                        locals: locals.to_vec(),
                    }));
                }
            }
        }
        flush(&mut out, &mut chain, &mut pending);
        out
    }

    /// An element and everything below it, wrapped in a loop when it has `v-for`.
    fn element(
        &mut self,
        el: &Element,
        locals: &[SmolStr],
        slot: Option<(&ElementInfo, usize, usize)>,
        consumed: &[Span],
    ) -> TemplateItem {
        let mut consumed = consumed.to_vec();

        if let (Some(_), Some(directive)) = (slot, el.directive("for")) {
            self.warn("v-for on slot templates is not supported", directive.span);
        }
        if slot.is_none() {
            if let Some(directive) = el.directive("for") {
                if let Some((aliases, source, alias_names)) = self.parse_for(directive) {
                    consumed.push(directive.span);
                    let mut inner_locals = locals.to_vec();
                    inner_locals.extend(alias_names.iter().cloned());
                    let child = self.element_body(el, &inner_locals, None, &consumed);
                    return TemplateItem::Loop(LoopItem {
                        span: el.span,
                        directive: directive.clone(),
                        aliases,
                        source,
                        alias_names,
                        element: self.element_info(el),
                        locals: locals.to_vec(),
                        children: vec![child],
                    });
                }
            }
        }
        self.element_body(el, locals, slot, &consumed)
    }

    fn element_body(
        &mut self,
        el: &Element,
        locals: &[SmolStr],
        slot: Option<(&ElementInfo, usize, usize)>,
        consumed: &[Span],
    ) -> TemplateItem {
        let info = self.element_info(el);

        if let Some((component, index, count)) = slot {
            let directive = el.directive("slot").cloned();
            let (name, inner_locals) = self.slot_scope(directive.as_ref(), locals);
            let children = self.nodes(&el.children, &inner_locals, None);
            return TemplateItem::Slot(SlotItem {
                kind: SlotKind::Template {
                    component: component.clone(),
                    index,
                    count,
                },
                name,
                element: info,
                directive,
                locals: locals.to_vec(),
                children,
            });
        }

        if el.name == "slot" {
            let (name, name_attribute) = outlet_name(el);
            let mut skip = consumed.to_vec();
            skip.extend(name_attribute);
            let mut children = self.directives(el, &info, locals, &skip);
            children.extend(self.nodes(&el.children, locals, None));
            return TemplateItem::Slot(SlotItem {
                kind: SlotKind::Outlet { name_attribute },
                name,
                element: info,
                directive: None,
                locals: locals.to_vec(),
                children,
            });
        }

        if el.directive("pre").is_some() {
            let mut children = self.directives(el, &info, locals, consumed);
            if let Some(end) = info.end_tag.filter(|end| end.lo() > info.start_tag.hi()) {
                children.push(TemplateItem::Text(TextItem {
                    span: Span::new(info.start_tag.hi(), end.lo()),
                }));
            }
            return TemplateItem::Element(ElementItem {
                attributes: static_attributes(el),
                element: info,
                children,
            });
        }

        let own_slot = match info.kind {
            ElementKind::Component | ElementKind::Dynamic => el.directive("slot").cloned(),
            _ => None,
        };
        let mut skip = consumed.to_vec();
        if let Some(directive) = &own_slot {
            skip.push(directive.span);
        }
        let mut children = self.directives(el, &info, locals, &skip);
        let component = info.is_component().then_some(&info);

        match own_slot {
            Some(directive) if !el.children.is_empty() => {
                let (name, inner_locals) = self.slot_scope(Some(&directive), locals);
                let slot_children = self.nodes(&el.children, &inner_locals, None);
                children.push(TemplateItem::Slot(SlotItem {
                    kind: SlotKind::Component,
                    name,
                    element: info.clone(),
                    directive: Some(directive),
                    locals: locals.to_vec(),
                    children: slot_children,
                }));
            }
            _ => children.extend(self.nodes(&el.children, locals, component)),
        }

        TemplateItem::Element(ElementItem {
            attributes: static_attributes(el),
            element: info,
            children,
        })
    }

    fn directives(&mut self, el: &Element, info: &ElementInfo, locals: &[SmolStr], skip: &[Span]) -> Vec<TemplateItem> {
        el.attributes
            .iter()
            .filter_map(|attr| match attr {
                Attribute::Directive(d) if !skip.contains(&d.span) => Some(TemplateItem::Directive(DirectiveItem {
                    directive: d.clone(),
                    element: info.clone(),
                    locals: locals.to_vec(),
                })),
                _ => None,
            })
            .collect()
    }

    /// The slot name and the names in scope inside the slot.
    fn slot_scope(&mut self, directive: Option<&Directive>, locals: &[SmolStr]) -> (SlotName, Vec<SmolStr>) {
        let mut inner = locals.to_vec();
        let Some(directive) = directive else {
            return (SlotName::Default, inner);
        };
        let name = match &directive.arg {
            Some(DirectiveArg::Static { name, .. }) => SlotName::Static(name.to_string()),
            Some(DirectiveArg::Dynamic(expr)) => SlotName::Dynamic(expr.clone()),
            None => SlotName::Default,
        };
        if let Some(params) = directive.value.as_ref().filter(|v| !v.content.trim().is_empty()) {
            match parse_params(&params.content, self.options.typed, params.span.lo()) {
                Ok(parsed) => {
                    for pat in &parsed.params {
                        collect_pattern_names(pat, &mut inner);
                    }
                }
                Err(error) => self.warn(format!("invalid slot props: {}", error.kind), params.span),
            }
        }
        (name, inner)
    }

    fn parse_for(&mut self, directive: &Directive) -> Option<(Expression, Expression, Vec<SmolStr>)> {
        let Some(value) = directive.value.as_ref() else {
            self.warn("v-for requires a value", directive.span);
            return None;
        };
        let Some((aliases, source)) = split_for(value) else {
            self.warn("invalid v-for expression", value.span);
            return None;
        };
        match parse_params(&aliases.content, self.options.typed, aliases.span.lo()) {
            Ok(parsed) => {
                let mut names = Vec::new();
                for pat in &parsed.params {
                    collect_pattern_names(pat, &mut names);
                }
                Some((aliases, source, names))
            }
            Err(error) => {
                self.warn(format!("invalid v-for alias: {}", error.kind), aliases.span);
                None
            }
        }
    }

    fn element_info(&self, el: &Element) -> ElementInfo {
        let (kind, component) = classify(&el.name, &self.options.script_bindings);
        ElementInfo {
            name: el.name.clone(),
            span: el.span,
            name_span: el.name_span,
            start_tag: el.start_tag,
            end_tag: el.end_tag,
            self_closing: el.self_closing,
            kind,
            component,
            static_class: el.static_attribute("class").cloned(),
            static_style: el.static_attribute("style").cloned(),
            input_type: (el.name == "input")
                .then(|| el.static_attribute("type"))
                .flatten()
                .and_then(|attr| attr.value.as_ref())
                .map(|v| v.value.clone()),
        }
    }
}

fn flush(out: &mut Vec<TemplateItem>, chain: &mut Option<ConditionalItem>, pending: &mut Vec<TemplateItem>) {
    if let Some(chain) = chain.take() {
        out.push(TemplateItem::Conditional(chain));
    }
    out.append(pending);
}

fn is_slot_template(el: &Element) -> bool {
    el.name == "template" && el.directive("slot").is_some()
}

fn conditional_directive(el: &Element) -> Option<(BranchKind, &Directive)> {
    el.attributes.iter().find_map(|attr| match attr {
        Attribute::Directive(d) => match d.name.as_str() {
            "if" => Some((BranchKind::If, d)),
            "else-if" => Some((BranchKind::ElseIf, d)),
            "else" => Some((BranchKind::Else, d)),
            _ => None,
        },
        Attribute::Static(_) => None,
    })
}

fn static_attributes(el: &Element) -> Vec<StaticAttribute> {
    el.attributes
        .iter()
        .filter_map(|attr| match attr {
            Attribute::Static(a) => Some(a.clone()),
            Attribute::Directive(_) => None,
        })
        .collect()
}

fn outlet_name(el: &Element) -> (SlotName, Option<Span>) {
    for attr in &el.attributes {
        match attr {
            Attribute::Static(a) if a.name == "name" => {
                let name = a.value.as_ref().map(|v| v.value.clone()).unwrap_or_default();
                return (SlotName::Static(name), Some(a.span));
            }
            Attribute::Directive(d) if d.name == "bind" && d.arg.as_ref().and_then(|a| a.static_name()) == Some("name") => {
                if let Some(value) = &d.value {
                    return (SlotName::Dynamic(value.clone()), Some(d.span));
                }
            }
            _ => {}
        }
    }
    (SlotName::Default, None)
}

/// Classifies a tag by name casing and the script's bindings.
fn classify(name: &str, bindings: &FxHashSet<SmolStr>) -> (ElementKind, Option<SmolStr>) {
    match name {
        "template" => return (ElementKind::Fragment, None),
        "component" => return (ElementKind::Dynamic, None),
        "slot" => return (ElementKind::Native, None),
        _ => {}
    }
    let first_upper = name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    if first_upper || name.contains('.') {
        return (ElementKind::Component, Some(SmolStr::new(name)));
    }
    if name.contains('-') || is_builtin_component(name) {
        return (ElementKind::Component, Some(SmolStr::new(pascalize(name))));
    }
    if bindings.contains(name) {
        return (ElementKind::Component, Some(SmolStr::new(name)));
    }
    let pascal = pascalize(name);
    if bindings.contains(pascal.as_str()) {
        return (ElementKind::Component, Some(SmolStr::new(pascal)));
    }
    (ElementKind::Native, None)
}

/// Splits `alias in source` (or `of`) at the first separator.
fn split_for(value: &Expression) -> Option<(Expression, Expression)> {
    let content = value.content.as_str();
    let bytes = content.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let keyword = content.get(j..j + 2);
            let after = bytes.get(j + 2);
            if matches!(keyword, Some("in" | "of")) && after.is_some_and(|b| b.is_ascii_whitespace()) {
                let mut k = j + 2;
                while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                let base = value.span.lo();
                let aliases = Expression {
                    content: content[..i].to_string(),
                    span: Span::new(base, base + i as u32),
                }
                .trimmed();
                let source = Expression {
                    content: content[k..].to_string(),
                    span: Span::new(base + k as u32, value.span.hi()),
                }
                .trimmed();
                if aliases.content.is_empty() || source.content.is_empty() {
                    return None;
                }
                return Some((aliases, source));
            }
            i = j;
        } else {
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vue_parser::parse_fragment;

    fn extract(source: &str) -> TemplateExtraction {
        let parsed = parse_fragment(source, 0, source.len());
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        extract_template_items(&parsed.nodes, &TemplateExtractOptions::default())
    }

    fn kinds(items: &[TemplateItem]) -> Vec<TemplateItemKind> {
        items.iter().map(|i| i.kind()).collect()
    }

    #[test]
    fn test_conditional_chain() {
        let source = r#"<a v-if="x"/> <!-- c --> <b v-else-if="y"/><c v-else/><d/>"#;
        let result = extract(source);
        assert_eq!(
            kinds(&result.items),
            vec![TemplateItemKind::Conditional, TemplateItemKind::Element]
        );
        let TemplateItem::Conditional(chain) = &result.items[0] else {
            panic!("expected a conditional");
        };
        let branches: Vec<BranchKind> = chain.branches.iter().map(|b| b.kind).collect();
        assert_eq!(branches, vec![BranchKind::If, BranchKind::ElseIf, BranchKind::Else]);
        assert_eq!(chain.children.len(), 3);
        // the conditional directive is not repeated as a directive item
        assert!(chain.children[0].children().is_empty());
    }

    #[test]
    fn test_unfinished_chain_keeps_trailing_comment() {
        let source = r#"<a v-if="x"/><!-- c --><d/>"#;
        let result = extract(source);
        assert_eq!(
            kinds(&result.items),
            vec![
                TemplateItemKind::Conditional,
                TemplateItemKind::Comment,
                TemplateItemKind::Element
            ]
        );
    }

    #[test]
    fn test_orphan_else_warns() {
        let result = extract(r#"<a v-else/>"#);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.items[0].children().len(), 1);
    }

    #[test]
    fn test_loop_scope() {
        let source = r#"<li v-for="(item, i) in items" :key="item.id">{{ item.name }}</li>"#;
        let result = extract(source);
        let TemplateItem::Loop(l) = &result.items[0] else {
            panic!("expected a loop");
        };
        assert_eq!(l.aliases.span.text(source), "(item, i)");
        assert_eq!(l.source.span.text(source), "items");
        assert_eq!(l.alias_names, vec![SmolStr::new("item"), SmolStr::new("i")]);
        assert!(l.locals.is_empty());
        let TemplateItem::Element(li) = &l.children[0] else {
            panic!("expected an element");
        };
        assert_eq!(kinds(&li.children), vec![TemplateItemKind::Directive, TemplateItemKind::Interpolation]);
        let TemplateItem::Interpolation(interp) = &li.children[1] else {
            panic!("expected an interpolation");
        };
        assert_eq!(interp.locals.len(), 2);
    }

    #[test]
    fn test_split_for_variants() {
        let value = Expression {
            content: " n of 10 ".to_string(),
            span: Span::new(0u32, 9u32),
        };
        let (aliases, source) = split_for(&value).unwrap();
        assert_eq!(aliases.content, "n");
        assert_eq!(source.content, "10");
        let bad = Expression {
            content: "items".to_string(),
            span: Span::new(0u32, 5u32),
        };
        assert!(split_for(&bad).is_none());
    }

    #[test]
    fn test_slots() {
        let source = r#"<List><template #item="{ row }">{{ row }}</template><template #footer>f</template></List><slot name="x" :a="b"/>"#;
        let result = extract(source);
        let TemplateItem::Element(list) = &result.items[0] else {
            panic!("expected an element");
        };
        assert!(list.element.is_component());
        let slots: Vec<&SlotItem> = list
            .children
            .iter()
            .filter_map(|c| match c {
                TemplateItem::Slot(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].name, SlotName::Static("item".to_string()));
        assert!(matches!(slots[1].kind, SlotKind::Template { index: 1, count: 2, .. }));
        let TemplateItem::Interpolation(interp) = &slots[0].children[0] else {
            panic!("expected an interpolation");
        };
        assert_eq!(interp.locals, vec![SmolStr::new("row")]);

        let TemplateItem::Slot(outlet) = &result.items[1] else {
            panic!("expected an outlet");
        };
        assert_eq!(outlet.name, SlotName::Static("x".to_string()));
        assert_eq!(kinds(&outlet.children), vec![TemplateItemKind::Directive]);
    }

    #[test]
    fn test_component_classification() {
        let mut bindings = FxHashSet::default();
        bindings.insert(SmolStr::new("Foo"));
        assert_eq!(classify("div", &bindings).0, ElementKind::Native);
        assert_eq!(classify("foo", &bindings), (ElementKind::Component, Some("Foo".into())));
        assert_eq!(classify("my-button", &bindings).1.as_deref(), Some("MyButton"));
        assert_eq!(classify("Ui.Card", &bindings).0, ElementKind::Component);
        assert_eq!(classify("template", &bindings).0, ElementKind::Fragment);
        assert_eq!(classify("component", &bindings).0, ElementKind::Dynamic);
    }
}
