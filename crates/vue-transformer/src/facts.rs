//! Facts the script pipeline needs from the template.

use indexmap::IndexSet;
use serde::Serialize;
use smol_str::SmolStr;
use source_map::Span;
use vue_parser::{DirectiveArg, Expression};

use crate::engine::PipelineItem;
use crate::expression::{analyze, analyze_handler, ExprAnalysis};
use crate::items::{ElementInfo, ElementKind, SlotName, TemplateItem};
use crate::util::{camelize, pascalize};

/// Directives lowered to plain props; everything else is a custom directive.
pub(crate) const BUILTIN_DIRECTIVES: &[&str] = &[
    "bind", "on", "model", "slot", "if", "else-if", "else", "for", "show", "text", "html", "once",
    "pre", "cloak", "memo", "is",
];

/// The element an event handler or template ref is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "camelCase")]
pub enum Target {
    Element(SmolStr),
    Component(SmolStr),
    Unknown,
}

impl Target {
    fn of(element: &ElementInfo) -> Self {
        match (element.kind, &element.component) {
            (ElementKind::Component, Some(name)) => Target::Component(name.clone()),
            (ElementKind::Native, _) => Target::Element(element.name.clone()),
            _ => Target::Unknown,
        }
    }
}

/// `@event="handler"` with a bare identifier handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventHandlerRef {
    pub handler: SmolStr,
    pub event: SmolStr,
    pub target: Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum RefName {
    Static(String),
    /// `:ref` with anything but a string literal.
    Dynamic,
}

/// A `ref` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRef {
    pub name: RefName,
    pub target: Target,
    pub span: Span,
}

/// What the template reads from the script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFacts {
    /// Free identifiers and component names, in first-use order.
    pub bindings: IndexSet<SmolStr>,
    pub event_handlers: Vec<EventHandlerRef>,
    pub refs: Vec<TemplateRef>,
}

impl TemplateFacts {
    pub fn collect(items: &[TemplateItem], typed: bool) -> Self {
        let mut facts = TemplateFacts::default();
        facts.walk(items, typed);
        tracing::debug!(
            bindings = facts.bindings.len(),
            handlers = facts.event_handlers.len(),
            refs = facts.refs.len(),
            "collected template facts"
        );
        facts
    }

    fn walk(&mut self, items: &[TemplateItem], typed: bool) {
        for item in items {
            self.item(item, typed);
            self.walk(item.children(), typed);
        }
    }

    fn item(&mut self, item: &TemplateItem, typed: bool) {
        match item {
            TemplateItem::Element(el) => {
                if let Some(component) = &el.element.component {
                    let root = component.split('.').next().unwrap_or(component);
                    self.bindings.insert(SmolStr::new(root));
                }
                for attr in &el.attributes {
                    if attr.name == "ref" {
                        if let Some(value) = &attr.value {
                            self.refs.push(TemplateRef {
                                name: RefName::Static(value.value.clone()),
                                target: Target::of(&el.element),
                                span: attr.span,
                            });
                        }
                    }
                }
            }
            TemplateItem::Interpolation(interp) => {
                self.expression(&interp.expression, typed, &interp.locals, false);
            }
            TemplateItem::Directive(item) => {
                let directive = &item.directive;
                if let Some(DirectiveArg::Dynamic(arg)) = &directive.arg {
                    self.expression(arg, typed, &item.locals, false);
                }
                let arg = directive.arg.as_ref().and_then(|a| a.static_name());
                match directive.name.as_str() {
                    "on" => {
                        let analysis = directive
                            .value
                            .as_ref()
                            .and_then(|v| self.expression(v, typed, &item.locals, true));
                        if let (Some(event), Some(handler)) = (arg, analysis.as_ref().and_then(|a| a.identifier())) {
                            self.event_handlers.push(EventHandlerRef {
                                handler: handler.clone(),
                                event: SmolStr::new(event),
                                target: Target::of(&item.element),
                            });
                        }
                    }
                    "bind" if directive.value.is_none() => {
                        if let Some(arg) = arg {
                            self.bindings.insert(SmolStr::new(camelize(arg)));
                        }
                    }
                    "bind" if arg == Some("ref") => {
                        let name = directive
                            .value
                            .as_ref()
                            .and_then(|v| string_literal_value(&v.content))
                            .map_or(RefName::Dynamic, RefName::Static);
                        self.refs.push(TemplateRef {
                            name,
                            target: Target::of(&item.element),
                            span: directive.span,
                        });
                        if let Some(value) = &directive.value {
                            self.expression(value, typed, &item.locals, false);
                        }
                    }
                    name => {
                        if !BUILTIN_DIRECTIVES.contains(&name) {
                            self.bindings.insert(SmolStr::new(format!("v{}", pascalize(name))));
                        }
                        if let Some(value) = &directive.value {
                            self.expression(value, typed, &item.locals, false);
                        }
                    }
                }
            }
            TemplateItem::Conditional(chain) => {
                for branch in &chain.branches {
                    if let Some(condition) = branch.condition() {
                        self.expression(condition, typed, &chain.locals, false);
                    }
                }
            }
            TemplateItem::Loop(l) => {
                self.expression(&l.source, typed, &l.locals, false);
            }
            TemplateItem::Slot(slot) => {
                if let SlotName::Dynamic(expr) = &slot.name {
                    self.expression(expr, typed, &slot.locals, false);
                }
            }
            TemplateItem::Text(_) | TemplateItem::Comment(_) => {}
        }
    }

    fn expression(&mut self, expr: &Expression, typed: bool, locals: &[SmolStr], handler: bool) -> Option<ExprAnalysis> {
        let analysis = if handler {
            analyze_handler(expr, typed, locals)
        } else {
            analyze(expr, typed, locals)
        };
        let analysis = analysis.ok()?;
        for r in &analysis.refs {
            self.bindings.insert(r.name.clone());
        }
        Some(analysis)
    }

    /// The event handlers bound to a script function, in template order.
    pub fn handlers_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EventHandlerRef> + 'a {
        self.event_handlers.iter().filter(move |h| h.handler == name)
    }
}

/// The value of a quoted string literal expression.
pub(crate) fn string_literal_value(content: &str) -> Option<String> {
    let trimmed = content.trim();
    let quote = trimmed.chars().next().filter(|c| matches!(c, '\'' | '"' | '`'))?;
    let inner = trimmed.strip_prefix(quote)?.strip_suffix(quote)?;
    if inner.contains(quote) || inner.contains('\\') || (quote == '`' && inner.contains("${")) {
        return None;
    }
    Some(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{extract_template_items, TemplateExtractOptions};
    use pretty_assertions::assert_eq;
    use vue_parser::parse_fragment;

    fn facts(source: &str) -> TemplateFacts {
        let parsed = parse_fragment(source, 0, source.len());
        let items = extract_template_items(&parsed.nodes, &TemplateExtractOptions::default()).items;
        TemplateFacts::collect(&items, false)
    }

    #[test]
    fn test_bindings() {
        let f = facts(
            r#"<MyList v-for="item in items" :key="item.id" v-focus><p>{{ count + Math.PI }}</p></MyList><input :value/>"#,
        );
        let names: Vec<&str> = f.bindings.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["items", "MyList", "vFocus", "count", "value"]);
    }

    #[test]
    fn test_event_handlers() {
        let f = facts(r#"<button @click="onClick"/><Child @update:model-value="onUpdate" @close="open = false"/>"#);
        assert_eq!(
            f.event_handlers,
            vec![
                EventHandlerRef {
                    handler: "onClick".into(),
                    event: "click".into(),
                    target: Target::Element("button".into()),
                },
                EventHandlerRef {
                    handler: "onUpdate".into(),
                    event: "update:model-value".into(),
                    target: Target::Component("Child".into()),
                },
            ]
        );
        assert_eq!(f.handlers_for("onClick").count(), 1);
    }

    #[test]
    fn test_refs() {
        let f = facts(r#"<div ref="box"/><Child :ref="'child'"/><span :ref="dynamic"/>"#);
        let names: Vec<&RefName> = f.refs.iter().map(|r| &r.name).collect();
        assert_eq!(
            names,
            vec![
                &RefName::Static("box".into()),
                &RefName::Static("child".into()),
                &RefName::Dynamic
            ]
        );
        assert_eq!(f.refs[1].target, Target::Component("Child".into()));
    }

    #[test]
    fn test_string_literal_value() {
        assert_eq!(string_literal_value(" 'a' ").as_deref(), Some("a"));
        assert_eq!(string_literal_value("`a${b}`"), None);
        assert_eq!(string_literal_value("a"), None);
    }
}
