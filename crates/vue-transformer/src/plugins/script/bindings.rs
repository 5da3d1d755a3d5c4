use source_map::PatchBuffer;

use crate::context::{ContextItem, ProcessContext};
use crate::engine::{Handles, Plugin, TransformResult};
use crate::items::{BindingKind, ScriptItem, ScriptItemKind};

/// Records the top-level names of the script and surfaces extractor
/// diagnostics.
pub struct BindingsPlugin;

impl Plugin<ScriptItem> for BindingsPlugin {
    fn name(&self) -> &'static str {
        "bindings"
    }

    fn handles(&self) -> Handles<ScriptItemKind> {
        Handles::Kinds(&[
            ScriptItemKind::Import,
            ScriptItemKind::Declaration,
            ScriptItemKind::Binding,
            ScriptItemKind::AsyncMarker,
            ScriptItemKind::Warning,
            ScriptItemKind::Error,
        ])
    }

    fn transform(&self, item: &ScriptItem, _buffer: &mut PatchBuffer, ctx: &mut ProcessContext) -> TransformResult<()> {
        match item {
            ScriptItem::Import(import) if !import.type_only => {
                for spec in import.specifiers.iter().filter(|s| !s.type_only) {
                    ctx.items.push(ContextItem::Binding {
                        name: spec.local.clone(),
                        kind: BindingKind::Import,
                        span: import.span,
                    });
                }
            }
            ScriptItem::Declaration(decl) => ctx.items.push(ContextItem::Binding {
                name: decl.name.clone(),
                kind: decl.kind,
                span: decl.name_span,
            }),
            ScriptItem::Binding(binding) => ctx.items.push(ContextItem::Binding {
                name: binding.name.clone(),
                kind: binding.kind,
                span: binding.span,
            }),
            ScriptItem::AsyncMarker(_) => ctx.is_async = true,
            ScriptItem::Warning(d) => ctx.warn(d.message.clone(), d.span),
            ScriptItem::Error(d) => ctx.error(d.message.clone(), d.span),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextOptions, Severity};
    use crate::engine::{process_script, ScriptPlugin};
    use crate::items::extract_script_items;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_records_value_bindings() {
        let source = r#"<script setup lang="ts">
import type { A } from './a'
import B, { type C, d } from './b'
const { e, ...f } = useThing()
function g() {}
interface H {}
</script>"#;
        let parsed = vue_parser::parse(source);
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let plugins: Vec<ScriptPlugin> = vec![Box::new(BindingsPlugin)];
        let result = process_script(&items, &plugins, &ContextOptions::from_parse(&parsed)).unwrap();
        let names: Vec<(&str, BindingKind)> = result
            .context
            .bindings()
            .map(|(name, kind)| (name.as_str(), kind))
            .collect();
        assert_eq!(
            names,
            vec![
                ("B", BindingKind::Import),
                ("d", BindingKind::Import),
                ("e", BindingKind::Const),
                ("f", BindingKind::Const),
                ("g", BindingKind::Function),
                ("H", BindingKind::Type),
            ]
        );
    }

    #[test]
    fn test_surfaces_diagnostics() {
        let parsed = vue_parser::parse("<script setup>\nfunction f() { defineProps() }\n</script>");
        let items = parsed.script.as_ref().map(extract_script_items).unwrap_or_default();
        let plugins: Vec<ScriptPlugin> = vec![Box::new(BindingsPlugin)];
        let result = process_script(&items, &plugins, &ContextOptions::from_parse(&parsed)).unwrap();
        assert_eq!(result.context.diagnostics.len(), 1);
        assert_eq!(result.context.diagnostics[0].severity, Severity::Warning);
    }
}
