//! Built-in plugins and the default pipelines.

mod helpers;
pub mod script;
pub mod template;

pub use helpers::HelpersPlugin;

use crate::engine::{ScriptPlugin, TemplatePlugin};

/// Script plugins in default order.
pub const SCRIPT_PLUGINS: &[&str] = &[
    "script-block",
    "full-context",
    "bindings",
    "macros",
    "infer-function",
    "template-ref",
    "template-binding",
    "component-instance",
    "helpers",
];

/// Template plugins in default order.
pub const TEMPLATE_PLUGINS: &[&str] = &[
    "render",
    "conditional",
    "loop",
    "slot",
    "element",
    "directive",
    "event",
    "interpolation",
    "helpers",
];

/// Looks up a script plugin by name.
pub fn script_plugin(name: &str) -> Option<ScriptPlugin> {
    use script::*;
    let plugin: ScriptPlugin = match name {
        "script-block" => Box::new(ScriptBlockPlugin),
        "full-context" => Box::new(FullContextPlugin),
        "bindings" => Box::new(BindingsPlugin),
        "macros" => Box::new(MacrosPlugin),
        "infer-function" => Box::new(InferFunctionPlugin),
        "template-ref" => Box::new(TemplateRefPlugin),
        "template-binding" => Box::new(TemplateBindingPlugin),
        "component-instance" => Box::new(ComponentInstancePlugin),
        "helpers" => Box::new(HelpersPlugin),
        _ => return None,
    };
    Some(plugin)
}

/// Looks up a template plugin by name.
pub fn template_plugin(name: &str) -> Option<TemplatePlugin> {
    use template::*;
    let plugin: TemplatePlugin = match name {
        "render" => Box::new(RenderPlugin),
        "conditional" => Box::new(ConditionalPlugin),
        "loop" => Box::new(LoopPlugin),
        "slot" => Box::new(SlotPlugin),
        "element" => Box::new(ElementPlugin),
        "directive" => Box::new(DirectivePlugin),
        "event" => Box::new(EventPlugin),
        "interpolation" => Box::new(InterpolationPlugin),
        "helpers" => Box::new(HelpersPlugin),
        _ => return None,
    };
    Some(plugin)
}

pub fn default_script_plugins() -> Vec<ScriptPlugin> {
    SCRIPT_PLUGINS.iter().filter_map(|name| script_plugin(name)).collect()
}

pub fn default_template_plugins() -> Vec<TemplatePlugin> {
    TEMPLATE_PLUGINS.iter().filter_map(|name| template_plugin(name)).collect()
}
