//! Plugins of the script pipeline.

mod bindings;
mod component_instance;
mod full_context;
mod infer_function;
mod macros;
mod script_block;
mod template_binding;
mod template_ref;

pub use bindings::BindingsPlugin;
pub use component_instance::ComponentInstancePlugin;
pub use full_context::FullContextPlugin;
pub use infer_function::InferFunctionPlugin;
pub use macros::MacrosPlugin;
pub use script_block::ScriptBlockPlugin;
pub use template_binding::TemplateBindingPlugin;
pub use template_ref::TemplateRefPlugin;
