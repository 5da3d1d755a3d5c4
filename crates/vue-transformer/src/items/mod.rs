//! Item extraction for both pipelines.

mod script;
mod template;

pub use script::*;
pub use template::*;
