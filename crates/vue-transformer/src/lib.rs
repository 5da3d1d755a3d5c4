//! Vue single-file component to TSX transformation for type-checking.
//!
//! A component is compiled in two pipelines that share one overlay buffer:
//! - the template pipeline lowers `<template>` markup into a render function
//!   whose expressions read component state through a typed context
//! - the script pipeline rewrites the scripts, resolves compiler macros and
//!   synthesizes the types the render function refers to
//!
//! Each pipeline extracts flat items from its AST and folds them through an
//! ordered list of plugins. Edits go through [`source_map::PatchBuffer`], so
//! every generated position maps back to the component source.
//!
//! # Example
//!
//! ```
//! use vue_transformer::{compile, CompileOptions};
//!
//! let source = r#"
//! <script setup lang="ts">
//! const count = ref(0)
//! </script>
//!
//! <template>
//!   <button @click="count++">{{ count }}</button>
//! </template>
//! "#;
//!
//! let output = compile(source, &CompileOptions::default()).unwrap();
//! println!("TSX output:\n{}", output.code);
//! ```

mod compile;
pub mod context;
pub mod engine;
mod expression;
pub mod facts;
pub mod generics;
pub mod helpers;
pub mod items;
mod options;
pub mod plugins;
mod util;

pub use compile::{compile, CompileOutput};
pub use context::{ContextOptions, Diagnostic, ProcessContext, Severity, DEFAULT_PREFIX};
pub use engine::{process_script, process_template, Plugin, ProcessResult, TransformError, TransformResult};
pub use options::{CompileOptions, ConfigError, PluginSelection};
