//! The state shared by the plugins of one pipeline run.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use serde::Serialize;
use smol_str::SmolStr;
use source_map::{PatchBuffer, Span};
use vue_parser::{Block, BlockKind, SfcParseResult};

use crate::facts::TemplateFacts;
use crate::generics::{GenericInfo, GenericSanitizer};
use crate::helpers::Helper;
use crate::items::{BindingKind, DeclarationType, MacroName};

/// The marker every generated top-level name starts with.
pub const DEFAULT_PREFIX: &str = "___GENERATED___";

/// Maps a base name to its generated, collision-free form.
pub type Naming = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Describes a block in the `/* ... */` marker left in its place.
pub type BlockNameResolver = Arc<dyn Fn(&Block) -> String + Send + Sync>;

/// A naming function that prepends `prefix`.
pub fn prefix_naming(prefix: impl Into<String>) -> Naming {
    let prefix = prefix.into();
    Arc::new(move |name: &str| format!("{prefix}{name}"))
}

fn default_block_name(block: &Block) -> String {
    match block.lang.as_deref() {
        Some(lang) => format!("<{} lang=\"{}\">", block.tag, lang),
        None => format!("<{}>", block.tag),
    }
}

/// The partial context a pipeline run starts from.
#[derive(Clone)]
pub struct ContextOptions {
    /// The buffer to edit; cloned on entry.
    pub buffer: PatchBuffer,
    pub filename: String,
    pub blocks: Vec<Block>,
    /// The main script's `generic` attribute.
    pub generic: Option<String>,
    pub is_async: bool,
    /// Whether scripts and template expressions are TypeScript.
    pub is_typed: bool,
    /// Re-assert ancestor `v-if` guards inside nested scopes.
    pub narrow: bool,
    pub naming: Naming,
    pub block_name: BlockNameResolver,
    pub template: TemplateFacts,
    /// Top-level names of the main script.
    pub script_bindings: IndexSet<SmolStr>,
    /// Helpers an earlier run already used and declared.
    pub used_helpers: IndexSet<Helper>,
    pub declared_helpers: IndexSet<Helper>,
}

impl ContextOptions {
    pub fn new(buffer: PatchBuffer) -> Self {
        Self {
            buffer,
            filename: vue_parser::DEFAULT_FILENAME.to_string(),
            blocks: Vec::new(),
            generic: None,
            is_async: false,
            is_typed: false,
            narrow: false,
            naming: prefix_naming(DEFAULT_PREFIX),
            block_name: Arc::new(default_block_name),
            template: TemplateFacts::default(),
            script_bindings: IndexSet::new(),
            used_helpers: IndexSet::new(),
            declared_helpers: IndexSet::new(),
        }
    }

    /// Options seeded from a parsed component.
    pub fn from_parse(parsed: &SfcParseResult) -> Self {
        let is_typed = parsed.main_script().is_some_and(Block::is_typed);
        Self {
            filename: parsed.filename.clone(),
            blocks: parsed.blocks.clone(),
            generic: parsed.generic.clone(),
            is_async: parsed.is_async,
            is_typed,
            ..Self::new(parsed.buffer.clone())
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.naming = prefix_naming(prefix);
        self
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("filename", &self.filename)
            .field("blocks", &self.blocks.len())
            .field("generic", &self.generic)
            .field("is_async", &self.is_async)
            .field("is_typed", &self.is_typed)
            .field("narrow", &self.narrow)
            .finish_non_exhaustive()
    }
}

/// A typed record plugins leave for later plugins and for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContextItem {
    #[serde(rename_all = "camelCase")]
    Binding {
        name: SmolStr,
        kind: BindingKind,
        span: Span,
    },
    #[serde(rename_all = "camelCase")]
    MacroBinding {
        macro_name: MacroName,
        declaration_type: DeclarationType,
        /// The generated payload declaration.
        declaration_name: Option<String>,
        /// The variable holding the macro's value.
        value_name: SmolStr,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found while transforming, located in the original source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

/// Mutable state of one pipeline run.
pub struct ProcessContext {
    pub filename: String,
    pub blocks: Vec<Block>,
    pub generic: GenericInfo,
    pub is_async: bool,
    pub is_typed: bool,
    pub narrow: bool,
    pub template: TemplateFacts,
    pub script_bindings: IndexSet<SmolStr>,
    pub items: Vec<ContextItem>,
    /// Attribute spans a plugin already rewrote.
    pub handled_attributes: FxHashSet<Span>,
    /// Conditions of the enclosing `v-if` branches, outermost first.
    pub guards: Vec<(Span, String)>,
    pub used_helpers: IndexSet<Helper>,
    pub declared_helpers: IndexSet<Helper>,
    pub diagnostics: Vec<Diagnostic>,
    naming: Naming,
    block_name: BlockNameResolver,
    sanitizer: GenericSanitizer,
    next_id: usize,
}

impl ProcessContext {
    pub fn new(options: &ContextOptions) -> Self {
        let naming = options.naming.clone();
        let sanitizer = GenericSanitizer::new(naming(""));
        Self {
            filename: options.filename.clone(),
            blocks: options.blocks.clone(),
            generic: options.generic.as_deref().map(GenericInfo::parse).unwrap_or_default(),
            is_async: options.is_async,
            is_typed: options.is_typed,
            narrow: options.narrow,
            template: options.template.clone(),
            script_bindings: options.script_bindings.clone(),
            items: Vec::new(),
            handled_attributes: FxHashSet::default(),
            guards: Vec::new(),
            used_helpers: options.used_helpers.clone(),
            declared_helpers: options.declared_helpers.clone(),
            diagnostics: Vec::new(),
            naming,
            block_name: options.block_name.clone(),
            sanitizer,
            next_id: 0,
        }
    }

    /// The generated form of `base`.
    pub fn name(&self, base: &str) -> String {
        (self.naming)(base)
    }

    /// The template context parameter.
    pub fn ctx_name(&self) -> String {
        self.name("ctx")
    }

    /// Marks `helper` used and returns its generated name.
    pub fn helper(&mut self, helper: Helper) -> String {
        self.used_helpers.insert(helper);
        self.name(helper.base_name())
    }

    /// A number unique within this run.
    pub fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Span) {
        let message = message.into();
        tracing::debug!(%message, ?span, "transform warning");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
            span,
        });
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
            span,
        });
    }

    pub fn main_script(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.is_main_script)
    }

    pub fn template_block(&self) -> Option<&Block> {
        self.blocks.iter().find(|b| b.kind == BlockKind::Template)
    }

    /// Whether the component uses `<script setup>`.
    pub fn is_setup(&self) -> bool {
        self.main_script().is_some_and(Block::is_setup)
    }

    pub fn block_name(&self, block: &Block) -> String {
        (self.block_name)(block)
    }

    /// `<T extends X>` as written, or empty.
    pub fn generic_defs(&self) -> String {
        self.generic.defs()
    }

    /// `<T>`, or empty.
    pub fn generic_refs(&self) -> String {
        self.generic.refs()
    }

    /// Definitions under collision-safe names, each defaulted to `any`.
    pub fn sanitized_defs(&mut self) -> String {
        self.sanitizer.defs(&self.generic)
    }

    pub fn sanitized_refs(&mut self) -> String {
        self.sanitizer.refs(&self.generic)
    }

    /// Every recorded binding, in order.
    pub fn bindings(&self) -> impl Iterator<Item = (&SmolStr, BindingKind)> {
        self.items.iter().filter_map(|item| match item {
            ContextItem::Binding { name, kind, .. } => Some((name, *kind)),
            ContextItem::MacroBinding { .. } => None,
        })
    }

    /// The value name of the first binding of `macro_name`.
    pub fn macro_value(&self, macro_name: MacroName) -> Option<&SmolStr> {
        self.items.iter().find_map(|item| match item {
            ContextItem::MacroBinding {
                macro_name: m,
                value_name,
                ..
            } if *m == macro_name => Some(value_name),
            _ => None,
        })
    }
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("filename", &self.filename)
            .field("is_async", &self.is_async)
            .field("is_typed", &self.is_typed)
            .field("items", &self.items)
            .field("used_helpers", &self.used_helpers)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
