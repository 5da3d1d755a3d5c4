//! The plugin pipeline engine.
//!
//! A pipeline run is a fold over an item tree with an ordered list of plugins:
//!
//! 1. every `pre` hook, in plugin order
//! 2. every item in source order (pre-order over nested items), handed to each
//!    plugin registered for its kind, in plugin order
//! 3. every `post` hook, in plugin order
//!
//! Plugins are stable-sorted so `Enforce::Pre` plugins come first and
//! `Enforce::Post` plugins last. The buffer is cloned on entry; the caller's
//! buffer is never touched.

use std::fmt::Debug;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use source_map::{PatchBuffer, PatchError};
use thiserror::Error;
use vue_parser::ParseError;

use crate::context::{ContextOptions, ProcessContext};
use crate::items::{ScriptItem, TemplateItem};
use crate::options::ConfigError;

/// Error raised by a pipeline run.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A plugin failed; the run is aborted.
    #[error("plugin `{plugin}` failed: {source}")]
    Plugin {
        plugin: &'static str,
        source: Box<TransformError>,
    },
}

pub type TransformResult<T> = Result<T, TransformError>;

/// The discriminant of a pipeline item.
pub trait ItemKind: Copy + Eq + Hash + Debug + 'static {
    /// Every kind, used to build dispatch tables.
    const ALL: &'static [Self];
}

/// An item a pipeline walks.
pub trait PipelineItem {
    type Kind: ItemKind;

    fn kind(&self) -> Self::Kind;

    /// Nested items, visited right after this one.
    fn children(&self) -> &[Self]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Where a plugin sorts relative to unmarked plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforce {
    Pre,
    Post,
}

/// The item kinds a plugin's `transform` receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handles<K: 'static> {
    None,
    All,
    Kinds(&'static [K]),
}

impl<K: ItemKind> Handles<K> {
    fn includes(&self, kind: K) -> bool {
        match self {
            Handles::None => false,
            Handles::All => true,
            Handles::Kinds(kinds) => kinds.contains(&kind),
        }
    }
}

/// A pipeline plugin.
///
/// Plugins are stateless; anything that must outlive a single call goes into
/// the [`ProcessContext`].
pub trait Plugin<I: PipelineItem> {
    fn name(&self) -> &'static str;

    fn enforce(&self) -> Option<Enforce> {
        None
    }

    fn handles(&self) -> Handles<I::Kind> {
        Handles::None
    }

    fn pre(&self, _buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
        Ok(())
    }

    fn transform(&self, _item: &I, _buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
        Ok(())
    }

    fn post(&self, _buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
        Ok(())
    }
}

pub type ScriptPlugin = Box<dyn Plugin<ScriptItem>>;
pub type TemplatePlugin = Box<dyn Plugin<TemplateItem>>;

/// The outcome of a pipeline run.
#[derive(Debug)]
pub struct ProcessResult {
    pub context: ProcessContext,
    pub buffer: PatchBuffer,
    /// The materialized buffer.
    pub result: String,
}

/// Runs the script pipeline.
pub fn process_script(
    items: &[ScriptItem],
    plugins: &[ScriptPlugin],
    options: &ContextOptions,
) -> TransformResult<ProcessResult> {
    process(items, plugins, options)
}

/// Runs the template pipeline.
pub fn process_template(
    items: &[TemplateItem],
    plugins: &[TemplatePlugin],
    options: &ContextOptions,
) -> TransformResult<ProcessResult> {
    process(items, plugins, options)
}

/// Runs `plugins` over `items`.
pub fn process<I, P>(items: &[I], plugins: &[P], options: &ContextOptions) -> TransformResult<ProcessResult>
where
    I: PipelineItem,
    P: AsRef<dyn Plugin<I>>,
{
    let mut ordered: Vec<&dyn Plugin<I>> = plugins.iter().map(|p| p.as_ref()).collect();
    ordered.sort_by_key(|p| match p.enforce() {
        Some(Enforce::Pre) => 0,
        None => 1,
        Some(Enforce::Post) => 2,
    });

    let mut dispatch: FxHashMap<I::Kind, Vec<&dyn Plugin<I>>> = FxHashMap::default();
    for &kind in I::Kind::ALL {
        let handlers: Vec<_> = ordered
            .iter()
            .copied()
            .filter(|p| p.handles().includes(kind))
            .collect();
        if !handlers.is_empty() {
            dispatch.insert(kind, handlers);
        }
    }

    let mut buffer = options.buffer.clone();
    let mut ctx = ProcessContext::new(options);

    for plugin in &ordered {
        tracing::trace!(plugin = plugin.name(), "pre");
        plugin.pre(&mut buffer, &mut ctx).map_err(|e| tag(*plugin, e))?;
    }

    let mut visited = 0usize;
    walk(items, &dispatch, &mut buffer, &mut ctx, &mut visited)?;

    for plugin in &ordered {
        tracing::trace!(plugin = plugin.name(), "post");
        plugin.post(&mut buffer, &mut ctx).map_err(|e| tag(*plugin, e))?;
    }

    tracing::debug!(
        plugins = ordered.len(),
        items = visited,
        diagnostics = ctx.diagnostics.len(),
        "pipeline finished"
    );

    let result = buffer.to_string();
    Ok(ProcessResult {
        context: ctx,
        buffer,
        result,
    })
}

fn walk<I: PipelineItem>(
    items: &[I],
    dispatch: &FxHashMap<I::Kind, Vec<&dyn Plugin<I>>>,
    buffer: &mut PatchBuffer,
    ctx: &mut ProcessContext,
    visited: &mut usize,
) -> TransformResult<()> {
    for item in items {
        *visited += 1;
        if let Some(handlers) = dispatch.get(&item.kind()) {
            for plugin in handlers {
                plugin.transform(item, buffer, ctx).map_err(|e| tag(*plugin, e))?;
            }
        }
        walk(item.children(), dispatch, buffer, ctx, visited)?;
    }
    Ok(())
}

fn tag<I: PipelineItem>(plugin: &dyn Plugin<I>, error: TransformError) -> TransformError {
    match error {
        // already attributed by a nested run
        TransformError::Plugin { .. } => error,
        other => TransformError::Plugin {
            plugin: plugin.name(),
            source: Box::new(other),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Word,
        Group,
    }

    impl ItemKind for Kind {
        const ALL: &'static [Self] = &[Kind::Word, Kind::Group];
    }

    struct Item {
        kind: Kind,
        at: u32,
        children: Vec<Item>,
    }

    impl PipelineItem for Item {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            self.kind
        }

        fn children(&self) -> &[Self] {
            &self.children
        }
    }

    /// Appends a marker to the output at every hook it sees.
    struct Marker {
        name: &'static str,
        enforce: Option<Enforce>,
        handles: Handles<Kind>,
    }

    impl Plugin<Item> for Marker {
        fn name(&self) -> &'static str {
            self.name
        }

        fn enforce(&self) -> Option<Enforce> {
            self.enforce
        }

        fn handles(&self) -> Handles<Kind> {
            self.handles
        }

        fn pre(&self, buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
            buffer.append(&format!("[pre {}]", self.name));
            Ok(())
        }

        fn transform(&self, item: &Item, buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
            buffer.append(&format!("[{} {:?}@{}]", self.name, item.kind, item.at));
            Ok(())
        }

        fn post(&self, buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
            buffer.append(&format!("[post {}]", self.name));
            Ok(())
        }
    }

    struct Failing;

    impl Plugin<Item> for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn pre(&self, buffer: &mut PatchBuffer, _ctx: &mut ProcessContext) -> TransformResult<()> {
            buffer.overwrite(1, 1, "x")?;
            Ok(())
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                kind: Kind::Group,
                at: 0,
                children: vec![Item {
                    kind: Kind::Word,
                    at: 1,
                    children: Vec::new(),
                }],
            },
            Item {
                kind: Kind::Word,
                at: 2,
                children: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_identity_without_plugins() {
        let options = ContextOptions::new(PatchBuffer::new("abc"));
        let plugins: Vec<Box<dyn Plugin<Item>>> = Vec::new();
        let result = process(&items(), &plugins, &options).unwrap();
        assert_eq!(result.result, "abc");
    }

    #[test]
    fn test_order() {
        let options = ContextOptions::new(PatchBuffer::new(""));
        let plugins: Vec<Box<dyn Plugin<Item>>> = vec![
            Box::new(Marker {
                name: "late",
                enforce: Some(Enforce::Post),
                handles: Handles::None,
            }),
            Box::new(Marker {
                name: "words",
                enforce: None,
                handles: Handles::Kinds(&[Kind::Word]),
            }),
            Box::new(Marker {
                name: "early",
                enforce: Some(Enforce::Pre),
                handles: Handles::All,
            }),
        ];
        let result = process(&items(), &plugins, &options).unwrap();
        assert_eq!(
            result.result,
            "[pre early][pre words][pre late]\
             [early Group@0][early Word@1][words Word@1][early Word@2][words Word@2]\
             [post early][post words][post late]"
        );
    }

    #[test]
    fn test_caller_buffer_untouched() {
        let options = ContextOptions::new(PatchBuffer::new("abc"));
        let plugins: Vec<Box<dyn Plugin<Item>>> = vec![Box::new(Marker {
            name: "m",
            enforce: None,
            handles: Handles::None,
        })];
        process(&items(), &plugins, &options).unwrap();
        assert_eq!(options.buffer.to_string(), "abc");
    }

    #[test]
    fn test_plugin_error_is_attributed() {
        let options = ContextOptions::new(PatchBuffer::new("abc"));
        let plugins: Vec<Box<dyn Plugin<Item>>> = vec![Box::new(Failing)];
        let error = process(&items(), &plugins, &options).unwrap_err();
        assert!(matches!(
            error,
            TransformError::Plugin {
                plugin: "failing",
                ..
            }
        ));
    }
}
