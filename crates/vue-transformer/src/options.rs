//! Compiler options.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::DEFAULT_PREFIX;
use crate::engine::{ScriptPlugin, TemplatePlugin};
use crate::plugins::{script_plugin, template_plugin, SCRIPT_PLUGINS, TEMPLATE_PLUGINS};

/// Error raised while loading options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown {pipeline} plugin `{name}`")]
    UnknownPlugin { pipeline: &'static str, name: String },
}

/// Options for [`compile`](crate::compile()).
///
/// Every field has a default, so `{}` is a valid JSON configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    pub filename: Option<String>,
    /// Marker prepended to every generated name.
    pub prefix: String,
    /// Re-assert `v-if` conditions inside nested callbacks.
    pub narrow: bool,
    /// Force typed or untyped output; by default the main script's `lang`
    /// decides.
    pub typed: Option<bool>,
    pub plugins: PluginSelection,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            filename: None,
            prefix: DEFAULT_PREFIX.to_string(),
            narrow: false,
            typed: None,
            plugins: PluginSelection::default(),
        }
    }
}

/// The plugins each pipeline runs, by name, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSelection {
    pub script: Vec<String>,
    pub template: Vec<String>,
}

impl Default for PluginSelection {
    fn default() -> Self {
        Self {
            script: SCRIPT_PLUGINS.iter().map(|s| s.to_string()).collect(),
            template: TEMPLATE_PLUGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn script_plugins(&self) -> Result<Vec<ScriptPlugin>, ConfigError> {
        self.plugins
            .script
            .iter()
            .map(|name| {
                script_plugin(name).ok_or_else(|| ConfigError::UnknownPlugin {
                    pipeline: "script",
                    name: name.clone(),
                })
            })
            .collect()
    }

    pub fn template_plugins(&self) -> Result<Vec<TemplatePlugin>, ConfigError> {
        self.plugins
            .template
            .iter()
            .map(|name| {
                template_plugin(name).ok_or_else(|| ConfigError::UnknownPlugin {
                    pipeline: "template",
                    name: name.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(CompileOptions::from_json("{}").unwrap(), CompileOptions::default());
    }

    #[test]
    fn test_partial_json() {
        let options = CompileOptions::from_json(
            r#"{ "prefix": "__v_", "narrow": true, "typed": false, "plugins": { "template": ["render"] } }"#,
        )
        .unwrap();
        assert_eq!(options.prefix, "__v_");
        assert!(options.narrow);
        assert_eq!(options.typed, Some(false));
        assert_eq!(options.plugins.template, ["render"]);
        assert_eq!(options.plugins.script.len(), SCRIPT_PLUGINS.len());
        assert_eq!(options.template_plugins().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_plugin() {
        let options = CompileOptions::from_json(r#"{ "plugins": { "script": ["macros", "nope"] } }"#).unwrap();
        let error = options.script_plugins().err().unwrap();
        assert_eq!(error.to_string(), "unknown script plugin `nope`");
        assert!(matches!(CompileOptions::from_json("{ nope"), Err(ConfigError::Json(_))));
    }
}
