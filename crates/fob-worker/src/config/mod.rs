//! Build configuration artifacts.
//!
//! A configuration file yields either one build configuration or an ordered
//! collection of them. The coordinator spawns one worker per configuration
//! and tells each worker which index it owns and how many configurations it
//! expects to exist.

mod loading;
mod tests;
mod types;
mod validation;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::stats::StatsOptions;

pub use loading::{ConfigLoader, FileConfigLoader, LoadContext};
pub use types::*;

/// A single build configuration.
///
/// Fields the worker does not interpret are kept in `extra` so custom
/// compilers can read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Explicit display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Entry points, name -> source
    #[serde(default)]
    pub entry: EntryPoints,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Statistics formatting defaults
    #[serde(default)]
    pub stats: StatsOptions,

    /// Options for watch mode
    #[serde(default)]
    pub watch_options: WatchOptions,

    /// Ask for watch mode regardless of worker options
    #[serde(default)]
    pub watch: bool,

    /// Base directory for the build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,

    /// Build command run by the process compiler
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Uninterpreted fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl BuildConfig {
    /// Human-readable name used in log output.
    ///
    /// Prefers the explicit `name`. Otherwise uses the output filename
    /// template, substituting `[name]` when there is exactly one entry point.
    /// With several entry points the placeholder is ambiguous and the
    /// template is returned unchanged.
    pub fn display_name(&self) -> String {
        if let Some(ref name) = self.name {
            return name.clone();
        }

        let template = &self.output.filename;
        if template.contains(NAME_PLACEHOLDER) && self.entry.len() == 1 {
            if let Some(entry_name) = self.entry.names().next() {
                return template.replace(NAME_PLACEHOLDER, entry_name);
            }
        }

        template.clone()
    }

    /// Directory the build runs in.
    pub fn context_dir(&self) -> PathBuf {
        self.context
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Placeholder replaced by the entry-point name in filename templates.
pub const NAME_PLACEHOLDER: &str = "[name]";

/// Entry name used when the entry is given as a bare string.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// The loaded contents of a configuration file.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigArtifact {
    /// The file describes one build
    Single(BuildConfig),
    /// The file describes an ordered collection of builds
    Multi(Vec<BuildConfig>),
}

impl ConfigArtifact {
    /// Build an artifact from a JSON value: arrays are collections, objects
    /// are single configurations.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Array(items) => {
                let configs = items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<BuildConfig>, _>>()?;
                Ok(ConfigArtifact::Multi(configs))
            }
            Value::Object(_) => Ok(ConfigArtifact::Single(serde_json::from_value(value)?)),
            other => Err(ConfigError::InvalidValue {
                field: "configuration".to_string(),
                value: other.to_string(),
                hint: "A configuration must be an object or an array of objects".to_string(),
            }),
        }
    }
}
