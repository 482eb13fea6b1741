//! Worker options.
//!
//! Options arrive from the coordinator. They are layered the same way the
//! bundler CLI layers its configuration:
//! CLI arguments > `FOB_WORKER_*` environment variables > defaults.

use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

/// What to do when the compiler fails fatally while watching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchFatalPolicy {
    /// Close the watcher and finish the worker with the error
    #[default]
    Stop,
    /// Log the error and keep waiting for the next rebuild
    Continue,
}

/// Options recognized by the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    /// Rebuild continuously on changes
    #[serde(skip_serializing_if = "is_false")]
    pub watch: bool,

    /// Machine-readable mode: no human-readable progress output
    #[serde(skip_serializing_if = "is_false")]
    pub json: bool,

    /// Emit full statistics
    #[serde(skip_serializing_if = "is_false")]
    pub stats: bool,

    /// Colored output; detected from the terminal when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<bool>,

    /// Arguments handed to configuration scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argv: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules_sort: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_sort: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_sort: Option<String>,

    /// Module exclusion pattern for statistics output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// Fatal-error behavior in watch mode
    #[serde(skip_serializing_if = "WatchFatalPolicy::is_default")]
    pub on_watch_fatal: WatchFatalPolicy,
}

impl WatchFatalPolicy {
    fn is_default(&self) -> bool {
        *self == WatchFatalPolicy::default()
    }
}

// Unset flags are left out so lower layers (environment) can still enable them.
fn is_false(value: &bool) -> bool {
    !*value
}

impl BuildOptions {
    /// Layer `overrides` over `FOB_WORKER_*` environment variables and
    /// defaults.
    pub fn load(overrides: &BuildOptions) -> Result<Self> {
        Self::figment(overrides).extract().map_err(|e| {
            ConfigError::InvalidValue {
                field: "options".to_string(),
                value: e.to_string(),
                hint: "Check FOB_WORKER_* environment variables and command-line flags"
                    .to_string(),
            }
            .into()
        })
    }

    fn figment(overrides: &BuildOptions) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(BuildOptions::default()))
            .merge(
                Env::prefixed("FOB_WORKER_")
                    .map(|key| env_key_to_field(key.as_str()).into())
                    .lowercase(false),
            )
            .merge(Serialized::defaults(overrides))
    }

    /// Whether human-readable output is suppressed.
    pub fn is_silent(&self) -> bool {
        self.json
    }
}

/// `MODULES_SORT` -> `modulesSort`.
fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            field.extend(c.to_uppercase());
            upper = false;
        } else {
            field.extend(c.to_lowercase());
        }
    }
    field
}
