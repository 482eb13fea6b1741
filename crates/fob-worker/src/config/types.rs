use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Entry points of a build, in declaration order.
///
/// A bare string in the configuration is shorthand for `{ "main": <string> }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntrySpec")]
pub struct EntryPoints(IndexMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum EntrySpec {
    Single(String),
    Named(IndexMap<String, String>),
}

impl From<EntrySpec> for EntryPoints {
    fn from(spec: EntrySpec) -> Self {
        match spec {
            EntrySpec::Single(source) => {
                let mut map = IndexMap::new();
                map.insert(super::DEFAULT_ENTRY_NAME.to_string(), source);
                EntryPoints(map)
            }
            EntrySpec::Named(map) => EntryPoints(map),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EntryPoints {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        EntryPoints(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl EntryPoints {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry-point names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    /// Filename template, may contain `[name]`
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            path: None,
        }
    }
}

/// Watch-mode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchOptions {
    /// Changes within this many milliseconds collapse into one rebuild
    #[serde(default = "default_aggregate_timeout")]
    pub aggregate_timeout: u64,

    /// Paths to ignore: directory names or `*.ext` patterns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,

    /// Poll the filesystem at this interval (ms) instead of native events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<u64>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            aggregate_timeout: default_aggregate_timeout(),
            ignored: vec![],
            poll: None,
        }
    }
}

pub fn default_filename() -> String {
    "[name].js".to_string()
}

pub fn default_aggregate_timeout() -> u64 {
    300
}
