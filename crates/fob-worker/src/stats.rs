//! Build statistics and their output options.
//!
//! A compiler reports one [`Stats`] per compilation. The worker renders it
//! either as JSON for the coordinator or as a human-readable table, shaped by
//! [`StatsOptions`]: sort keys for assets, chunks and modules, a module
//! `exclude` pattern, and whether to use colors.
//!
//! Sort keys name a field (`name`, `size`, `id`). A leading `!` sorts in
//! descending order. Unknown fields leave the compiler's order untouched.

use crate::error::ConfigError;
use crate::options::BuildOptions;
use crate::ui::format_size;
use owo_colors::OwoColorize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fmt::Write as _;

/// Statistics formatting options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules_sort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_sort: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_sort: Option<String>,

    /// Regular expression; matching modules are left out of the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<bool>,

    /// Options understood by other consumers, passed through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl StatsOptions {
    /// Overlay the statistics fields of `options` onto these defaults.
    ///
    /// Each field present in `options` wins; absent fields keep the
    /// configuration's value.
    pub fn merged_with(&self, options: &BuildOptions) -> StatsOptions {
        StatsOptions {
            modules_sort: options.modules_sort.clone().or_else(|| self.modules_sort.clone()),
            chunks_sort: options.chunks_sort.clone().or_else(|| self.chunks_sort.clone()),
            assets_sort: options.assets_sort.clone().or_else(|| self.assets_sort.clone()),
            exclude: options.exclude.clone().or_else(|| self.exclude.clone()),
            colors: options.colors.or(self.colors),
            extra: self.extra.clone(),
        }
    }

    /// Compile the `exclude` pattern.
    pub fn exclude_regex(&self) -> Result<Option<Regex>, ConfigError> {
        self.exclude
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                    field: "exclude".to_string(),
                    value: pattern.to_string(),
                    hint: format!("Not a valid regular expression: {}", e),
                })
            })
            .transpose()
    }

    fn use_colors(&self) -> bool {
        self.colors.unwrap_or(false)
    }
}

/// A diagnostic produced by a compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsMessage {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl StatsMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStat {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStat {
    pub id: usize,
    pub names: Vec<String>,
    pub size: u64,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleStat {
    pub id: usize,
    pub name: String,
    pub size: u64,
}

/// Statistics of one compilation.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub start_time: u64,
    pub end_time: u64,
    #[serde(default)]
    pub errors: Vec<StatsMessage>,
    #[serde(default)]
    pub warnings: Vec<StatsMessage>,
    #[serde(default)]
    pub assets: Vec<AssetStat>,
    #[serde(default)]
    pub chunks: Vec<ChunkStat>,
    #[serde(default)]
    pub modules: Vec<ModuleStat>,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    /// Build time in seconds: `(endTime - startTime) / 1000`.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms() as f64 / 1000.0
    }

    /// Serialize the statistics as shaped by `options`.
    pub fn to_json(&self, options: &StatsOptions) -> Value {
        let view = self.view(options);
        json!({
            "time": self.elapsed_ms(),
            "errors": self.errors.iter().map(|e| &e.message).collect::<Vec<_>>(),
            "warnings": self.warnings.iter().map(|w| &w.message).collect::<Vec<_>>(),
            "assets": view.assets,
            "chunks": view.chunks,
            "modules": view.modules,
        })
    }

    /// Render the statistics as a human-readable report.
    pub fn to_string(&self, options: &StatsOptions) -> String {
        let colors = options.use_colors();
        let view = self.view(options);
        let mut out = String::new();

        let _ = writeln!(out, "Time: {}ms", paint_bold(&self.elapsed_ms().to_string(), colors));

        if !view.assets.is_empty() {
            let width = view
                .assets
                .iter()
                .map(|a| a.name.len())
                .max()
                .unwrap_or(0)
                .max("Asset".len());
            let _ = writeln!(out, "{:>width$}  {:>10}", "Asset", "Size", width = width);
            for asset in &view.assets {
                let name = format!("{:>width$}", asset.name, width = width);
                let _ = writeln!(
                    out,
                    "{}  {:>10}",
                    paint_green(&name, colors),
                    format_size(asset.size)
                );
            }
        }

        for chunk in &view.chunks {
            let _ = writeln!(
                out,
                "chunk {{{}}} {} ({}) {}",
                chunk.id,
                chunk.files.join(", "),
                chunk.names.join(", "),
                format_size(chunk.size)
            );
        }

        for module in &view.modules {
            let _ = writeln!(
                out,
                "  [{}] {} {}",
                module.id,
                paint_bold(&module.name, colors),
                format_size(module.size)
            );
        }

        for warning in &self.warnings {
            let _ = writeln!(out, "\n{}", paint_yellow(&format!("WARNING {}", format_message(warning)), colors));
        }

        for error in &self.errors {
            let _ = writeln!(out, "\n{}", paint_red(&format!("ERROR {}", format_message(error)), colors));
        }

        out.trim_end().to_string()
    }

    fn view(&self, options: &StatsOptions) -> StatsView {
        let exclude = match options.exclude_regex() {
            Ok(regex) => regex,
            Err(e) => {
                tracing::warn!("ignoring stats exclude: {}", e);
                None
            }
        };

        let mut assets = self.assets.clone();
        sort_by_key(&mut assets, options.assets_sort.as_deref());

        let mut chunks = self.chunks.clone();
        sort_by_key(&mut chunks, options.chunks_sort.as_deref());

        let mut modules: Vec<ModuleStat> = self
            .modules
            .iter()
            .filter(|m| exclude.as_ref().is_none_or(|re| !re.is_match(&m.name)))
            .cloned()
            .collect();
        sort_by_key(&mut modules, options.modules_sort.as_deref());

        StatsView {
            assets,
            chunks,
            modules,
        }
    }
}

struct StatsView {
    assets: Vec<AssetStat>,
    chunks: Vec<ChunkStat>,
    modules: Vec<ModuleStat>,
}

fn format_message(msg: &StatsMessage) -> String {
    match msg.file {
        Some(ref file) => format!("in {}\n{}", file, msg.message),
        None => msg.message.clone(),
    }
}

/// A parsed sort key such as `size` or `!name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl SortKey {
    pub fn parse(key: &str) -> Option<SortKey> {
        let key = key.trim();
        let (field, descending) = match key.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (key, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(SortKey {
            field: field.to_string(),
            descending,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Number(u64),
    Text(String),
}

trait Sortable {
    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

impl Sortable for AssetStat {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "name" => Some(SortValue::Text(self.name.clone())),
            "size" => Some(SortValue::Number(self.size)),
            _ => None,
        }
    }
}

impl Sortable for ChunkStat {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "id" => Some(SortValue::Number(self.id as u64)),
            "name" => Some(SortValue::Text(self.names.join(","))),
            "size" => Some(SortValue::Number(self.size)),
            _ => None,
        }
    }
}

impl Sortable for ModuleStat {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "id" => Some(SortValue::Number(self.id as u64)),
            "name" => Some(SortValue::Text(self.name.clone())),
            "size" => Some(SortValue::Number(self.size)),
            _ => None,
        }
    }
}

fn sort_by_key<T: Sortable>(items: &mut [T], key: Option<&str>) {
    let Some(key) = key.and_then(SortKey::parse) else {
        return;
    };

    items.sort_by(|a, b| {
        let ordering = match (a.sort_value(&key.field), b.sort_value(&key.field)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        };
        if key.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

fn paint_bold(s: &str, colors: bool) -> String {
    if colors {
        s.bold().to_string()
    } else {
        s.to_string()
    }
}

fn paint_green(s: &str, colors: bool) -> String {
    if colors {
        s.green().to_string()
    } else {
        s.to_string()
    }
}

fn paint_yellow(s: &str, colors: bool) -> String {
    if colors {
        s.yellow().to_string()
    } else {
        s.to_string()
    }
}

fn paint_red(s: &str, colors: bool) -> String {
    if colors {
        s.red().to_string()
    } else {
        s.to_string()
    }
}
