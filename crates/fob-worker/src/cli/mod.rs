//! Command-line interface of the `fob-worker` binary.
//!
//! A coordinator spawns one worker per configuration:
//!
//! ```text
//! fob-worker fob.config.json --index 1 --count 3 --watch -- --env production
//! ```
//!
//! Everything after `--` is handed to executable configuration scripts.

mod validation;

use crate::options::{BuildOptions, WatchFatalPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use validation::{parse_count, parse_exclude, parse_sort_key};

/// Fob build worker - runs one configuration of a parallel build
#[derive(Parser, Debug)]
#[command(
    name = "fob-worker",
    version,
    about = "Runs one build configuration for a parallel build coordinator",
    long_about = "Loads a configuration artifact, checks that it holds --count configurations,\n\
                  and builds the one at --index once or in watch mode. Status goes to stderr;\n\
                  coordinator messages are written to stdout as JSON lines."
)]
pub struct Cli {
    /// Configuration artifact (.json, .toml, or an executable printing JSON)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Position of this worker's configuration in the artifact
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Number of configurations the coordinator expects
    #[arg(long, default_value_t = 1, value_parser = parse_count)]
    pub count: usize,

    /// Rebuild continuously when files change
    #[arg(short, long)]
    pub watch: bool,

    /// Machine-readable mode: suppress status lines
    #[arg(long)]
    pub json: bool,

    /// Emit full build statistics
    #[arg(long)]
    pub stats: bool,

    /// Force colored status output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Sort key for modules in statistics (`!` prefix sorts descending)
    #[arg(long, value_name = "KEY", value_parser = parse_sort_key)]
    pub modules_sort: Option<String>,

    /// Sort key for chunks in statistics
    #[arg(long, value_name = "KEY", value_parser = parse_sort_key)]
    pub chunks_sort: Option<String>,

    /// Sort key for assets in statistics
    #[arg(long, value_name = "KEY", value_parser = parse_sort_key)]
    pub assets_sort: Option<String>,

    /// Hide modules matching this pattern from statistics
    #[arg(long, value_name = "REGEX", value_parser = parse_exclude)]
    pub exclude: Option<String>,

    /// What to do when the compiler fails fatally while watching
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_watch_fatal: Option<FatalPolicyArg>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Arguments passed to executable configuration scripts
    #[arg(last = true, value_name = "ARGV")]
    pub argv: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FatalPolicyArg {
    Stop,
    Continue,
}

impl From<FatalPolicyArg> for WatchFatalPolicy {
    fn from(arg: FatalPolicyArg) -> Self {
        match arg {
            FatalPolicyArg::Stop => WatchFatalPolicy::Stop,
            FatalPolicyArg::Continue => WatchFatalPolicy::Continue,
        }
    }
}

impl Cli {
    /// Options given on the command line.
    ///
    /// Unset flags stay unset so `FOB_WORKER_*` variables can supply them in
    /// [`BuildOptions::load`].
    pub fn to_options(&self) -> BuildOptions {
        let colors = if self.color {
            Some(true)
        } else if self.no_color {
            Some(false)
        } else {
            None
        };

        BuildOptions {
            watch: self.watch,
            json: self.json,
            stats: self.stats,
            colors,
            argv: (!self.argv.is_empty()).then(|| self.argv.clone()),
            modules_sort: self.modules_sort.clone(),
            chunks_sort: self.chunks_sort.clone(),
            assets_sort: self.assets_sort.clone(),
            exclude: self.exclude.clone(),
            on_watch_fatal: self.on_watch_fatal.map(Into::into).unwrap_or_default(),
        }
    }
}
