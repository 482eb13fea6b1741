//! The compiler seam.
//!
//! The worker never compiles anything itself. It asks a [`Compiler`] for an
//! instance bound to one configuration and then either runs it once or
//! watches. Watch mode delivers one outcome per compilation over a channel
//! until the [`Watcher`] is closed.

pub mod process;

use crate::config::{BuildConfig, WatchOptions};
use crate::error::CompileError;
use crate::stats::Stats;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use process::ProcessCompiler;

/// Result of one compilation: statistics, or a fatal compiler error.
///
/// Compilation errors in the sources are not fatal; they are reported in
/// [`Stats::errors`].
pub type CompileOutcome = Result<Stats, CompileError>;

/// Creates compiler instances for configurations.
pub trait Compiler: Send + Sync {
    fn compile(&self, config: &BuildConfig) -> Result<Box<dyn CompilerInstance>, CompileError>;

    /// Whether builds of `config` always run in watch mode.
    fn native_watch(&self, _config: &BuildConfig) -> bool {
        false
    }
}

/// A compiler bound to one configuration.
#[async_trait]
pub trait CompilerInstance: Send {
    /// Compile once.
    async fn run(&mut self) -> CompileOutcome;

    /// Start compiling continuously.
    fn watch(&mut self, options: &WatchOptions) -> Result<WatchSession, CompileError>;
}

/// An active watch: compilation outcomes plus the handle that stops them.
pub struct WatchSession {
    pub outcomes: mpsc::Receiver<CompileOutcome>,
    pub watcher: Box<dyn Watcher>,
}

/// Handle to an active watch.
#[async_trait]
pub trait Watcher: Send {
    /// Stop watching. Resolves once no further compilations will start.
    async fn close(&mut self) -> Result<(), CompileError>;
}
