//! Fob build worker.
//!
//! A parallel build coordinator splits a multi-configuration build across
//! processes. Each process runs one [`worker::BuildWorker`], which:
//!
//! - loads the configuration artifact and checks that it still holds the
//!   number of configurations the coordinator planned for
//! - builds its own configuration once, or watches and rebuilds on changes
//! - tells the coordinator when its first watch build is ready
//! - finishes exactly once, with statistics, an error, or a forced shutdown
//!
//! # Modules
//!
//! - [`config`] - configuration artifacts, loading and selection
//! - [`compiler`] - the compiler seam and the process-backed compiler
//! - [`worker`] - the build lifecycle
//! - [`ipc`] - messages to the coordinator
//! - [`stats`] - build statistics and their rendering
//! - [`options`], [`cli`] - worker options and the binary's arguments
//! - [`error`], [`logger`], [`ui`] - errors, logging and status output
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_worker::compiler::ProcessCompiler;
//! use fob_worker::config::FileConfigLoader;
//! use fob_worker::ipc::StdoutNotifier;
//! use fob_worker::options::BuildOptions;
//! use fob_worker::worker::BuildWorker;
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> fob_worker::Result<()> {
//! let worker = BuildWorker::new(
//!     Arc::new(FileConfigLoader::new()),
//!     Arc::new(ProcessCompiler::new()),
//!     Arc::new(StdoutNotifier),
//! );
//! let options = BuildOptions::default();
//! let output = worker
//!     .run(Path::new("fob.config.json"), &options, 0, 1, CancellationToken::new())
//!     .await?;
//! println!("{:?}", output.stats());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ipc;
pub mod logger;
pub mod options;
pub mod stats;
pub mod ui;
pub mod watcher;
pub mod worker;

pub use error::{CompileError, ConfigError, Result, WorkerError};
pub use options::{BuildOptions, WatchFatalPolicy};
pub use worker::{BuildOutput, BuildWorker};
