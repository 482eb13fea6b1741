//! Error handling for the build worker.
//!
//! The worker reports every terminal outcome through a single `Result`. The
//! error side follows the taxonomy a coordinator needs to tell apart:
//!
//! - **Configuration errors** (`ConfigError`): the artifact could not be
//!   loaded, or its shape does not match what the coordinator expects. These
//!   are raised before the compiler is ever touched.
//! - **Fatal compiler errors** (`CompileError`): the compiler itself failed,
//!   unrelated to the correctness of the compiled sources.
//! - **Compilation errors** (`BuildFailure`): the sources did not compile.
//! - **Forced shutdown**: the worker was interrupted. Not a failure, but a
//!   terminal event with its own message.
//!
//! # Example
//!
//! ```rust
//! use fob_worker::error::{ConfigError, WorkerError};
//!
//! let err: WorkerError = ConfigError::CountMismatch { expected: 3, actual: 2 }.into();
//! assert!(!err.is_forced_shutdown());
//! assert!(err.to_string().contains("Expected 3 configuration(s) but found 2"));
//! ```

mod miette;

pub use self::miette::worker_error_to_miette;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level worker error type.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Configuration loading, validation or selection failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The compiler failed for reasons unrelated to the sources
    #[error("Compiler error: {0}")]
    Compile(#[from] CompileError),

    /// The sources produced compilation errors
    #[error("{}", .0.message)]
    Compilation(BuildFailure),

    /// The worker was interrupted and shut down
    #[error("Forcefully shut down {name}")]
    ForcedShutdown {
        /// Display name of the configuration that was running
        name: String,
    },
}

impl WorkerError {
    /// Whether this error is the forced-shutdown terminal event.
    pub fn is_forced_shutdown(&self) -> bool {
        matches!(self, WorkerError::ForcedShutdown { .. })
    }

    /// Serialized statistics attached to the failure, if any.
    pub fn stats(&self) -> Option<&serde_json::Value> {
        match self {
            WorkerError::Compilation(failure) => failure.stats.as_ref(),
            _ => None,
        }
    }
}

/// A build that finished with compilation errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildFailure {
    /// Composite message naming the build and listing every error
    pub message: String,

    /// Serialized statistics of the failing build, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file doesn't exist at the given location
    #[error("Config file not found: {}\n\nHint: Pass the path of a .json, .toml or executable configuration", .0.display())]
    NotFound(PathBuf),

    /// The file extension is not a known configuration format
    #[error("Unsupported configuration format: {}\n\nHint: Use .json, .toml, or an executable script that prints JSON", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Config file has invalid JSON syntax or shape
    #[error("Invalid JSON configuration: {0}\n\nHint: Use a JSON validator to check syntax")]
    InvalidJson(#[from] serde_json::Error),

    /// Config file has invalid TOML syntax or shape
    #[error("Invalid TOML configuration: {0}\n\nHint: Multiple configurations go under [[configs]]")]
    InvalidToml(#[from] toml::de::Error),

    /// A configuration script exited unsuccessfully
    #[error("Configuration script {} failed: {stderr}", .path.display())]
    ScriptFailed {
        /// The script that was executed
        path: PathBuf,
        /// Captured standard error of the script
        stderr: String,
    },

    /// The artifact holds a different number of configurations than expected
    #[error("Expected {expected} configuration(s) but found {actual}\n\nHint: The coordinator and the configuration file disagree; restart the build")]
    CountMismatch {
        /// Count the coordinator expects
        expected: usize,
        /// Count the artifact actually holds
        actual: usize,
    },

    /// Requested configuration index is outside the collection
    #[error("Configuration index {index} is out of range for {len} configuration(s)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Collection length
        len: usize,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// I/O error while reading config
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal compiler errors.
#[derive(Debug, Error)]
pub enum CompileError {
    /// No build command was configured
    #[error("No build command configured for {name}\n\nHint: Set 'command' in the configuration, e.g. [\"fob\", \"build\"]")]
    NoCommand {
        /// Display name of the configuration
        name: String,
    },

    /// The build command could not be started
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        /// Program that failed to start
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Filesystem watching failed
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Watch root does not exist
    #[error("Watch root not found: {}", .0.display())]
    WatchRootNotFound(PathBuf),

    /// The watcher stopped delivering results without being closed
    #[error("Watcher stopped unexpectedly")]
    WatcherStopped,

    /// Generic compiler error
    #[error("{0}")]
    Custom(String),
}

/// Result type alias using `WorkerError` as the default error type.
pub type Result<T, E = WorkerError> = std::result::Result<T, E>;
