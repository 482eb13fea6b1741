//! Messages from a worker to its coordinator.
//!
//! The `fob-worker` binary writes one JSON object per line on stdout. A
//! coordinator reads `ready` once per watching worker and `done` once per
//! worker. `error` reports a fatal compiler error that a watching worker
//! survived.

use crate::error::WorkerError;
use crate::worker::BuildOutput;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

/// A message on the coordinator channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// The configuration at `index` finished its first watch-mode build
    Ready { index: usize },

    /// A fatal compiler error while watching; the worker keeps running
    Error { index: usize, message: String },

    /// The worker reached a terminal state
    Done {
        index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorReport>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
    },
}

/// Error payload of a `done` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
    /// Set when the worker was interrupted rather than failing
    #[serde(default)]
    pub forced_shutdown: bool,
}

impl WorkerMessage {
    /// The `done` message for a worker's final result.
    pub fn done(index: usize, result: &Result<BuildOutput, WorkerError>) -> Self {
        match result {
            Ok(output) => WorkerMessage::Done {
                index,
                error: None,
                result: output.stats().cloned(),
            },
            Err(err) => WorkerMessage::Done {
                index,
                error: Some(ErrorReport {
                    message: err.to_string(),
                    stats: err.stats().cloned(),
                    forced_shutdown: err.is_forced_shutdown(),
                }),
                result: None,
            },
        }
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Sends progress of a running build to the coordinator.
pub trait Notifier: Send + Sync {
    /// The configuration is built and being watched.
    fn notify_ready(&self, index: usize);

    /// A fatal compiler error occurred, but watching goes on.
    fn notify_error(&self, index: usize, message: &str);
}

/// Writes coordinator messages to stdout as JSON lines.
#[derive(Debug, Clone, Default)]
pub struct StdoutNotifier;

impl StdoutNotifier {
    pub fn send(&self, message: &WorkerMessage) {
        match message.to_line() {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", line);
                let _ = stdout.flush();
            }
            Err(e) => tracing::error!("failed to encode coordinator message: {}", e),
        }
    }
}

impl Notifier for StdoutNotifier {
    fn notify_ready(&self, index: usize) {
        self.send(&WorkerMessage::Ready { index });
    }

    fn notify_error(&self, index: usize, message: &str) {
        self.send(&WorkerMessage::Error {
            index,
            message: message.to_string(),
        });
    }
}

/// Records notifications in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    ready: Arc<Mutex<Vec<usize>>>,
    errors: Arc<Mutex<Vec<(usize, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices notified so far, in order.
    pub fn ready(&self) -> Vec<usize> {
        self.ready.lock().clone()
    }

    /// Errors reported so far, in order.
    pub fn errors(&self) -> Vec<(usize, String)> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_ready(&self, index: usize) {
        self.ready.lock().push(index);
    }

    fn notify_error(&self, index: usize, message: &str) {
        self.errors.lock().push((index, message.to_string()));
    }
}
