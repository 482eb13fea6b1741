//! File system watcher for watch-mode rebuilds.
//!
//! Watches a build's context directory and forwards relevant changes,
//! skipping ignored patterns, hidden paths and anything outside the root.

use crate::error::CompileError;
use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Recursive watcher over one root directory.
///
/// Changes are delivered through the receiver returned by [`FileWatcher::new`].
/// Dropping the watcher stops event delivery.
pub struct FileWatcher {
    _watcher: Box<dyn Watcher + Send>,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// `ignored` holds directory names or paths relative to the root
    /// (`node_modules`, `dist`) and extension patterns (`*.log`). With
    /// `poll` set, the filesystem is polled at that interval instead of
    /// using native events.
    pub fn new(
        root: &Path,
        ignored: Vec<String>,
        poll: Option<Duration>,
    ) -> Result<(Self, mpsc::Receiver<FileChange>), CompileError> {
        if !root.exists() {
            return Err(CompileError::WatchRootNotFound(root.to_path_buf()));
        }
        let root = root
            .canonicalize()
            .map_err(|e| CompileError::Custom(format!("{}: {}", root.display(), e)))?;

        let (tx, rx) = mpsc::channel(256);
        let filter_root = root.clone();

        let handler = move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!("file watcher error: {}", e);
                    return;
                }
            };

            for path in &event.paths {
                if should_ignore(path, &filter_root, &ignored) {
                    continue;
                }

                let change = match event.kind {
                    notify::EventKind::Create(_) => FileChange::Created(path.clone()),
                    notify::EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    notify::EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };

                // A full channel already has a rebuild pending
                let _ = tx.try_send(change);
            }
        };

        let mut watcher: Box<dyn Watcher + Send> = match poll {
            Some(interval) => Box::new(PollWatcher::new(
                handler,
                Config::default().with_poll_interval(interval),
            )?),
            None => Box::new(RecommendedWatcher::new(handler, Config::default())?),
        };
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Check if a changed path should be ignored.
fn should_ignore(path: &Path, root: &Path, ignored: &[String]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    let rel_str = rel_path.to_string_lossy();
    for pattern in ignored {
        if let Some(ext) = pattern.strip_prefix('*') {
            if rel_str.ends_with(ext) {
                return true;
            }
            continue;
        }

        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }
        if rel_path.starts_with(pattern)
            || rel_path
                .components()
                .any(|c| matches!(c, Component::Normal(name) if name == pattern))
        {
            return true;
        }
    }

    rel_path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
