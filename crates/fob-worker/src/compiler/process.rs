//! A compiler that runs an external build command.
//!
//! The configuration's `command` (for example `["fob", "build"]`) is run in
//! the configuration's context directory. A non-zero exit becomes
//! compilation errors taken from the command's stderr; failing to start the
//! command at all is fatal. Entry points are reported as modules and files
//! under `output.path` as assets.

use crate::compiler::{CompileOutcome, Compiler, CompilerInstance, WatchSession, Watcher};
use crate::config::{BuildConfig, WatchOptions, NAME_PLACEHOLDER};
use crate::error::CompileError;
use crate::stats::{AssetStat, ChunkStat, ModuleStat, Stats, StatsMessage};
use crate::ui::format_duration;
use crate::watcher::FileWatcher;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Runs the configured build command.
#[derive(Debug, Clone, Default)]
pub struct ProcessCompiler;

impl ProcessCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for ProcessCompiler {
    fn compile(&self, config: &BuildConfig) -> Result<Box<dyn CompilerInstance>, CompileError> {
        let Some((program, args)) = config.command.split_first() else {
            return Err(CompileError::NoCommand {
                name: config.display_name(),
            });
        };

        let job = BuildJob {
            program: program.clone(),
            args: args.to_vec(),
            cwd: config.context_dir(),
            entries: config
                .entry
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string()))
                .collect(),
            filename: config.output.filename.clone(),
            output_dir: config.output.path.clone(),
        };

        Ok(Box::new(ProcessInstance { job: Arc::new(job) }))
    }
}

struct ProcessInstance {
    job: Arc<BuildJob>,
}

#[async_trait]
impl CompilerInstance for ProcessInstance {
    async fn run(&mut self) -> CompileOutcome {
        self.job.execute().await
    }

    fn watch(&mut self, options: &WatchOptions) -> Result<WatchSession, CompileError> {
        let mut ignored = options.ignored.clone();
        if let Some(out_dir) = self.job.relative_output_dir() {
            ignored.push(out_dir);
        }

        let (file_watcher, changes) = FileWatcher::new(
            &self.job.cwd,
            ignored,
            options.poll.map(Duration::from_millis),
        )?;
        tracing::debug!(root = %file_watcher.root().display(), "watching for changes");

        let (tx, rx) = mpsc::channel(16);
        let stop = CancellationToken::new();
        let task = tokio::spawn(watch_loop(
            self.job.clone(),
            changes,
            tx,
            stop.clone(),
            Duration::from_millis(options.aggregate_timeout),
        ));

        Ok(WatchSession {
            outcomes: rx,
            watcher: Box::new(ProcessWatcher {
                stop,
                task: Some(task),
                file_watcher: Some(file_watcher),
            }),
        })
    }
}

/// Build once, then once more after every burst of changes.
async fn watch_loop(
    job: Arc<BuildJob>,
    mut changes: mpsc::Receiver<crate::watcher::FileChange>,
    outcomes: mpsc::Sender<CompileOutcome>,
    stop: CancellationToken,
    aggregate_timeout: Duration,
) {
    loop {
        let outcome = tokio::select! {
            biased;
            _ = stop.cancelled() => return,
            outcome = job.execute() => outcome,
        };
        if outcomes.send(outcome).await.is_err() {
            return;
        }

        let first = tokio::select! {
            biased;
            _ = stop.cancelled() => return,
            change = changes.recv() => change,
        };
        let Some(first) = first else {
            return;
        };
        tracing::debug!(path = %first.path().display(), "change detected");

        // Collapse the burst that follows the first change
        let deadline = tokio::time::sleep(aggregate_timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => return,
                _ = &mut deadline => break,
                change = changes.recv() => {
                    if change.is_none() {
                        break;
                    }
                }
            }
        }
    }
}

struct ProcessWatcher {
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
    file_watcher: Option<FileWatcher>,
}

#[async_trait]
impl Watcher for ProcessWatcher {
    async fn close(&mut self) -> Result<(), CompileError> {
        self.stop.cancel();
        self.file_watcher.take();

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| CompileError::Custom(format!("watch task failed: {}", e)))?;
        }
        Ok(())
    }
}

impl Drop for ProcessWatcher {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[derive(Debug)]
struct BuildJob {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
    entries: Vec<(String, String)>,
    filename: String,
    output_dir: Option<PathBuf>,
}

impl BuildJob {
    async fn execute(&self) -> CompileOutcome {
        let start_time = epoch_millis();
        let started = Instant::now();

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CompileError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        let elapsed = started.elapsed();
        tracing::debug!(
            command = %self.program,
            status = %output.status,
            "build command finished in {}",
            format_duration(elapsed)
        );

        let errors = if output.status.success() {
            vec![]
        } else {
            error_messages(&output.stderr, output.status)
        };

        let assets = match self.output_dir() {
            Some(dir) => tokio::task::spawn_blocking(move || collect_assets(&dir))
                .await
                .unwrap_or_default(),
            None => vec![],
        };

        Ok(Stats {
            start_time,
            end_time: start_time + elapsed.as_millis() as u64,
            errors,
            warnings: vec![],
            chunks: self.chunks(&assets),
            modules: self.modules().await,
            assets,
        })
    }

    fn output_dir(&self) -> Option<PathBuf> {
        self.output_dir.as_ref().map(|dir| self.cwd.join(dir))
    }

    /// Output directory relative to the context, for the watcher to skip.
    fn relative_output_dir(&self) -> Option<String> {
        let dir = self.output_dir.as_ref()?;
        let rel = if dir.is_absolute() {
            let root = self.cwd.canonicalize().ok()?;
            dir.strip_prefix(&root).ok()?.to_path_buf()
        } else {
            dir.clone()
        };
        let rel = rel.to_string_lossy().trim_start_matches("./").to_string();
        (!rel.is_empty() && rel != ".").then_some(rel)
    }

    async fn modules(&self) -> Vec<ModuleStat> {
        let mut modules = Vec::with_capacity(self.entries.len());
        for (id, (_, source)) in self.entries.iter().enumerate() {
            let size = tokio::fs::metadata(self.cwd.join(source))
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            modules.push(ModuleStat {
                id,
                name: source.clone(),
                size,
            });
        }
        modules
    }

    /// One chunk per entry point, holding the asset its filename maps to.
    fn chunks(&self, assets: &[AssetStat]) -> Vec<ChunkStat> {
        self.entries
            .iter()
            .enumerate()
            .map(|(id, (name, _))| {
                let file = self.filename.replace(NAME_PLACEHOLDER, name);
                let asset = assets.iter().find(|a| a.name == file);
                ChunkStat {
                    id,
                    names: vec![name.clone()],
                    size: asset.map(|a| a.size).unwrap_or(0),
                    files: asset.map(|a| vec![a.name.clone()]).unwrap_or_default(),
                }
            })
            .collect()
    }
}

fn collect_assets(dir: &Path) -> Vec<AssetStat> {
    walkdir::WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let size = entry.metadata().ok()?.len();
            let name = entry
                .path()
                .strip_prefix(dir)
                .ok()?
                .to_string_lossy()
                .replace('\\', "/");
            Some(AssetStat { name, size })
        })
        .collect()
}

fn error_messages(stderr: &[u8], status: ExitStatus) -> Vec<StatsMessage> {
    let messages: Vec<StatsMessage> = String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(StatsMessage::new)
        .collect();

    if !messages.is_empty() {
        return messages;
    }

    let message = match status.code() {
        Some(code) => format!("command exited with status {}", code),
        None => "command was terminated by a signal".to_string(),
    };
    vec![StatsMessage::new(message)]
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{EntryPoints, OutputConfig};
    use tempfile::TempDir;

    fn config_in(dir: &Path, command: &[&str]) -> BuildConfig {
        BuildConfig {
            entry: EntryPoints::from_iter([("main", "src/index.js")]),
            output: OutputConfig {
                filename: "[name].js".to_string(),
                path: Some(PathBuf::from("dist")),
            },
            context: Some(dir.to_path_buf()),
            command: command.iter().map(|s| s.to_string()).collect(),
            ..BuildConfig::default()
        }
    }

    #[test]
    fn test_empty_command_is_fatal() {
        let config = BuildConfig {
            name: Some("app".to_string()),
            ..BuildConfig::default()
        };
        let err = ProcessCompiler::new().compile(&config).err().unwrap();
        assert!(matches!(err, CompileError::NoCommand { ref name } if name == "app"));
    }

    #[tokio::test]
    async fn test_successful_command_reports_assets() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::write(temp.path().join("src/index.js"), "export const a = 1;").unwrap();

        let config = config_in(
            temp.path(),
            &["sh", "-c", "mkdir -p dist && printf 'bundle' > dist/main.js"],
        );
        let mut instance = ProcessCompiler::new().compile(&config).unwrap();
        let stats = instance.run().await.unwrap();

        assert!(!stats.has_errors());
        assert!(stats.end_time >= stats.start_time);
        assert_eq!(
            stats.assets,
            vec![AssetStat {
                name: "main.js".to_string(),
                size: 6
            }]
        );
        assert_eq!(stats.modules[0].name, "src/index.js");
        assert_eq!(stats.modules[0].size, 19);
        assert_eq!(stats.chunks[0].files, vec!["main.js".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_command_reports_stderr_lines() {
        let temp = TempDir::new().unwrap();
        let config = config_in(
            temp.path(),
            &["sh", "-c", "echo 'first problem' >&2; echo '' >&2; echo 'second problem' >&2; exit 2"],
        );
        let stats = ProcessCompiler::new()
            .compile(&config)
            .unwrap()
            .run()
            .await
            .unwrap();

        let messages: Vec<_> = stats.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first problem", "second problem"]);
    }

    #[tokio::test]
    async fn test_failing_command_without_stderr() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path(), &["sh", "-c", "exit 3"]);
        let stats = ProcessCompiler::new()
            .compile(&config)
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(stats.errors[0].message, "command exited with status 3");
    }

    #[tokio::test]
    async fn test_missing_program_is_fatal() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path(), &["fob-worker-test-no-such-program"]);
        let err = ProcessCompiler::new()
            .compile(&config)
            .unwrap()
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_watch_runs_initial_build_and_closes() {
        let temp = TempDir::new().unwrap();
        let config = config_in(temp.path(), &["true"]);
        let mut instance = ProcessCompiler::new().compile(&config).unwrap();
        let mut session = instance
            .watch(&WatchOptions {
                aggregate_timeout: 20,
                ignored: vec![],
                poll: Some(50),
            })
            .unwrap();

        let first = tokio::time::timeout(Duration::from_secs(5), session.outcomes.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!first.has_errors());

        session.watcher.close().await.unwrap();
        // The loop has exited, so the channel drains to None
        assert!(session.outcomes.recv().await.is_none());
    }

    #[test]
    fn test_relative_output_dir() {
        let job = BuildJob {
            program: "true".to_string(),
            args: vec![],
            cwd: PathBuf::from("/project"),
            entries: vec![],
            filename: "[name].js".to_string(),
            output_dir: Some(PathBuf::from("./dist")),
        };
        assert_eq!(job.relative_output_dir().as_deref(), Some("dist"));
    }
}
