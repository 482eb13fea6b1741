//! The build worker.
//!
//! One worker drives one configuration of a (possibly multi-configuration)
//! build. It loads the configuration artifact, checks that it holds as many
//! configurations as the coordinator expects, picks its own, and hands it to
//! the compiler in one-shot or watch mode.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Loading -> Count mismatch -> Failed
//!                 -> Compiling -> Fatal error            -> Failed
//!                              -> Compile errors, once   -> Failed
//!                              -> Compile errors, watch  -> Compiling
//!                              -> Success, once          -> Done
//!                              -> Success, watch (first) -> Ready -> Compiling
//!                              -> Success, watch         -> Compiling
//! Compiling | Ready --cancel--> Forced shutdown
//! ```
//!
//! Every terminal state is the single return value of [`BuildWorker::run`].
//! Cancellation preempts a pending compile result, and an active watcher is
//! always closed before the forced shutdown is returned. Fatal errors
//! survived in watch mode go to the coordinator through
//! [`Notifier::notify_error`].

use crate::compiler::{Compiler, WatchSession};
use crate::config::{BuildConfig, ConfigLoader, LoadContext};
use crate::error::{BuildFailure, CompileError, WorkerError};
use crate::ipc::Notifier;
use crate::options::{BuildOptions, WatchFatalPolicy};
use crate::stats::{Stats, StatsOptions};
use crate::ui::{self, format_secs, Reporter};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Successful result of a one-shot build.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutput {
    /// Statistics were not requested
    Empty,
    /// Serialized statistics
    Stats(Value),
}

impl BuildOutput {
    pub fn stats(&self) -> Option<&Value> {
        match self {
            BuildOutput::Empty => None,
            BuildOutput::Stats(value) => Some(value),
        }
    }
}

/// Runs builds with a configuration loader, a compiler and a coordinator
/// notifier.
pub struct BuildWorker {
    loader: Arc<dyn ConfigLoader>,
    compiler: Arc<dyn Compiler>,
    notifier: Arc<dyn Notifier>,
    reporter: Option<Reporter>,
}

impl BuildWorker {
    pub fn new(
        loader: Arc<dyn ConfigLoader>,
        compiler: Arc<dyn Compiler>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            loader,
            compiler,
            notifier,
            reporter: None,
        }
    }

    /// Use `reporter` for status output instead of stderr.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build the configuration at `index` of the artifact at `config_path`.
    ///
    /// One-shot builds return when the compile finishes. Watch builds only
    /// return on a fatal error (depending on [`WatchFatalPolicy`]) or when
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// - `WorkerError::Config` when the artifact cannot be loaded or does not
    ///   hold exactly `expected_count` configurations. The compiler is not
    ///   invoked in that case.
    /// - `WorkerError::Compile` for fatal compiler errors.
    /// - `WorkerError::Compilation` when a one-shot build has errors.
    /// - `WorkerError::ForcedShutdown` when `cancel` fires first.
    #[tracing::instrument(name = "BuildWorker::run", skip(self, options, cancel), fields(config = %config_path.display()))]
    pub async fn run(
        &self,
        config_path: &Path,
        options: &BuildOptions,
        index: usize,
        expected_count: usize,
        cancel: CancellationToken,
    ) -> Result<BuildOutput, WorkerError> {
        let reporter = self.reporter_for(options);
        let ctx = LoadContext {
            argv: options.argv.clone(),
        };

        let config = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(WorkerError::ForcedShutdown {
                    name: config_path.display().to_string(),
                });
            }
            config = self.load_config(config_path, &ctx, index, expected_count) => config?,
        };

        let build = Build {
            name: config.display_name(),
            output_options: config.stats.merged_with(options),
            options,
            reporter,
            index,
        };
        build.output_options.exclude_regex()?;

        let watch = options.watch || config.watch || self.compiler.native_watch(&config);
        if !options.is_silent() {
            build
                .reporter
                .info(&format!("Started {} {}", build.verb(watch), build.name));
        }

        let mut instance = self
            .compiler
            .compile(&config)
            .map_err(|e| build.fatal(e))?;

        if !watch {
            tracing::debug!(name = %build.name, "compiling once");
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(build.forced_shutdown()),
                outcome = instance.run() => outcome,
            };
            return match outcome {
                Err(e) => Err(build.fatal(e)),
                Ok(stats) if stats.has_errors() => Err(WorkerError::Compilation(build.failure(&stats))),
                Ok(stats) => {
                    build.report_success(&stats, false);
                    Ok(build.output(&stats))
                }
            };
        }

        tracing::debug!(name = %build.name, "watching");
        let session = instance
            .watch(&config.watch_options)
            .map_err(|e| build.fatal(e))?;
        self.watch(&build, session, cancel).await
    }

    /// Run a build and hand its result to `on_done`.
    pub async fn run_build<F>(
        &self,
        config_path: &Path,
        options: &BuildOptions,
        index: usize,
        expected_count: usize,
        cancel: CancellationToken,
        on_done: F,
    ) where
        F: FnOnce(Result<BuildOutput, WorkerError>),
    {
        on_done(
            self.run(config_path, options, index, expected_count, cancel)
                .await,
        );
    }

    async fn load_config(
        &self,
        path: &Path,
        ctx: &LoadContext,
        index: usize,
        expected_count: usize,
    ) -> Result<BuildConfig, WorkerError> {
        tracing::debug!("loading configuration");
        let artifact = self.loader.load(path, ctx).await?;
        let config = artifact.select(index, expected_count)?;
        config.validate()?;
        Ok(config)
    }

    async fn watch(
        &self,
        build: &Build<'_>,
        mut session: WatchSession,
        cancel: CancellationToken,
    ) -> Result<BuildOutput, WorkerError> {
        let mut notified = false;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    close_watcher(&mut session).await;
                    return Err(build.forced_shutdown());
                }
                outcome = session.outcomes.recv() => outcome,
            };

            match outcome {
                None => {
                    close_watcher(&mut session).await;
                    return Err(build.fatal(CompileError::WatcherStopped));
                }
                Some(Err(e)) => {
                    let message = e.to_string();
                    let err = build.fatal(e);
                    match build.options.on_watch_fatal {
                        WatchFatalPolicy::Stop => {
                            close_watcher(&mut session).await;
                            return Err(err);
                        }
                        WatchFatalPolicy::Continue => {
                            tracing::debug!("fatal error while watching, waiting for next build");
                            self.notifier.notify_error(build.index, &message);
                        }
                    }
                }
                Some(Ok(stats)) if stats.has_errors() => {
                    build.reporter.error(&build.failure_message(&stats));
                }
                Some(Ok(stats)) => {
                    build.report_success(&stats, true);
                    if !notified {
                        notified = true;
                        self.notifier.notify_ready(build.index);
                    }
                }
            }
        }
    }

    fn reporter_for(&self, options: &BuildOptions) -> Reporter {
        match self.reporter {
            Some(ref reporter) => reporter.clone(),
            None => Reporter::stderr(options.colors.unwrap_or_else(ui::should_use_color)),
        }
    }
}

async fn close_watcher(session: &mut WatchSession) {
    if let Err(e) = session.watcher.close().await {
        tracing::warn!("failed to close watcher: {}", e);
    }
}

/// Per-run values shared by the one-shot and watch paths.
struct Build<'a> {
    name: String,
    output_options: StatsOptions,
    options: &'a BuildOptions,
    reporter: Reporter,
    index: usize,
}

impl Build<'_> {
    fn verb(&self, watch: bool) -> &'static str {
        if watch {
            "watching"
        } else {
            "building"
        }
    }

    fn fatal(&self, err: CompileError) -> WorkerError {
        self.reporter.error(&err.to_string());
        WorkerError::Compile(err)
    }

    fn forced_shutdown(&self) -> WorkerError {
        let err = WorkerError::ForcedShutdown {
            name: self.name.clone(),
        };
        if !self.options.is_silent() {
            self.reporter.warning(&err.to_string());
        }
        err
    }

    fn failure_message(&self, stats: &Stats) -> String {
        let messages: Vec<&str> = stats.errors.iter().map(|e| e.message.as_str()).collect();
        format!("Errors building {}\n{}", self.name, messages.join("\n"))
    }

    fn failure(&self, stats: &Stats) -> BuildFailure {
        BuildFailure {
            message: self.failure_message(stats),
            stats: self.options.stats.then(|| stats.to_json(&self.output_options)),
        }
    }

    fn output(&self, stats: &Stats) -> BuildOutput {
        if self.options.stats {
            BuildOutput::Stats(stats.to_json(&self.output_options))
        } else {
            BuildOutput::Empty
        }
    }

    fn report_success(&self, stats: &Stats, watch: bool) {
        if self.options.is_silent() {
            return;
        }
        if self.options.stats {
            self.reporter.plain(&stats.to_string(&self.output_options));
        }
        self.reporter.success(&format!(
            "Finished {} {} in {} seconds",
            self.verb(watch),
            self.name,
            format_secs(stats.elapsed_ms())
        ));
    }
}
