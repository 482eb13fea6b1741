//! Fob build worker binary.
//!
//! Parses arguments, layers options, runs one build and reports the result
//! to the coordinator as a `done` line on stdout.

use clap::Parser;
use fob_worker::compiler::ProcessCompiler;
use fob_worker::config::FileConfigLoader;
use fob_worker::error::{worker_error_to_miette, WorkerError};
use fob_worker::ipc::{StdoutNotifier, WorkerMessage};
use fob_worker::options::BuildOptions;
use fob_worker::worker::{BuildOutput, BuildWorker};
use fob_worker::{cli, logger, ui};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Cli::parse();
    let colors = args.color || (!args.no_color && ui::should_use_color());
    logger::init_logger(args.verbose, args.quiet, !colors);

    let notifier = StdoutNotifier;
    let result = run(&args, Arc::new(notifier.clone())).await;
    notifier.send(&WorkerMessage::done(args.index, &result));

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) if err.is_forced_shutdown() => ExitCode::SUCCESS,
        // Fatal compiler errors were already reported while building
        Err(WorkerError::Compile(_)) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{:?}", worker_error_to_miette(err));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &cli::Cli, notifier: Arc<StdoutNotifier>) -> Result<BuildOutput, WorkerError> {
    let options = BuildOptions::load(&args.to_options())?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => interrupt.cancel(),
            Err(e) => tracing::warn!("failed to listen for interrupts: {}", e),
        }
    });

    let worker = BuildWorker::new(
        Arc::new(FileConfigLoader::new()),
        Arc::new(ProcessCompiler::new()),
        notifier,
    );
    worker
        .run(&args.config, &options, args.index, args.count, cancel)
        .await
}
