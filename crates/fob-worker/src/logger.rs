//! Diagnostic logging for the worker.
//!
//! Logs go to stderr: stdout belongs to the coordinator channel. User-facing
//! status lines are printed by [`crate::ui::Reporter`], not through tracing.
//!
//! ```rust,no_run
//! use fob_worker::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::debug!("loading configuration");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "fob_worker=debug";
const QUIET_FILTER: &str = "fob_worker=error";
const DEFAULT_FILTER: &str = "fob_worker=info";

/// Pick the log filter.
///
/// `verbose` wins over `quiet`; with neither, `RUST_LOG` applies before the
/// default.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    // A second initialization (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init();
}
