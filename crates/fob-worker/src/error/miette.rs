//! Miette diagnostic conversion for worker errors.

use crate::error::{ConfigError, WorkerError};
use miette::Report;

/// Convert a `WorkerError` into a miette report for terminal output.
///
/// Fatal compiler errors are reported while building, so the binary does not
/// pass them through here.
pub fn worker_error_to_miette(err: WorkerError) -> Report {
    match err {
        WorkerError::Config(e) => config_error_to_miette(e),
        WorkerError::Compilation(failure) => miette::miette!("{}", failure.message),
        _ => miette::miette!("{}", err),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::CountMismatch { expected, actual } => miette::miette!(
            "Configuration count changed: expected {}, found {}\n\nHint: Restart the coordinator after editing the configuration",
            expected,
            actual
        ),
        _ => miette::miette!("Configuration error: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildFailure;

    #[test]
    fn test_count_mismatch_report() {
        let report = worker_error_to_miette(WorkerError::Config(ConfigError::CountMismatch {
            expected: 2,
            actual: 1,
        }));
        assert!(report.to_string().contains("expected 2, found 1"));
    }

    #[test]
    fn test_compilation_report_is_the_composite_message() {
        let report = worker_error_to_miette(WorkerError::Compilation(BuildFailure {
            message: "Errors building app\nUnexpected token".to_string(),
            stats: None,
        }));
        assert_eq!(report.to_string(), "Errors building app\nUnexpected token");
    }
}
