//! Status message output.

use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Where status lines are written.
#[derive(Debug, Clone)]
enum Sink {
    Stderr,
    Buffer(Arc<Mutex<Vec<u8>>>),
}

/// Prints human-readable status lines.
///
/// Color is an explicit setting rather than process-wide state, so several
/// reporters with different settings can coexist.
///
/// # Examples
///
/// ```no_run
/// use fob_worker::ui::Reporter;
///
/// let reporter = Reporter::stderr(false);
/// reporter.info("Started building main.js");
/// reporter.success("Finished building main.js in 1.2 seconds");
/// ```
#[derive(Debug, Clone)]
pub struct Reporter {
    colors: bool,
    sink: Sink,
}

impl Reporter {
    /// Reporter writing to stderr.
    pub fn stderr(colors: bool) -> Self {
        Self {
            colors,
            sink: Sink::Stderr,
        }
    }

    /// Reporter writing into a shared in-memory buffer.
    pub fn buffered(colors: bool) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                colors,
                sink: Sink::Buffer(buffer.clone()),
            },
            buffer,
        )
    }

    pub fn colors(&self) -> bool {
        self.colors
    }

    pub fn success(&self, message: &str) {
        if self.colors {
            self.write_line(&format!("{} {}", "✓".green().bold(), message));
        } else {
            self.write_line(&format!("✓ {}", message));
        }
    }

    pub fn info(&self, message: &str) {
        if self.colors {
            self.write_line(&format!("{} {}", "ℹ".blue().bold(), message));
        } else {
            self.write_line(&format!("ℹ {}", message));
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colors {
            self.write_line(&format!("{} {}", "⚠".yellow().bold(), message.yellow()));
        } else {
            self.write_line(&format!("⚠ {}", message));
        }
    }

    pub fn error(&self, message: &str) {
        if self.colors {
            self.write_line(&format!("{} {}", "✗".red().bold(), message.red()));
        } else {
            self.write_line(&format!("✗ {}", message));
        }
    }

    /// Print preformatted text as-is.
    pub fn plain(&self, text: &str) {
        self.write_line(text);
    }

    fn write_line(&self, line: &str) {
        match self.sink {
            Sink::Stderr => {
                let mut stderr = std::io::stderr().lock();
                let _ = writeln!(stderr, "{}", line);
            }
            Sink::Buffer(ref buffer) => {
                let _ = writeln!(buffer.lock(), "{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().clone()).unwrap()
    }

    #[test]
    fn test_status_messages_without_colors() {
        let (reporter, buffer) = Reporter::buffered(false);
        reporter.success("Success message");
        reporter.info("Info message");
        reporter.warning("Warning message");
        reporter.error("Error message");
        reporter.plain("Time: 10ms");

        let output = captured(&buffer);
        assert_eq!(
            output,
            "✓ Success message\nℹ Info message\n⚠ Warning message\n✗ Error message\nTime: 10ms\n"
        );
    }

    #[test]
    fn test_status_messages_with_colors() {
        let (reporter, buffer) = Reporter::buffered(true);
        reporter.error("Error message");
        assert!(captured(&buffer).contains('\u{1b}'));
        assert!(reporter.colors());
    }

    #[test]
    fn test_stderr_reporter() {
        // Should not panic
        Reporter::stderr(false).info("Info message");
    }
}
