//! Terminal output for the worker.
//!
//! [`Reporter`] prints status lines; the format helpers turn sizes and
//! durations into short human-readable strings.

mod format;
mod messages;

pub use format::{format_duration, format_secs, format_size};
pub use messages::Reporter;

/// Whether status lines should be colored when no explicit choice was made.
///
/// A non-empty `NO_COLOR` disables color, `FORCE_COLOR` enables it, and
/// otherwise color follows whether a person is watching stderr.
pub fn should_use_color() -> bool {
    decide_color(
        std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
        std::env::var_os("FORCE_COLOR").is_some(),
        console::user_attended_stderr(),
    )
}

fn decide_color(no_color: bool, force_color: bool, attended: bool) -> bool {
    !no_color && (force_color || attended)
}
