//! Formatting helpers for sizes and times.

use std::time::Duration;

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB"];

/// Format a byte count with the largest fitting binary unit.
///
/// ```
/// use fob_worker::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} {}", bytes, SIZE_UNITS[0]),
        _ => format!("{:.2} {}", size, SIZE_UNITS[unit]),
    }
}

/// Format a duration as `850ms`, `1.50s` or `2m 5s`.
pub fn format_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1_000 => format!("{}ms", ms),
        ms if ms < 60_000 => format!("{:.2}s", duration.as_secs_f64()),
        _ => {
            let secs = duration.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Format a millisecond count as seconds, the way build summaries report it.
///
/// ```
/// use fob_worker::ui::format_secs;
///
/// assert_eq!(format_secs(2500), "2.5");
/// assert_eq!(format_secs(3000), "3");
/// ```
pub fn format_secs(millis: u64) -> String {
    format!("{}", millis as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
        // GB is the largest unit
        assert_eq!(format_size(1_099_511_627_776), "1024.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "61m 1s");
    }

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(0), "0");
        assert_eq!(format_secs(15), "0.015");
        assert_eq!(format_secs(2500), "2.5");
        assert_eq!(format_secs(60_000), "60");
    }
}
