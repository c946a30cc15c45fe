//! Text formatting for uptime, byte sizes and usage bars.

use std::time::Duration;

use super::BAR_CELLS;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;

/// Formats an uptime, omitting leading units that are zero.
///
/// `5s` → `05s`, `65s` → `01m 05s`, one day and a bit → `1d 01h 01m 05s`.
#[must_use]
pub fn format_uptime(uptime: Duration) -> String {
    let mut secs = uptime.as_secs();
    let days = secs / SECS_PER_DAY;
    secs %= SECS_PER_DAY;
    let hours = secs / SECS_PER_HOUR;
    secs %= SECS_PER_HOUR;
    let mins = secs / SECS_PER_MINUTE;
    secs %= SECS_PER_MINUTE;

    if days > 0 {
        format!("{days}d {hours:02}h {mins:02}m {secs:02}s")
    } else if hours > 0 {
        format!("{hours:02}h {mins:02}m {secs:02}s")
    } else if mins > 0 {
        format!("{mins:02}m {secs:02}s")
    } else {
        format!("{secs:02}s")
    }
}

/// Formats a byte count with binary units and two decimals.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_human(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const SUFFIXES: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < SUFFIXES.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.2} {}", bytes as f64 / div as f64, SUFFIXES[exp])
}

/// Renders a ten-cell bar for a percentage; out-of-range input is clamped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_bar(percent: f64) -> String {
    let percent = if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    };
    let filled = ((percent / 100.0) * BAR_CELLS as f64).floor() as usize;

    let mut bar = String::with_capacity(BAR_CELLS * 3);
    for i in 0..BAR_CELLS {
        bar.push(if i < filled { '▰' } else { '▱' });
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "00s");
        assert_eq!(format_uptime(Duration::from_secs(5)), "05s");
        assert_eq!(format_uptime(Duration::from_secs(65)), "01m 05s");
        assert_eq!(format_uptime(Duration::from_secs(3665)), "01h 01m 05s");
        assert_eq!(format_uptime(Duration::from_secs(90_065)), "1d 01h 01m 05s");
        assert_eq!(format_uptime(Duration::from_secs(86_400)), "1d 00h 00m 00s");
    }

    #[test]
    fn test_format_uptime_ignores_subsecond() {
        assert_eq!(format_uptime(Duration::from_millis(59_999)), "59s");
    }

    #[test]
    fn test_bytes_to_human() {
        assert_eq!(bytes_to_human(0), "0 B");
        assert_eq!(bytes_to_human(1023), "1023 B");
        assert_eq!(bytes_to_human(1024), "1.00 KB");
        assert_eq!(bytes_to_human(1536), "1.50 KB");
        assert_eq!(bytes_to_human(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(bytes_to_human(8 * 1024 * 1024 * 1024), "8.00 GB");
        assert_eq!(bytes_to_human(2 * 1024_u64.pow(4)), "2.00 TB");
    }

    #[test]
    fn test_bytes_to_human_saturates_at_tb() {
        assert_eq!(bytes_to_human(1024_u64.pow(5)), "1024.00 TB");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(9.9), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(45.0), "▰▰▰▰▱▱▱▱▱▱");
        assert_eq!(progress_bar(100.0), "▰▰▰▰▰▰▰▰▰▰");
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(-20.0), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(250.0), "▰▰▰▰▰▰▰▰▰▰");
        assert_eq!(progress_bar(f64::NAN), "▱▱▱▱▱▱▱▱▱▱");
    }
}
