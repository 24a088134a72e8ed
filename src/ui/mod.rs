//! The presentation layer: renders player snapshots into the now-playing
//! panel and maps button presses back onto player operations.

pub mod controls;
pub mod embeds;
pub mod handlers;

use std::time::Duration;

/// Format a duration as `H:MM:SS` when at least an hour long, else `MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Abbreviate large counts with `K`/`M` suffixes at one decimal place.
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}

/// Render a text progress bar, `length` cells wide, with a marker at the
/// current position.
pub fn progress_bar(elapsed: Duration, total: Duration, length: usize) -> String {
    if total.is_zero() {
        return "━".repeat(length);
    }

    let progress = (elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0);
    let filled = ((progress * length as f64) as usize).min(length.saturating_sub(1));
    format!(
        "{}◉{}",
        "━".repeat(filled),
        "━".repeat(length - filled - 1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0, "00:00")]
    #[test_case(59, "00:59")]
    #[test_case(245, "04:05")]
    #[test_case(3600, "1:00:00")]
    #[test_case(3725, "1:02:05")]
    #[test_case(7322, "2:02:02")]
    fn durations_render_in_clock_format(seconds: u64, expected: &str) {
        assert_eq!(format_duration(Duration::from_secs(seconds)), expected);
    }

    #[test_case(0, "0")]
    #[test_case(999, "999")]
    #[test_case(1_000, "1.0K")]
    #[test_case(1_500, "1.5K")]
    #[test_case(999_999, "1000.0K")]
    #[test_case(1_000_000, "1.0M")]
    #[test_case(2_340_000, "2.3M")]
    fn counts_abbreviate_with_suffixes(count: u64, expected: &str) {
        assert_eq!(format_count(count), expected);
    }

    #[test]
    fn progress_bar_is_always_the_requested_width() {
        let total = Duration::from_secs(100);
        for seconds in [0, 25, 50, 99, 100, 500] {
            let bar = progress_bar(Duration::from_secs(seconds), total, 20);
            assert_eq!(bar.chars().count(), 20, "at {seconds}s");
        }
    }

    #[test]
    fn zero_length_total_renders_an_indeterminate_bar() {
        let bar = progress_bar(Duration::from_secs(10), Duration::ZERO, 20);
        assert_eq!(bar, "━".repeat(20));
    }

    #[test]
    fn marker_moves_with_progress() {
        let total = Duration::from_secs(100);
        let start = progress_bar(Duration::ZERO, total, 20);
        let end = progress_bar(total, total, 20);
        assert!(start.starts_with('◉'));
        assert!(end.ends_with('◉'));
    }
}
