//! Progress tracking for long streaming passes
//!
//! Turns a running line count into a percentage of the expected total and an
//! estimate of the remaining time, `elapsed * (1 - ratio) / ratio`.

use std::fmt;
use std::time::{Duration, Instant};

/// Progress of one file at a given line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub line: u64,

    /// `line / expected * 100`; 0 when nothing is expected
    pub percent: f64,

    /// `None` while the ratio is still zero or the estimate does not fit a
    /// `Duration`
    pub remaining: Option<Duration>,
}

impl ProgressSnapshot {
    /// Compute a snapshot from a 1-based line count.
    pub fn compute(line: u64, expected: u64, elapsed: Duration) -> Self {
        let ratio = if expected == 0 {
            0.0
        } else {
            line as f64 / expected as f64
        };

        // Past the expected total the ratio exceeds 1; clamp the estimate at 0.
        // An estimate beyond `Duration::MAX` is dropped.
        let remaining = (ratio > 0.0)
            .then(|| elapsed.as_secs_f64() * (1.0 - ratio) / ratio)
            .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok());

        Self {
            line,
            percent: ratio * 100.0,
            remaining,
        }
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "reading line {} ({:.2}%)", self.line, self.percent)?;
        if let Some(remaining) = self.remaining {
            write!(f, ", ~{} remaining", format_duration(remaining))?;
        }
        Ok(())
    }
}

/// Decides when a progress event is due and what it reports
#[derive(Debug)]
pub struct ProgressTracker {
    expected: u64,
    interval: u64,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(expected: u64, interval: u64) -> Self {
        Self {
            expected,
            interval: interval.max(1),
            started: Instant::now(),
        }
    }

    /// Snapshot for `line` if it falls on the reporting interval.
    pub fn observe(&self, line: u64) -> Option<ProgressSnapshot> {
        (line % self.interval == 0)
            .then(|| ProgressSnapshot::compute(line, self.expected, self.started.elapsed()))
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Render a duration as `1h02m03s`, `2m05s` or `4.2s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_has_two_decimal_display() {
        let snapshot = ProgressSnapshot::compute(1, 3, Duration::ZERO);
        assert!(snapshot.to_string().starts_with("reading line 1 (33.33%)"));
    }

    #[test]
    fn test_remaining_time_estimate() {
        // A quarter done after 10s leaves 30s.
        let snapshot = ProgressSnapshot::compute(25, 100, Duration::from_secs(10));
        assert_eq!(snapshot.percent, 25.0);
        assert_eq!(snapshot.remaining, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_ratio_has_no_estimate() {
        let snapshot = ProgressSnapshot::compute(0, 100, Duration::from_secs(5));
        assert_eq!(snapshot.remaining, None);
        assert_eq!(snapshot.to_string(), "reading line 0 (0.00%)");
    }

    #[test]
    fn test_zero_expected_lines_does_not_divide_by_zero() {
        let snapshot = ProgressSnapshot::compute(10, 0, Duration::from_secs(5));
        assert_eq!(snapshot.percent, 0.0);
        assert_eq!(snapshot.remaining, None);
    }

    #[test]
    fn test_overrun_clamps_remaining_to_zero() {
        let snapshot = ProgressSnapshot::compute(200, 100, Duration::from_secs(5));
        assert_eq!(snapshot.remaining, Some(Duration::ZERO));
    }

    #[test]
    fn test_huge_expected_count_drops_estimate() {
        let snapshot = ProgressSnapshot::compute(1, u64::MAX, Duration::from_secs(10));
        assert_eq!(snapshot.remaining, None);
        assert!(snapshot.to_string().starts_with("reading line 1 (0.00%)"));
    }

    #[test]
    fn test_tracker_interval() {
        let tracker = ProgressTracker::new(1000, 100);
        assert!(tracker.observe(1).is_none());
        assert!(tracker.observe(99).is_none());
        assert_eq!(tracker.observe(100).map(|s| s.line), Some(100));

        let every_line = ProgressTracker::new(10, 0);
        assert!(every_line.observe(1).is_some());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(4200)), "4.2s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h02m03s");
    }
}
