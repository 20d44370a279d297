//! Minutes-from-midnight primitives.
//!
//! Times are plain `i32` minutes relative to midnight of the day an interval
//! is attributed to. Values outside `0..=1440` are legal and denote the
//! adjacent day (e.g. `1560` is 02:00 on the next day).

use serde::{Deserialize, Serialize};

/// Minutes in one day.
pub const MINUTES_PER_DAY: i32 = 1440;

/// A half-open interval `[start, end)` in minutes.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::TimeInterval;
///
/// let morning = TimeInterval::new(480, 720);
/// let lunch = TimeInterval::new(700, 730);
/// assert_eq!(morning.duration(), 240);
/// assert_eq!(morning.overlap(&lunch), 20);
/// assert!(morning.contains(480));
/// assert!(!morning.contains(720));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Inclusive start.
    pub start: i32,
    /// Exclusive end.
    pub end: i32,
}

impl TimeInterval {
    /// Creates an interval. An `end` before `start` yields an empty interval.
    pub fn new(start: i32, end: i32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Length in minutes.
    pub fn duration(&self) -> i32 {
        self.end - self.start
    }

    /// Returns true for zero-length intervals.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `minute` lies inside the interval.
    pub fn contains(&self, minute: i32) -> bool {
        minute >= self.start && minute < self.end
    }

    /// Minutes shared with `other`.
    pub fn overlap(&self, other: &TimeInterval) -> i32 {
        overlap_minutes(self.start, self.end, other.start, other.end)
    }

    /// Returns true if the interval extends past midnight in either direction.
    pub fn crosses_midnight(&self) -> bool {
        self.start < 0 || self.end > MINUTES_PER_DAY
    }
}

/// Minutes shared by `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlap_minutes(a_start: i32, a_end: i32, b_start: i32, b_end: i32) -> i32 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0)
}

/// Total minutes of `intervals` falling into `[start, end)`.
pub fn overlap_with_all(intervals: &[TimeInterval], start: i32, end: i32) -> i32 {
    intervals
        .iter()
        .map(|interval| overlap_minutes(interval.start, interval.end, start, end))
        .sum()
}

/// Sum of interval durations.
pub fn total_duration(intervals: &[TimeInterval]) -> i32 {
    intervals.iter().map(TimeInterval::duration).sum()
}

/// Minutes between consecutive intervals, assuming they are sorted.
pub fn gap_minutes(intervals: &[TimeInterval]) -> i32 {
    intervals
        .windows(2)
        .map(|pair| (pair[1].start - pair[0].end).max(0))
        .sum()
}

/// Formats minutes as `HH:MM`, wrapping into the 24-hour clock.
///
/// ```
/// use attendance_engine::calculation::format_minutes;
///
/// assert_eq!(format_minutes(485), "08:05");
/// assert_eq!(format_minutes(1560), "02:00");
/// ```
pub fn format_minutes(minutes: i32) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_interval_is_empty() {
        let interval = TimeInterval::new(600, 500);
        assert!(interval.is_empty());
        assert_eq!(interval.duration(), 0);
    }

    #[test]
    fn test_overlap_is_half_open() {
        assert_eq!(overlap_minutes(480, 720, 720, 750), 0);
        assert_eq!(overlap_minutes(480, 730, 720, 750), 10);
        assert_eq!(overlap_minutes(700, 800, 720, 750), 30);
    }

    #[test]
    fn test_overlap_with_all_sums_intervals() {
        let work = [TimeInterval::new(480, 725), TimeInterval::new(745, 1020)];
        assert_eq!(overlap_with_all(&work, 720, 750), 10);
    }

    #[test]
    fn test_gap_minutes_between_sorted_intervals() {
        let work = [
            TimeInterval::new(480, 720),
            TimeInterval::new(750, 900),
            TimeInterval::new(915, 1020),
        ];
        assert_eq!(gap_minutes(&work), 45);
        assert_eq!(total_duration(&work), 495);
    }

    #[test]
    fn test_crosses_midnight() {
        assert!(TimeInterval::new(1320, 1560).crosses_midnight());
        assert!(TimeInterval::new(-120, 360).crosses_midnight());
        assert!(!TimeInterval::new(0, 1440).crosses_midnight());
    }

    #[test]
    fn test_format_minutes_wraps_negative() {
        assert_eq!(format_minutes(-60), "23:00");
        assert_eq!(format_minutes(0), "00:00");
    }
}
