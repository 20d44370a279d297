//! Rounding of clock times.
//!
//! [`round_time`] quantizes a single time. [`apply_rounding`] applies the
//! plan's come/go rules to the work pairs of a day, honoring the
//! `apply_to_all_bookings` scope flag.

use crate::models::{RoundingAlgorithm, RoundingConfig, RoundingRule};

use super::pairing::BookingPair;

/// Quantizes `time` according to `algorithm` and `interval`.
///
/// Up, down and nearest leave the time unchanged for non-positive intervals.
/// Add and subtract shift by `interval` minutes.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::round_time;
/// use attendance_engine::models::RoundingAlgorithm;
///
/// assert_eq!(round_time(487, RoundingAlgorithm::Up, 15), 495);
/// assert_eq!(round_time(487, RoundingAlgorithm::Down, 15), 480);
/// assert_eq!(round_time(487, RoundingAlgorithm::Nearest, 15), 480);
/// assert_eq!(round_time(488, RoundingAlgorithm::Nearest, 15), 495);
/// assert_eq!(round_time(487, RoundingAlgorithm::Add, 5), 492);
/// ```
pub fn round_time(time: i32, algorithm: RoundingAlgorithm, interval: i32) -> i32 {
    match algorithm {
        RoundingAlgorithm::None => time,
        RoundingAlgorithm::Add => time + interval.max(0),
        RoundingAlgorithm::Subtract => time - interval.max(0),
        RoundingAlgorithm::Up | RoundingAlgorithm::Down | RoundingAlgorithm::Nearest
            if interval <= 0 =>
        {
            time
        }
        RoundingAlgorithm::Up => {
            let remainder = time.rem_euclid(interval);
            if remainder == 0 {
                time
            } else {
                time - remainder + interval
            }
        }
        RoundingAlgorithm::Down => time - time.rem_euclid(interval),
        RoundingAlgorithm::Nearest => {
            let remainder = time.rem_euclid(interval);
            if remainder * 2 >= interval {
                time - remainder + interval
            } else {
                time - remainder
            }
        }
    }
}

fn round_with(time: i32, rule: Option<RoundingRule>) -> i32 {
    match rule {
        Some(rule) => round_time(time, rule.algorithm, rule.interval),
        None => time,
    }
}

/// Rounds the calculated times of sorted work pairs in place.
///
/// With `apply_to_all_bookings` every arrival and departure is rounded;
/// otherwise only the first arrival and the last departure of the day.
/// Returns the number of endpoints whose time changed.
pub fn apply_rounding(work_pairs: &mut [BookingPair], config: &RoundingConfig) -> usize {
    let mut changed = 0;
    let mut round_endpoint = |time: &mut i32, rule: Option<RoundingRule>| {
        let rounded = round_with(*time, rule);
        if rounded != *time {
            *time = rounded;
            changed += 1;
        }
    };

    if config.apply_to_all_bookings {
        for pair in work_pairs.iter_mut() {
            round_endpoint(&mut pair.come.calculated, config.come);
            round_endpoint(&mut pair.go.calculated, config.go);
        }
    } else {
        if let Some(first) = work_pairs.first_mut() {
            round_endpoint(&mut first.come.calculated, config.come);
        }
        if let Some(last) = work_pairs.last_mut() {
            round_endpoint(&mut last.go.calculated, config.go);
        }
    }

    // Rounding may not invert a pair.
    for pair in work_pairs.iter_mut() {
        if pair.go.calculated < pair.come.calculated {
            pair.go.calculated = pair.come.calculated;
        }
    }
    changed
}
