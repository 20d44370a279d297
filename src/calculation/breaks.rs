//! Break deduction.
//!
//! Rules are evaluated in precedence order:
//!
//! 1. **Fixed** breaks are deducted wherever work overlaps their window,
//!    regardless of manual break bookings.
//! 2. **Variable** breaks are deducted only when no break was booked manually.
//! 3. **Minimum** breaks top up the break time once gross work exceeds the
//!    rule's threshold: the full duration, or only the shortfall when
//!    `minutes_difference` is set.
//!
//! Windowed deductions whose windows overlap, and manual breaks inside those
//! windows, count the same minutes; the maximum is taken instead of the sum.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{BreakRule, BreakType, WarningCode};

use super::time_value::{TimeInterval, gap_minutes, overlap_with_all, total_duration};

/// A break rule that contributed to the deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBreak {
    /// Index of the rule in the plan's break list.
    pub rule_index: usize,
    /// Kind of the rule.
    pub break_type: BreakType,
    /// Minutes the rule asked to deduct.
    pub minutes: i32,
}

/// Result of the break calculation for a day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakDeduction {
    /// Total break time subtracted from gross time, including recorded breaks.
    pub total_minutes: i32,
    /// Manually booked break minutes falling inside work intervals.
    pub recorded_minutes: i32,
    /// Rules that contributed.
    pub applied: Vec<AppliedBreak>,
    /// Notices for automatically applied breaks.
    pub warnings: BTreeSet<WarningCode>,
}

struct WindowedDeduction {
    start: i32,
    end: i32,
    minutes: i32,
}

fn threshold_reached(rule: &BreakRule, gross: i32) -> bool {
    gross > 0 && rule.after_work_minutes.is_none_or(|threshold| gross > threshold)
}

/// Parts of the manual breaks that fall inside work intervals.
fn clip_to_work(work: &[TimeInterval], manual_breaks: &[TimeInterval]) -> Vec<TimeInterval> {
    manual_breaks
        .iter()
        .flat_map(|manual| {
            work.iter().filter_map(move |interval| {
                let clipped = TimeInterval::new(
                    manual.start.max(interval.start),
                    manual.end.min(interval.end),
                );
                (!clipped.is_empty()).then_some(clipped)
            })
        })
        .collect()
}

/// Computes the break minutes to subtract from gross work time.
///
/// `work` must be sorted by start. `manual_breaks` are the intervals of
/// manually booked breaks; any manual break suppresses variable breaks.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{calculate_break_deduction, TimeInterval};
/// use attendance_engine::models::{BreakRule, BreakType};
///
/// let lunch = BreakRule {
///     break_type: BreakType::Fixed,
///     start: Some(720),
///     end: Some(750),
///     duration: 30,
///     after_work_minutes: None,
///     minutes_difference: false,
/// };
/// let work = [TimeInterval::new(480, 1020)];
///
/// let deduction = calculate_break_deduction(&work, &[], &[lunch]);
/// assert_eq!(deduction.total_minutes, 30);
/// ```
pub fn calculate_break_deduction(
    work: &[TimeInterval],
    manual_breaks: &[TimeInterval],
    rules: &[BreakRule],
) -> BreakDeduction {
    let gross = total_duration(work);
    let manual_in_work = clip_to_work(work, manual_breaks);
    let recorded = total_duration(&manual_in_work);
    let has_manual_break = !manual_breaks.is_empty();

    let mut result = BreakDeduction {
        recorded_minutes: recorded,
        ..BreakDeduction::default()
    };
    let mut windowed: Vec<WindowedDeduction> = Vec::new();
    let mut unwindowed = 0;

    for (rule_index, rule) in rules.iter().enumerate() {
        let minutes = match rule.break_type {
            BreakType::Fixed => match rule.window() {
                Some((start, end)) => {
                    let minutes = rule.duration.min(overlap_with_all(work, start, end));
                    if minutes > 0 {
                        windowed.push(WindowedDeduction {
                            start,
                            end,
                            minutes,
                        });
                    }
                    minutes
                }
                None => 0,
            },
            BreakType::Variable => {
                if has_manual_break || !threshold_reached(rule, gross) {
                    continue;
                }
                let minutes = match rule.window() {
                    Some((start, end)) => {
                        let minutes = rule.duration.min(overlap_with_all(work, start, end));
                        if minutes > 0 {
                            windowed.push(WindowedDeduction {
                                start,
                                end,
                                minutes,
                            });
                        }
                        minutes
                    }
                    None => {
                        let minutes = rule.duration.min(gross);
                        unwindowed += minutes;
                        minutes
                    }
                };
                if minutes > 0 {
                    result.warnings.insert(WarningCode::AutoBreakApplied);
                }
                minutes
            }
            BreakType::Minimum => continue,
        };
        if minutes > 0 {
            result.applied.push(AppliedBreak {
                rule_index,
                break_type: rule.break_type,
                minutes,
            });
        }
    }

    // Overlapping windows form one group deducting its largest claim; manual
    // breaks inside a group's span count towards that claim.
    windowed.sort_by_key(|deduction| (deduction.start, deduction.end));
    let mut groups: Vec<WindowedDeduction> = Vec::new();
    for deduction in windowed {
        match groups.last_mut() {
            Some(group) if deduction.start < group.end => {
                group.end = group.end.max(deduction.end);
                group.minutes = group.minutes.max(deduction.minutes);
            }
            _ => groups.push(deduction),
        }
    }
    let mut manual_inside_groups = 0;
    let mut total = unwindowed;
    for group in &groups {
        let manual_in_span = overlap_with_all(&manual_in_work, group.start, group.end);
        manual_inside_groups += manual_in_span;
        total += group.minutes.max(manual_in_span);
    }
    total += recorded - manual_inside_groups;

    for (rule_index, rule) in rules.iter().enumerate() {
        if rule.break_type != BreakType::Minimum || !threshold_reached(rule, gross) {
            continue;
        }
        let taken = total + gap_minutes(work);
        if taken >= rule.duration {
            continue;
        }
        let minutes = if rule.minutes_difference {
            rule.duration - taken
        } else {
            rule.duration
        };
        total += minutes;
        result.applied.push(AppliedBreak {
            rule_index,
            break_type: BreakType::Minimum,
            minutes,
        });
        result.warnings.insert(WarningCode::MinimumBreakApplied);
    }

    result.total_minutes = total.min(gross);
    result
}
