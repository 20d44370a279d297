//! Tolerance handling.
//!
//! Snaps arrivals and departures to the evaluation window boundaries when
//! they fall inside the configured grace windows. The snapping functions are
//! rule-agnostic; which tolerances apply to which plan type is decided once,
//! in [`effective_tolerance`].

use crate::models::{DayPlan, PlanType, ToleranceConfig};

/// Tolerance values after plan-type gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveTolerance {
    /// Grace values that actually apply.
    pub tolerance: ToleranceConfig,
    /// Whether early arrival within `come_minus` is permitted.
    pub variable_work_time: bool,
}

/// Neutralizes the tolerance fields that are inert for the plan's type.
///
/// - Flextime: `come_plus` and `go_minus` are zero and variable work time is off.
/// - Fixed: `come_minus` is zero unless variable work time is set.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::effective_tolerance;
/// use attendance_engine::models::{DayPlan, PlanType};
///
/// let mut plan = DayPlan::new("flex", 480);
/// plan.plan_type = PlanType::Flextime;
/// plan.tolerance.come_plus = 15;
/// plan.tolerance.come_minus = 10;
///
/// let effective = effective_tolerance(&plan);
/// assert_eq!(effective.tolerance.come_plus, 0);
/// assert_eq!(effective.tolerance.come_minus, 10);
/// ```
pub fn effective_tolerance(plan: &DayPlan) -> EffectiveTolerance {
    let configured = plan.tolerance;
    match plan.plan_type {
        PlanType::Flextime => EffectiveTolerance {
            tolerance: ToleranceConfig {
                come_plus: 0,
                go_minus: 0,
                ..configured
            },
            variable_work_time: false,
        },
        PlanType::Fixed => EffectiveTolerance {
            tolerance: ToleranceConfig {
                come_minus: if plan.variable_work_time {
                    configured.come_minus
                } else {
                    0
                },
                ..configured
            },
            variable_work_time: plan.variable_work_time,
        },
    }
}

/// Snaps an arrival to `reference_come_from` when it is late within
/// `come_plus` or early within `come_minus`.
///
/// Without a reference the arrival passes through unchanged.
///
/// ```
/// use attendance_engine::calculation::apply_come_tolerance;
/// use attendance_engine::models::ToleranceConfig;
///
/// let config = ToleranceConfig { come_plus: 10, ..ToleranceConfig::default() };
/// assert_eq!(apply_come_tolerance(485, &config, Some(480)), 480);
/// assert_eq!(apply_come_tolerance(495, &config, Some(480)), 495);
/// assert_eq!(apply_come_tolerance(485, &config, None), 485);
/// ```
pub fn apply_come_tolerance(
    come_time: i32,
    config: &ToleranceConfig,
    reference_come_from: Option<i32>,
) -> i32 {
    let Some(reference) = reference_come_from else {
        return come_time;
    };
    if come_time > reference && come_time - reference <= config.come_plus {
        return reference;
    }
    if come_time < reference && reference - come_time <= config.come_minus {
        return reference;
    }
    come_time
}

/// Snaps a departure to `reference_go_to` when it is early within `go_minus`
/// or late within `go_plus`.
pub fn apply_go_tolerance(
    go_time: i32,
    config: &ToleranceConfig,
    reference_go_to: Option<i32>,
) -> i32 {
    let Some(reference) = reference_go_to else {
        return go_time;
    };
    if go_time < reference && reference - go_time <= config.go_minus {
        return reference;
    }
    if go_time > reference && go_time - reference <= config.go_plus {
        return reference;
    }
    go_time
}
