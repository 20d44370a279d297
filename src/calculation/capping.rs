//! Evaluation window capping and presence validation.
//!
//! Capping clamps counted work time to `come_from..go_to`. The lower bound
//! moves earlier by `come_minus` when early arrival is permitted (flextime or
//! variable work time); the upper bound moves later by `go_plus`. Every
//! capped boundary is reported with its source so the caller can record a
//! warning.

use serde::{Deserialize, Serialize};

use crate::models::{DayPlan, ErrorCode, PlanType};

use super::tolerance::EffectiveTolerance;

/// Why a boundary was capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CappingSource {
    /// Arrival before the evaluation window.
    EarlyArrival,
    /// Departure after the evaluation window.
    LateDeparture,
}

/// One capped boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CappedBoundary {
    /// Why capping occurred.
    pub source: CappingSource,
    /// Time before capping.
    pub before: i32,
    /// Time after capping.
    pub after: i32,
}

impl CappedBoundary {
    /// Minutes removed by the cap.
    pub fn minutes(&self) -> i32 {
        (self.after - self.before).abs()
    }
}

/// Result of capping one arrival/departure pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowCapping {
    /// Capped arrival.
    pub come: i32,
    /// Capped departure; never before `come`.
    pub go: i32,
    /// Boundaries that were capped.
    pub capped: Vec<CappedBoundary>,
}

/// Earliest counted arrival, if the plan has a window start.
pub fn arrival_floor(plan: &DayPlan, tolerance: &EffectiveTolerance) -> Option<i32> {
    let early_arrival_permitted =
        plan.plan_type == PlanType::Flextime || tolerance.variable_work_time;
    plan.come_from.map(|come_from| {
        if early_arrival_permitted {
            come_from - tolerance.tolerance.come_minus
        } else {
            come_from
        }
    })
}

/// Latest counted departure, if the plan has a window end.
pub fn departure_ceiling(plan: &DayPlan, tolerance: &EffectiveTolerance) -> Option<i32> {
    plan.go_to
        .map(|go_to| go_to + tolerance.tolerance.go_plus)
}

/// Clamps an arrival/departure pair to the plan's evaluation window.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{apply_window_capping, effective_tolerance, CappingSource};
/// use attendance_engine::models::DayPlan;
///
/// let mut plan = DayPlan::new("standard", 480);
/// plan.come_from = Some(480);
/// plan.go_to = Some(1080);
///
/// let capping = apply_window_capping(450, 1020, &plan, &effective_tolerance(&plan));
/// assert_eq!(capping.come, 480);
/// assert_eq!(capping.go, 1020);
/// assert_eq!(capping.capped[0].source, CappingSource::EarlyArrival);
/// ```
pub fn apply_window_capping(
    come_time: i32,
    go_time: i32,
    plan: &DayPlan,
    tolerance: &EffectiveTolerance,
) -> WindowCapping {
    let mut capped = Vec::new();
    let mut come = come_time;
    let mut go = go_time;

    if let Some(floor) = arrival_floor(plan, tolerance) {
        if come < floor {
            capped.push(CappedBoundary {
                source: CappingSource::EarlyArrival,
                before: come,
                after: floor,
            });
            come = floor;
        }
    }
    if let Some(ceiling) = departure_ceiling(plan, tolerance) {
        if go > ceiling {
            capped.push(CappedBoundary {
                source: CappingSource::LateDeparture,
                before: go,
                after: ceiling,
            });
            go = ceiling;
        }
    }

    // An interval entirely outside the window collapses to zero length.
    if go < come {
        go = come;
    }
    WindowCapping { come, go, capped }
}

/// Checks that presence covers the core window.
///
/// Returns nothing when no core window is configured.
///
/// ```
/// use attendance_engine::calculation::validate_core_hours;
/// use attendance_engine::models::ErrorCode;
///
/// let codes = validate_core_hours(Some(560), Some(960), Some(540), Some(900));
/// assert_eq!(codes, vec![ErrorCode::MissedCoreStart]);
///
/// assert!(validate_core_hours(Some(560), Some(960), None, None).is_empty());
/// ```
pub fn validate_core_hours(
    first_come: Option<i32>,
    last_go: Option<i32>,
    core_start: Option<i32>,
    core_end: Option<i32>,
) -> Vec<ErrorCode> {
    let (Some(core_start), Some(core_end)) = (core_start, core_end) else {
        return Vec::new();
    };
    let mut codes = Vec::new();
    if first_come.is_none_or(|come| come > core_start) {
        codes.push(ErrorCode::MissedCoreStart);
    }
    if last_go.is_none_or(|go| go < core_end) {
        codes.push(ErrorCode::MissedCoreEnd);
    }
    codes
}

/// Checks the latest allowed arrival (`come_to`) and the earliest allowed
/// departure (`go_from`).
pub fn validate_time_window(
    first_come: Option<i32>,
    last_go: Option<i32>,
    plan: &DayPlan,
) -> Vec<ErrorCode> {
    let mut codes = Vec::new();
    if let (Some(come), Some(come_to)) = (first_come, plan.come_to) {
        if come > come_to {
            codes.push(ErrorCode::LateCome);
        }
    }
    if let (Some(go), Some(go_from)) = (last_go, plan.go_from) {
        if go < go_from {
            codes.push(ErrorCode::EarlyGo);
        }
    }
    codes
}

/// Caps net time at the plan maximum. Returns the capped value and the
/// minutes that were cut off.
pub fn cap_net_time(net_time: i32, max_net_minutes: Option<i32>) -> (i32, i32) {
    match max_net_minutes {
        Some(max) if net_time > max => (max, net_time - max),
        _ => (net_time, 0),
    }
}
