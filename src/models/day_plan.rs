//! Day plan model.
//!
//! A [`DayPlan`] is the effective rule set for one employee on one date. It is
//! resolved outside the engine and handed in as an immutable value. Optional
//! fields distinguish "not configured" from "configured as zero": a plan with
//! no `core_start` performs no core-time validation at all.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the employee works a fixed schedule or flextime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Fixed start and end times.
    #[default]
    Fixed,
    /// Arrival and departure may vary within the evaluation window.
    Flextime,
}

/// Grace windows around the evaluation window boundaries, in minutes.
///
/// These are the raw configured values. Use
/// [`effective_tolerance`](crate::calculation::effective_tolerance) to get the
/// values that actually apply for the plan type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Late arrival still treated as on time.
    pub come_plus: i32,
    /// Early arrival snapped to the window start.
    pub come_minus: i32,
    /// Late departure snapped to the window end.
    pub go_plus: i32,
    /// Early departure still treated as on time.
    pub go_minus: i32,
}

/// How a clock time is quantized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingAlgorithm {
    /// Leave the time unchanged.
    #[default]
    None,
    /// Round up to the next multiple of the interval.
    Up,
    /// Round down to the previous multiple of the interval.
    Down,
    /// Round to the nearest multiple of the interval (halves round up).
    Nearest,
    /// Add a fixed number of minutes.
    Add,
    /// Subtract a fixed number of minutes.
    Subtract,
}

/// One rounding rule: an algorithm and its interval (or offset for add/subtract).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingRule {
    /// The rounding algorithm.
    pub algorithm: RoundingAlgorithm,
    /// Interval in minutes; the offset for [`RoundingAlgorithm::Add`] and
    /// [`RoundingAlgorithm::Subtract`].
    pub interval: i32,
}

/// Rounding configuration for arrivals and departures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundingConfig {
    /// Rule applied to arrivals.
    pub come: Option<RoundingRule>,
    /// Rule applied to departures.
    pub go: Option<RoundingRule>,
    /// Round every work booking instead of only the first arrival and the
    /// last departure of the day.
    pub apply_to_all_bookings: bool,
}

/// The kind of break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakType {
    /// Deducted whenever work overlaps the break window.
    Fixed,
    /// Deducted only when no break was booked manually.
    Variable,
    /// Guarantees a minimum break once work exceeds a threshold.
    Minimum,
}

/// A single break rule of a day plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakRule {
    /// The kind of break.
    pub break_type: BreakType,
    /// Window start, for fixed and windowed variable breaks.
    #[serde(default)]
    pub start: Option<i32>,
    /// Window end, for fixed and windowed variable breaks.
    #[serde(default)]
    pub end: Option<i32>,
    /// Break length in minutes.
    pub duration: i32,
    /// Gross work time that must be exceeded before the rule applies.
    #[serde(default)]
    pub after_work_minutes: Option<i32>,
    /// For minimum breaks: deduct only the shortfall against breaks already
    /// taken instead of the full duration.
    #[serde(default)]
    pub minutes_difference: bool,
}

impl BreakRule {
    /// Returns the configured `(start, end)` window, if complete.
    pub fn window(&self) -> Option<(i32, i32)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if end > start => Some((start, end)),
            _ => None,
        }
    }
}

/// Explicit holiday credit per holiday category, in minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayCredits {
    /// Credit for category 1 holidays.
    pub category_1: Option<i32>,
    /// Credit for category 2 holidays.
    pub category_2: Option<i32>,
    /// Credit for category 3 holidays.
    pub category_3: Option<i32>,
}

/// What happens on a working day without any bookings.
///
/// Legacy names used by older integrations map onto this enum as
/// `credit_target` → `adopt_target`, `credit_zero` → `deduct_target` and
/// `use_absence` → `vocational_school`. There is no `skip`: every day ends in
/// a stored daily value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoBookingBehavior {
    /// Mark the day as an error.
    #[default]
    Error,
    /// Book no time and deduct the target from the balance.
    #[serde(alias = "credit_zero")]
    DeductTarget,
    /// Credit the target and create a vocational school absence.
    #[serde(alias = "use_absence")]
    VocationalSchool,
    /// Credit the target as worked.
    #[serde(alias = "credit_target")]
    AdoptTarget,
    /// Credit the target and post it to the plan's order account.
    TargetWithOrder,
}

/// How work intervals crossing midnight are attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChangeBehavior {
    /// Only same-day pairs are considered.
    #[default]
    None,
    /// A crossing interval belongs wholly to the arrival day.
    AtArrival,
    /// A crossing interval belongs wholly to the departure day.
    AtDeparture,
    /// Split the interval at midnight with synthetic bookings.
    AutoComplete,
}

/// Target time configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetHours {
    /// Regular target in minutes.
    pub regular_minutes: i32,
    /// Target on absence days, when it differs from the regular target.
    pub absence_day_minutes: Option<i32>,
    /// Take the target from the employee master record when it has one.
    pub from_employee_master: bool,
}

/// The effective rule set for one employee on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    /// Short code identifying the plan (e.g. "standard").
    pub code: String,
    /// Fixed or flextime.
    #[serde(default)]
    pub plan_type: PlanType,
    /// Earliest counted arrival.
    #[serde(default)]
    pub come_from: Option<i32>,
    /// Latest allowed arrival.
    #[serde(default)]
    pub come_to: Option<i32>,
    /// Earliest allowed departure.
    #[serde(default)]
    pub go_from: Option<i32>,
    /// Latest counted departure.
    #[serde(default)]
    pub go_to: Option<i32>,
    /// Start of mandatory presence.
    #[serde(default)]
    pub core_start: Option<i32>,
    /// End of mandatory presence.
    #[serde(default)]
    pub core_end: Option<i32>,
    /// Grace windows.
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    /// Rounding rules.
    #[serde(default)]
    pub rounding: RoundingConfig,
    /// Break rules, applied together.
    #[serde(default)]
    pub breaks: Vec<BreakRule>,
    /// Net time below which the day is flagged.
    #[serde(default)]
    pub min_net_minutes: Option<i32>,
    /// Net time above which work is not counted.
    #[serde(default)]
    pub max_net_minutes: Option<i32>,
    /// Fixed plans only: allow early arrival within `come_minus`.
    #[serde(default)]
    pub variable_work_time: bool,
    /// Explicit holiday credits by category.
    #[serde(default)]
    pub holiday_credits: HolidayCredits,
    /// Behavior for working days without bookings.
    #[serde(default)]
    pub no_booking_behavior: NoBookingBehavior,
    /// Handling of intervals crossing midnight.
    #[serde(default)]
    pub day_change_behavior: DayChangeBehavior,
    /// Target time configuration.
    #[serde(default)]
    pub target: TargetHours,
    /// Vacation days deducted for a full-day vacation absence.
    #[serde(default = "default_vacation_deduction")]
    pub vacation_deduction: Decimal,
    /// Order account credited by [`NoBookingBehavior::TargetWithOrder`].
    #[serde(default)]
    pub order_id: Option<Uuid>,
}

fn default_vacation_deduction() -> Decimal {
    Decimal::ONE
}

impl DayPlan {
    /// Creates a plan with the given code and target and no rules configured.
    ///
    /// # Example
    ///
    /// ```
    /// use attendance_engine::models::{DayPlan, NoBookingBehavior, PlanType};
    ///
    /// let plan = DayPlan::new("standard", 480);
    /// assert_eq!(plan.plan_type, PlanType::Fixed);
    /// assert_eq!(plan.target.regular_minutes, 480);
    /// assert_eq!(plan.no_booking_behavior, NoBookingBehavior::Error);
    /// assert!(plan.core_start.is_none());
    /// ```
    pub fn new(code: impl Into<String>, target_minutes: i32) -> Self {
        Self {
            code: code.into(),
            plan_type: PlanType::Fixed,
            come_from: None,
            come_to: None,
            go_from: None,
            go_to: None,
            core_start: None,
            core_end: None,
            tolerance: ToleranceConfig::default(),
            rounding: RoundingConfig::default(),
            breaks: Vec::new(),
            min_net_minutes: None,
            max_net_minutes: None,
            variable_work_time: false,
            holiday_credits: HolidayCredits::default(),
            no_booking_behavior: NoBookingBehavior::Error,
            day_change_behavior: DayChangeBehavior::None,
            target: TargetHours {
                regular_minutes: target_minutes,
                ..TargetHours::default()
            },
            vacation_deduction: default_vacation_deduction(),
            order_id: None,
        }
    }

    /// The plan used for days the resolver marks as off.
    ///
    /// No windows or breaks apply and the target is zero, so any booked time
    /// counts as overtime and an empty day is simply zero.
    pub fn off_day() -> Self {
        Self {
            plan_type: PlanType::Flextime,
            no_booking_behavior: NoBookingBehavior::AdoptTarget,
            vacation_deduction: Decimal::ZERO,
            ..Self::new("off_day", 0)
        }
    }

    /// Returns true when both core bounds are configured.
    pub fn has_core_time(&self) -> bool {
        self.core_start.is_some() && self.core_end.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_day_has_zero_target() {
        let plan = DayPlan::off_day();
        assert_eq!(plan.target.regular_minutes, 0);
        assert_eq!(plan.no_booking_behavior, NoBookingBehavior::AdoptTarget);
        assert!(plan.breaks.is_empty());
        assert_eq!(plan.vacation_deduction, Decimal::ZERO);
    }

    #[test]
    fn test_break_window_requires_both_bounds() {
        let mut rule = BreakRule {
            break_type: BreakType::Fixed,
            start: Some(720),
            end: None,
            duration: 30,
            after_work_minutes: None,
            minutes_difference: false,
        };
        assert_eq!(rule.window(), None);

        rule.end = Some(750);
        assert_eq!(rule.window(), Some((720, 750)));

        rule.end = Some(700);
        assert_eq!(rule.window(), None);
    }

    #[test]
    fn test_minimal_plan_deserialization() {
        let yaml = r#"
code: standard
target:
  regular_minutes: 480
"#;
        let plan: DayPlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(plan.code, "standard");
        assert_eq!(plan.plan_type, PlanType::Fixed);
        assert_eq!(plan.tolerance, ToleranceConfig::default());
        assert_eq!(plan.vacation_deduction, Decimal::ONE);
        assert_eq!(plan.day_change_behavior, DayChangeBehavior::None);
        assert!(!plan.has_core_time());
    }

    #[test]
    fn test_full_plan_deserialization() {
        let yaml = r#"
code: flex
plan_type: flextime
come_from: 420
come_to: 540
go_from: 900
go_to: 1200
core_start: 540
core_end: 900
tolerance:
  come_minus: 15
rounding:
  come: { algorithm: up, interval: 15 }
  go: { algorithm: down, interval: 15 }
breaks:
  - break_type: minimum
    duration: 30
    after_work_minutes: 360
    minutes_difference: true
no_booking_behavior: deduct_target
day_change_behavior: auto_complete
target:
  regular_minutes: 468
  absence_day_minutes: 450
vacation_deduction: "0.5"
"#;
        let plan: DayPlan = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(plan.plan_type, PlanType::Flextime);
        assert_eq!(plan.tolerance.come_minus, 15);
        assert_eq!(plan.tolerance.come_plus, 0);
        assert_eq!(
            plan.rounding.come,
            Some(RoundingRule {
                algorithm: RoundingAlgorithm::Up,
                interval: 15
            })
        );
        assert_eq!(plan.breaks[0].break_type, BreakType::Minimum);
        assert!(plan.breaks[0].minutes_difference);
        assert_eq!(plan.no_booking_behavior, NoBookingBehavior::DeductTarget);
        assert_eq!(plan.day_change_behavior, DayChangeBehavior::AutoComplete);
        assert_eq!(plan.target.absence_day_minutes, Some(450));
        assert_eq!(plan.vacation_deduction, Decimal::new(5, 1));
        assert!(plan.has_core_time());
    }

    #[test]
    fn test_legacy_no_booking_names_map_onto_behavior() {
        let cases = [
            ("\"credit_target\"", NoBookingBehavior::AdoptTarget),
            ("\"credit_zero\"", NoBookingBehavior::DeductTarget),
            ("\"use_absence\"", NoBookingBehavior::VocationalSchool),
        ];
        for (json, expected) in cases {
            let behavior: NoBookingBehavior = serde_json::from_str(json).unwrap();
            assert_eq!(behavior, expected);
        }

        assert!(serde_json::from_str::<NoBookingBehavior>("\"skip\"").is_err());
    }

    #[test]
    fn test_no_booking_behavior_serializes_canonical_name() {
        let json = serde_json::to_string(&NoBookingBehavior::TargetWithOrder).unwrap();
        assert_eq!(json, "\"target_with_order\"");
    }
}
