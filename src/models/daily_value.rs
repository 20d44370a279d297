//! Daily value model: the single calculated record per employee and date.
//!
//! Codes are kept in ordered sets so that recalculating unchanged inputs
//! produces an identical value (apart from `calculated_at`).

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome status of a daily calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyValueStatus {
    /// Calculated without rule violations.
    Calculated,
    /// Calculated, but at least one error code needs attention.
    Error,
}

/// Hard rule violations recorded on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A departure without a matching arrival.
    MissingCome,
    /// An arrival without a matching departure.
    MissingGo,
    /// First arrival after the latest allowed arrival.
    LateCome,
    /// Last departure before the earliest allowed departure.
    EarlyGo,
    /// Presence did not cover the start of core time.
    MissedCoreStart,
    /// Presence did not cover the end of core time.
    MissedCoreEnd,
    /// Net time below the plan's minimum.
    BelowMinWorkTime,
    /// A working day without bookings where the plan treats that as an error.
    NoBookings,
}

/// Informational notices recorded on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// An arrival before the evaluation window was capped.
    EarlyArrivalCapped,
    /// A departure after the evaluation window was capped.
    LateDepartureCapped,
    /// Net time was capped at the plan's maximum.
    MaxNetTimeReached,
    /// A work interval crosses midnight.
    CrossMidnight,
    /// A booking was attributed to the adjacent day by the day-change policy.
    AttributedToAdjacentDay,
    /// Synthetic midnight bookings were created.
    DayChangeAutoCompleted,
    /// A variable break was deducted automatically.
    AutoBreakApplied,
    /// A minimum break shortfall was deducted.
    MinimumBreakApplied,
    /// A holiday credit was applied.
    HolidayCredited,
    /// Bookings exist on a holiday.
    WorkedOnHoliday,
    /// An absence credited target time.
    AbsenceCredited,
    /// The target was deducted because no bookings exist.
    TargetDeducted,
    /// The target was adopted because no bookings exist.
    TargetAdopted,
    /// A vocational school absence was created.
    VocationalSchoolAbsenceCreated,
    /// Credited time was posted to an order account.
    OrderTimePosted,
    /// Target-with-order was configured without an order account.
    NoOrderConfigured,
}

/// A single step in the calculation trace.
///
/// Each step captures the input, output and reasoning of one engine stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Identifier of the stage (e.g. "tolerance").
    pub rule_id: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The calculated record for one employee and date.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{DailyValue, DailyValueStatus};
/// use chrono::{NaiveDate, Utc};
/// use uuid::Uuid;
///
/// let mut value = DailyValue::empty(
///     Uuid::new_v4(),
///     Uuid::new_v4(),
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     1,
///     Utc::now(),
/// );
/// value.target_time = 480;
/// value.undertime = 480;
/// assert_eq!(value.balance(), -480);
/// assert_eq!(value.status, DailyValueStatus::Calculated);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyValue {
    /// The tenant the employee belongs to.
    pub tenant_id: Uuid,
    /// The employee.
    pub employee_id: Uuid,
    /// The calculated date.
    pub date: NaiveDate,
    /// Time between arrivals and departures after capping.
    pub gross_time: i32,
    /// Credited time after break deduction.
    pub net_time: i32,
    /// Effective target time.
    pub target_time: i32,
    /// Net time above target.
    pub overtime: i32,
    /// Net time below target.
    pub undertime: i32,
    /// Deducted and recorded break time.
    pub break_time: i32,
    /// First arrival as booked, for display.
    pub first_come: Option<i32>,
    /// Last departure as booked, for display.
    pub last_go: Option<i32>,
    /// Number of bookings evaluated.
    pub booking_count: u32,
    /// Calculated or error.
    pub status: DailyValueStatus,
    /// Hard violations.
    pub error_codes: BTreeSet<ErrorCode>,
    /// Soft notices.
    pub warnings: BTreeSet<WarningCode>,
    /// Vacation days consumed.
    pub vacation_deduction: Decimal,
    /// Version of the calculation rules that produced this value.
    pub calculation_version: u32,
    /// When the value was calculated.
    pub calculated_at: DateTime<Utc>,
}

impl DailyValue {
    /// Creates an all-zero value with status [`DailyValueStatus::Calculated`].
    pub fn empty(
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        calculation_version: u32,
        calculated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            employee_id,
            date,
            gross_time: 0,
            net_time: 0,
            target_time: 0,
            overtime: 0,
            undertime: 0,
            break_time: 0,
            first_come: None,
            last_go: None,
            booking_count: 0,
            status: DailyValueStatus::Calculated,
            error_codes: BTreeSet::new(),
            warnings: BTreeSet::new(),
            vacation_deduction: Decimal::ZERO,
            calculation_version,
            calculated_at,
        }
    }

    /// Flextime balance contribution of the day: overtime minus undertime.
    pub fn balance(&self) -> i32 {
        self.overtime - self.undertime
    }

    /// Returns true if the day carries any error code.
    pub fn has_errors(&self) -> bool {
        !self.error_codes.is_empty()
    }

    /// Net time in hours.
    pub fn net_hours(&self) -> Decimal {
        Decimal::from(self.net_time) / Decimal::from(60)
    }
}

/// Time credited to an order (cost) account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPosting {
    /// The order account.
    pub order_id: Uuid,
    /// The employee whose time is posted.
    pub employee_id: Uuid,
    /// The date the time belongs to.
    pub date: NaiveDate,
    /// Credited minutes.
    pub minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_value() -> DailyValue {
        DailyValue::empty(
            Uuid::nil(),
            Uuid::nil(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            3,
            DateTime::parse_from_rfc3339("2026-03-03T06:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        )
    }

    #[test]
    fn test_balance_is_overtime_minus_undertime() {
        let mut value = sample_value();
        value.overtime = 45;
        assert_eq!(value.balance(), 45);

        value.overtime = 0;
        value.undertime = 30;
        assert_eq!(value.balance(), -30);
    }

    #[test]
    fn test_net_hours_converts_minutes() {
        let mut value = sample_value();
        value.net_time = 450;
        assert_eq!(value.net_hours(), Decimal::new(75, 1));
    }

    #[test]
    fn test_codes_serialize_in_stable_order() {
        let mut value = sample_value();
        value.error_codes.insert(ErrorCode::MissedCoreEnd);
        value.error_codes.insert(ErrorCode::MissingCome);
        value.warnings.insert(WarningCode::MaxNetTimeReached);
        value.warnings.insert(WarningCode::EarlyArrivalCapped);

        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("\"error_codes\":[\"MISSING_COME\",\"MISSED_CORE_END\"]"));
        assert!(json.contains("\"warnings\":[\"EARLY_ARRIVAL_CAPPED\",\"MAX_NET_TIME_REACHED\"]"));
        assert!(value.has_errors());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DailyValueStatus::Error).unwrap();
        assert_eq!(json, "\"error\"");
    }
}
