//! Daily aggregation.
//!
//! Selects exactly one branch per day, in priority order:
//!
//! 1. **Holiday without bookings**: credit by holiday category.
//! 2. **Absence without bookings**: credit the effective target by portion.
//! 3. **No bookings**: dispatch on the plan's [`NoBookingBehavior`].
//! 4. **Normal**: pairing, tolerance, rounding, validation, capping, gross
//!    time, break deduction, net time, minimum check and balance.
//!
//! The calculation is pure. Side effects the day requires (synthetic
//! bookings, a vocational school absence, an order posting) are returned as
//! [`DayEffect`]s for the caller to apply.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::{
    Absence, AbsenceKind, AbsencePortion, Booking, CalculationStep, DailyValue, DailyValueStatus,
    DayPlan, ErrorCode, Holiday, HolidayCategory, NoBookingBehavior, OrderPosting, WarningCode,
};

use super::breaks::calculate_break_deduction;
use super::capping::{
    CappingSource, apply_window_capping, cap_net_time, validate_core_hours, validate_time_window,
};
use super::pairing::{DayBookings, pair_bookings};
use super::rounding::apply_rounding;
use super::time_value::{TimeInterval, format_minutes};
use super::tolerance::{apply_come_tolerance, apply_go_tolerance, effective_tolerance};

/// A side effect required by a day's calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayEffect {
    /// Persist a synthetic booking, possibly dated on the next day.
    InsertBooking(Booking),
    /// Record a system absence.
    CreateAbsence(Absence),
    /// Credit time to an order account.
    PostOrderTime(OrderPosting),
}

/// The branch the aggregation took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBranch {
    /// Holiday credit without bookings.
    Holiday,
    /// Absence credit without bookings.
    Absence,
    /// No bookings on a working day.
    NoBookings,
    /// Bookings were evaluated.
    Normal,
}

impl fmt::Display for DayBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayBranch::Holiday => "holiday",
            DayBranch::Absence => "absence",
            DayBranch::NoBookings => "no_bookings",
            DayBranch::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Everything the aggregation reads for one employee and date.
#[derive(Debug, Clone, Copy)]
pub struct DayInput<'a> {
    /// The employee.
    pub employee_id: Uuid,
    /// The calculated date.
    pub date: NaiveDate,
    /// The current date; system absences are only created for earlier dates.
    pub today: NaiveDate,
    /// The effective day plan.
    pub plan: &'a DayPlan,
    /// Bookings of the date and, for day-change policies, its neighbours.
    pub bookings: &'a DayBookings,
    /// Holiday on the date, if any.
    pub holiday: Option<&'a Holiday>,
    /// Approved absence on the date, if any.
    pub absence: Option<&'a Absence>,
    /// Daily target from the employee master.
    pub employee_target: Option<i32>,
}

/// Result of calculating one day, before it is stamped into a [`DailyValue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCalculation {
    /// The branch taken.
    pub branch: DayBranch,
    /// Worked time after capping.
    pub gross_time: i32,
    /// Credited time.
    pub net_time: i32,
    /// Effective target.
    pub target_time: i32,
    /// Net above target.
    pub overtime: i32,
    /// Net below target.
    pub undertime: i32,
    /// Break time deducted.
    pub break_time: i32,
    /// First arrival as booked.
    pub first_come: Option<i32>,
    /// Last departure as booked.
    pub last_go: Option<i32>,
    /// Bookings evaluated.
    pub booking_count: u32,
    /// Hard violations.
    pub error_codes: BTreeSet<ErrorCode>,
    /// Soft notices.
    pub warnings: BTreeSet<WarningCode>,
    /// Vacation days consumed.
    pub vacation_deduction: Decimal,
    /// Side effects to apply before persisting.
    pub effects: Vec<DayEffect>,
    /// Calculated time per booking, on the booking's own date.
    pub calculated_times: Vec<(Uuid, i32)>,
    /// Step-by-step record of the calculation.
    pub trace: Vec<CalculationStep>,
}

impl DayCalculation {
    fn new(branch: DayBranch, target_time: i32) -> Self {
        Self {
            branch,
            gross_time: 0,
            net_time: 0,
            target_time,
            overtime: 0,
            undertime: 0,
            break_time: 0,
            first_come: None,
            last_go: None,
            booking_count: 0,
            error_codes: BTreeSet::new(),
            warnings: BTreeSet::new(),
            vacation_deduction: Decimal::ZERO,
            effects: Vec::new(),
            calculated_times: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// `Error` if any error code was recorded.
    pub fn status(&self) -> DailyValueStatus {
        if self.error_codes.is_empty() {
            DailyValueStatus::Calculated
        } else {
            DailyValueStatus::Error
        }
    }

    /// Flextime balance contribution of the day.
    pub fn balance(&self) -> i32 {
        self.overtime - self.undertime
    }

    /// Builds the persisted record.
    pub fn to_daily_value(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        calculation_version: u32,
        calculated_at: DateTime<Utc>,
    ) -> DailyValue {
        DailyValue {
            gross_time: self.gross_time,
            net_time: self.net_time,
            target_time: self.target_time,
            overtime: self.overtime,
            undertime: self.undertime,
            break_time: self.break_time,
            first_come: self.first_come,
            last_go: self.last_go,
            booking_count: self.booking_count,
            status: self.status(),
            error_codes: self.error_codes.clone(),
            warnings: self.warnings.clone(),
            vacation_deduction: self.vacation_deduction,
            ..DailyValue::empty(
                tenant_id,
                employee_id,
                date,
                calculation_version,
                calculated_at,
            )
        }
    }

    fn settle_against_target(&mut self) {
        self.overtime = (self.net_time - self.target_time).max(0);
        self.undertime = (self.target_time - self.net_time).max(0);
    }

    fn record(
        &mut self,
        rule_id: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: String,
    ) {
        let step_number = self.trace.len() as u32 + 1;
        self.trace.push(CalculationStep {
            step_number,
            rule_id: rule_id.to_string(),
            input,
            output,
            reasoning,
        });
    }
}

/// Resolves the target that applies to the day.
///
/// Order: the employee master when the plan defers to it, then the plan's
/// absence-day target on absence days, then the plan's regular target.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::resolve_target;
/// use attendance_engine::models::DayPlan;
///
/// let mut plan = DayPlan::new("standard", 480);
/// plan.target.absence_day_minutes = Some(420);
///
/// assert_eq!(resolve_target(&plan, Some(450), false), 480);
/// assert_eq!(resolve_target(&plan, None, true), 420);
///
/// plan.target.from_employee_master = true;
/// assert_eq!(resolve_target(&plan, Some(450), true), 450);
/// ```
pub fn resolve_target(plan: &DayPlan, employee_target: Option<i32>, is_absence_day: bool) -> i32 {
    if plan.target.from_employee_master {
        if let Some(target) = employee_target {
            return target;
        }
    }
    if is_absence_day {
        if let Some(target) = plan.target.absence_day_minutes {
            return target;
        }
    }
    plan.target.regular_minutes
}

/// Minutes a holiday credits: the plan's explicit category credit, otherwise
/// the full target, half of it, or nothing.
pub fn holiday_credit(plan: &DayPlan, category: HolidayCategory, target: i32) -> i32 {
    let credits = &plan.holiday_credits;
    match category {
        HolidayCategory::Full => credits.category_1.unwrap_or(target),
        HolidayCategory::Half => credits.category_2.unwrap_or(target / 2),
        HolidayCategory::Zero => credits.category_3.unwrap_or(0),
    }
}

/// Calculates one day.
///
/// # Example
///
/// ```
/// use attendance_engine::calculation::{calculate_day, DayBookings, DayInput};
/// use attendance_engine::models::{
///     Booking, BookingCategory, BookingDirection, BookingSource, DayPlan,
/// };
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let employee_id = Uuid::new_v4();
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let book = |direction, time| {
///     Booking::new(employee_id, date, direction, BookingCategory::Work, time, BookingSource::Terminal)
/// };
/// let plan = DayPlan::new("standard", 480);
/// let bookings = DayBookings::same_day(vec![
///     book(BookingDirection::In, 480),
///     book(BookingDirection::Out, 1020),
/// ]);
///
/// let day = calculate_day(&DayInput {
///     employee_id,
///     date,
///     today: date,
///     plan: &plan,
///     bookings: &bookings,
///     holiday: None,
///     absence: None,
///     employee_target: None,
/// });
/// assert_eq!(day.gross_time, 540);
/// assert_eq!(day.overtime, 60);
/// ```
pub fn calculate_day(input: &DayInput<'_>) -> DayCalculation {
    let target = resolve_target(input.plan, input.employee_target, input.absence.is_some());
    let has_bookings = !input.bookings.current.is_empty();

    match (has_bookings, input.holiday, input.absence) {
        (false, Some(holiday), _) => holiday_day(input.plan, holiday, target),
        (false, None, Some(absence)) => absence_day(input.plan, absence, target),
        (false, None, None) => no_booking_day(input, target),
        (true, _, _) => worked_day(input, target),
    }
}

fn holiday_day(plan: &DayPlan, holiday: &Holiday, target: i32) -> DayCalculation {
    let mut day = DayCalculation::new(DayBranch::Holiday, target);
    day.net_time = holiday_credit(plan, holiday.category, target);
    day.settle_against_target();
    day.warnings.insert(WarningCode::HolidayCredited);
    day.record(
        "holiday_credit",
        json!({ "holiday": holiday.name, "category": u8::from(holiday.category), "target": target }),
        json!({ "net_time": day.net_time }),
        format!(
            "{} ({}) credits {} of {} target minutes",
            holiday.name, holiday.category, day.net_time, target
        ),
    );
    day
}

fn absence_day(plan: &DayPlan, absence: &Absence, target: i32) -> DayCalculation {
    let mut day = DayCalculation::new(DayBranch::Absence, target);
    let credited = match absence.portion {
        AbsencePortion::Full => target,
        AbsencePortion::Half => target / 2,
    };
    if absence.kind.credits_time() {
        day.net_time = credited;
    }
    if absence.kind == AbsenceKind::Vacation {
        day.vacation_deduction = match absence.portion {
            AbsencePortion::Full => plan.vacation_deduction,
            AbsencePortion::Half => plan.vacation_deduction / Decimal::TWO,
        };
    }
    day.settle_against_target();
    day.warnings.insert(WarningCode::AbsenceCredited);
    if absence.kind == AbsenceKind::VocationalSchool && absence.system_generated {
        day.warnings.insert(WarningCode::VocationalSchoolAbsenceCreated);
    }
    day.record(
        "absence_credit",
        json!({ "kind": absence.kind, "portion": absence.portion, "target": target }),
        json!({ "net_time": day.net_time, "vacation_deduction": day.vacation_deduction.to_string() }),
        format!(
            "{:?} absence credits {} minutes",
            absence.kind, day.net_time
        ),
    );
    day
}

/// Credits a school day the way its recorded absence does on later runs.
fn vocational_school_day(input: &DayInput<'_>) -> DayCalculation {
    let absence = Absence::vocational_school(input.employee_id, input.date);
    let target = resolve_target(input.plan, input.employee_target, true);
    let mut day = absence_day(input.plan, &absence, target);
    if input.date < input.today {
        day.effects.push(DayEffect::CreateAbsence(absence));
    } else {
        day.warnings
            .remove(&WarningCode::VocationalSchoolAbsenceCreated);
    }
    day
}

fn clock_time(minutes: Option<i32>) -> String {
    minutes.map_or_else(|| "--:--".to_string(), format_minutes)
}

fn no_booking_day(input: &DayInput<'_>, target: i32) -> DayCalculation {
    let plan = input.plan;
    let mut day = DayCalculation::new(DayBranch::NoBookings, target);

    if target == 0 {
        day.record(
            "no_bookings",
            json!({ "target": 0 }),
            json!({ "net_time": 0 }),
            "no target and no bookings".to_string(),
        );
        return day;
    }

    let reasoning = match plan.no_booking_behavior {
        NoBookingBehavior::Error => {
            day.error_codes.insert(ErrorCode::NoBookings);
            "missing bookings on a working day".to_string()
        }
        NoBookingBehavior::DeductTarget => {
            day.warnings.insert(WarningCode::TargetDeducted);
            format!("{target} target minutes deducted from the balance")
        }
        NoBookingBehavior::AdoptTarget => {
            day.net_time = target;
            day.warnings.insert(WarningCode::TargetAdopted);
            format!("{target} target minutes credited as worked")
        }
        NoBookingBehavior::VocationalSchool => return vocational_school_day(input),
        NoBookingBehavior::TargetWithOrder => {
            day.net_time = target;
            match plan.order_id {
                Some(order_id) => {
                    day.effects.push(DayEffect::PostOrderTime(OrderPosting {
                        order_id,
                        employee_id: input.employee_id,
                        date: input.date,
                        minutes: target,
                    }));
                    day.warnings.insert(WarningCode::OrderTimePosted);
                    format!("{target} minutes credited and posted to order {order_id}")
                }
                None => {
                    day.warnings.insert(WarningCode::NoOrderConfigured);
                    format!("{target} minutes credited, no order configured")
                }
            }
        }
    };
    day.settle_against_target();
    day.record(
        "no_bookings",
        json!({ "behavior": plan.no_booking_behavior, "target": target }),
        json!({ "net_time": day.net_time, "balance": day.balance() }),
        reasoning,
    );
    day
}

fn worked_day(input: &DayInput<'_>, target: i32) -> DayCalculation {
    let plan = input.plan;
    let mut day = DayCalculation::new(DayBranch::Normal, target);

    let mut pairing = pair_bookings(
        input.employee_id,
        input.date,
        input.bookings,
        plan.day_change_behavior,
    );
    day.booking_count = pairing.booking_count;
    day.error_codes.append(&mut pairing.errors);
    day.warnings.append(&mut pairing.warnings);
    day.effects.extend(
        pairing
            .synthetic
            .drain(..)
            .map(DayEffect::InsertBooking),
    );
    let pairs = &mut pairing.work_pairs;
    day.first_come = pairs.first().map(|pair| pair.come.booked);
    day.last_go = pairs.last().map(|pair| pair.go.booked);
    day.record(
        "pairing",
        json!({ "bookings": day.booking_count, "day_change": plan.day_change_behavior }),
        json!({
            "work_pairs": pairs.len(),
            "break_pairs": pairing.break_pairs.len(),
            "unpaired": pairing.unpaired.len(),
        }),
        format!(
            "{} work pairs, {} unpaired bookings",
            pairs.len(),
            pairing.unpaired.len()
        ),
    );

    let tolerance = effective_tolerance(plan);
    if let Some(first) = pairs.first_mut() {
        first.come.calculated =
            apply_come_tolerance(first.come.calculated, &tolerance.tolerance, plan.come_from);
    }
    if let Some(last) = pairs.last_mut() {
        last.go.calculated =
            apply_go_tolerance(last.go.calculated, &tolerance.tolerance, plan.go_to);
    }
    let rounded = apply_rounding(pairs, &plan.rounding);
    let first_calculated = pairs.first().map(|pair| pair.come.calculated);
    let last_calculated = pairs.last().map(|pair| pair.go.calculated);
    day.record(
        "tolerance_rounding",
        json!({ "first_come": day.first_come, "last_go": day.last_go, "plan_type": plan.plan_type }),
        json!({ "first_come": first_calculated, "last_go": last_calculated, "rounded": rounded }),
        format!(
            "counted from {} to {}, {rounded} endpoints rounded",
            clock_time(first_calculated),
            clock_time(last_calculated)
        ),
    );

    if !pairs.is_empty() {
        day.error_codes
            .extend(validate_time_window(first_calculated, last_calculated, plan));
    }
    day.error_codes.extend(validate_core_hours(
        first_calculated,
        last_calculated,
        plan.core_start,
        plan.core_end,
    ));

    let mut capped_minutes = 0;
    for pair in pairs.iter_mut() {
        let capping = apply_window_capping(pair.come.calculated, pair.go.calculated, plan, &tolerance);
        for boundary in &capping.capped {
            capped_minutes += boundary.minutes();
            day.warnings.insert(match boundary.source {
                CappingSource::EarlyArrival => WarningCode::EarlyArrivalCapped,
                CappingSource::LateDeparture => WarningCode::LateDepartureCapped,
            });
        }
        pair.come.calculated = capping.come;
        pair.go.calculated = capping.go;
    }

    let work: Vec<TimeInterval> = pairs.iter().map(|pair| pair.interval()).collect();
    let manual_breaks: Vec<TimeInterval> = pairing
        .break_pairs
        .iter()
        .map(|pair| pair.interval())
        .collect();
    day.gross_time = work.iter().map(TimeInterval::duration).sum();
    let intervals: Vec<[i32; 2]> = work.iter().map(|i| [i.start, i.end]).collect();
    day.record(
        "gross_time",
        json!({ "intervals": intervals }),
        json!({ "gross_time": day.gross_time, "capped_minutes": capped_minutes }),
        format!(
            "{} gross minutes, {} minutes outside the evaluation window",
            day.gross_time, capped_minutes
        ),
    );

    let deduction = calculate_break_deduction(&work, &manual_breaks, &plan.breaks);
    day.break_time = deduction.total_minutes;
    day.warnings.extend(deduction.warnings.iter().copied());
    day.record(
        "break_deduction",
        json!({ "rules": plan.breaks.len(), "recorded": deduction.recorded_minutes }),
        json!({ "break_time": deduction.total_minutes, "applied": deduction.applied }),
        format!(
            "{} break minutes, {} booked manually",
            deduction.total_minutes, deduction.recorded_minutes
        ),
    );

    let (net_time, cut) = cap_net_time(
        (day.gross_time - day.break_time).max(0),
        plan.max_net_minutes,
    );
    day.net_time = net_time;
    if cut > 0 {
        day.warnings.insert(WarningCode::MaxNetTimeReached);
    }
    if plan.min_net_minutes.is_some_and(|min| day.net_time < min) {
        day.error_codes.insert(ErrorCode::BelowMinWorkTime);
    }

    if let Some(holiday) = input.holiday {
        // Holiday credit reduces what is still owed; work on top is overtime.
        let credit = holiday_credit(plan, holiday.category, target);
        day.target_time = (target - credit).max(0);
        day.warnings.insert(WarningCode::WorkedOnHoliday);
    }
    day.settle_against_target();
    day.record(
        "net_time",
        json!({ "gross_time": day.gross_time, "break_time": day.break_time, "target": day.target_time }),
        json!({ "net_time": day.net_time, "overtime": day.overtime, "undertime": day.undertime }),
        format!(
            "{} net minutes against a target of {}",
            day.net_time, day.target_time
        ),
    );

    day.calculated_times = pairs
        .iter()
        .chain(pairing.break_pairs.iter())
        .flat_map(|pair| {
            [
                (pair.come.booking_id, pair.come.calculated_on_booking_date()),
                (pair.go.booking_id, pair.go.calculated_on_booking_date()),
            ]
        })
        .collect();
    day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BookingCategory, BookingDirection, BookingSource, BreakRule, BreakType, DayChangeBehavior,
        PlanType,
    };

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn book(employee: Uuid, direction: BookingDirection, time: i32) -> Booking {
        Booking::new(
            employee,
            make_date("2026-03-02"),
            direction,
            BookingCategory::Work,
            time,
            BookingSource::Terminal,
        )
    }

    fn shift(employee: Uuid, come: i32, go: i32) -> DayBookings {
        DayBookings::same_day(vec![
            book(employee, BookingDirection::In, come),
            book(employee, BookingDirection::Out, go),
        ])
    }

    fn fixed_plan() -> DayPlan {
        let mut plan = DayPlan::new("fixed", 480);
        plan.come_from = Some(480);
        plan.come_to = Some(540);
        plan.go_from = Some(960);
        plan.go_to = Some(1020);
        plan
    }

    fn run(
        employee: Uuid,
        plan: &DayPlan,
        bookings: &DayBookings,
        holiday: Option<&Holiday>,
        absence: Option<&Absence>,
    ) -> DayCalculation {
        calculate_day(&DayInput {
            employee_id: employee,
            date: make_date("2026-03-02"),
            today: make_date("2026-03-10"),
            plan,
            bookings,
            holiday,
            absence,
            employee_target: None,
        })
    }

    fn holiday(category: HolidayCategory) -> Holiday {
        Holiday {
            date: make_date("2026-03-02"),
            name: "Test Day".to_string(),
            category,
        }
    }

    #[test]
    fn test_regular_day_balances_to_zero() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &shift(e, 480, 960), None, None);

        assert_eq!(day.branch, DayBranch::Normal);
        assert_eq!(day.gross_time, 480);
        assert_eq!(day.net_time, 480);
        assert_eq!(day.balance(), 0);
        assert_eq!(day.status(), DailyValueStatus::Calculated);
        assert_eq!(day.calculated_times.len(), 2);
    }

    #[test]
    fn test_late_arrival_within_tolerance_snaps() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.tolerance.come_plus = 10;

        let day = run(e, &plan, &shift(e, 485, 960), None, None);

        assert_eq!(day.first_come, Some(485));
        assert_eq!(day.gross_time, 480);
    }

    #[test]
    fn test_flextime_late_arrival_is_not_forgiven() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.plan_type = PlanType::Flextime;
        plan.tolerance.come_plus = 15;

        let day = run(e, &plan, &shift(e, 490, 960), None, None);

        assert_eq!(day.gross_time, 470);
        assert_eq!(day.undertime, 10);
    }

    #[test]
    fn test_early_arrival_is_capped_with_warning() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &shift(e, 420, 960), None, None);

        assert_eq!(day.first_come, Some(420));
        assert_eq!(day.gross_time, 480);
        assert!(day.warnings.contains(&WarningCode::EarlyArrivalCapped));
        let (_, calculated) = day.calculated_times[0];
        assert_eq!(calculated, 480);
    }

    #[test]
    fn test_trace_reports_counted_times_as_clock_times() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &shift(e, 480, 1020), None, None);

        let step = day
            .trace
            .iter()
            .find(|step| step.rule_id == "tolerance_rounding")
            .unwrap();
        assert_eq!(step.reasoning, "counted from 08:00 to 17:00, 0 endpoints rounded");
    }

    #[test]
    fn test_late_arrival_and_early_departure_are_errors() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &shift(e, 560, 900), None, None);

        assert!(day.error_codes.contains(&ErrorCode::LateCome));
        assert!(day.error_codes.contains(&ErrorCode::EarlyGo));
        assert_eq!(day.status(), DailyValueStatus::Error);
        assert_eq!(day.net_time, 340);
    }

    #[test]
    fn test_missed_core_time_is_recorded_but_day_is_calculated() {
        let e = Uuid::new_v4();
        let mut plan = DayPlan::new("flex", 480);
        plan.plan_type = PlanType::Flextime;
        plan.core_start = Some(540);
        plan.core_end = Some(900);

        let day = run(e, &plan, &shift(e, 600, 1080), None, None);

        assert_eq!(day.error_codes, BTreeSet::from([ErrorCode::MissedCoreStart]));
        assert_eq!(day.net_time, 480);
    }

    #[test]
    fn test_breaks_and_net_cap() {
        let e = Uuid::new_v4();
        let mut plan = DayPlan::new("long", 480);
        plan.max_net_minutes = Some(600);
        plan.breaks.push(BreakRule {
            break_type: BreakType::Fixed,
            start: Some(720),
            end: Some(750),
            duration: 30,
            after_work_minutes: None,
            minutes_difference: false,
        });

        let day = run(e, &plan, &shift(e, 360, 1080), None, None);

        assert_eq!(day.gross_time, 720);
        assert_eq!(day.break_time, 30);
        assert_eq!(day.net_time, 600);
        assert_eq!(day.overtime, 120);
        assert!(day.warnings.contains(&WarningCode::MaxNetTimeReached));
    }

    #[test]
    fn test_below_minimum_net_time() {
        let e = Uuid::new_v4();
        let mut plan = DayPlan::new("min", 480);
        plan.min_net_minutes = Some(240);

        let day = run(e, &plan, &shift(e, 480, 600), None, None);

        assert!(day.error_codes.contains(&ErrorCode::BelowMinWorkTime));
    }

    #[test]
    fn test_holiday_categories_credit_target_by_default() {
        let e = Uuid::new_v4();
        let plan = fixed_plan();
        let empty = DayBookings::default();

        let full = run(e, &plan, &empty, Some(&holiday(HolidayCategory::Full)), None);
        assert_eq!(full.branch, DayBranch::Holiday);
        assert_eq!(full.net_time, 480);
        assert_eq!(full.balance(), 0);

        let half = run(e, &plan, &empty, Some(&holiday(HolidayCategory::Half)), None);
        assert_eq!(half.net_time, 240);

        let zero = run(e, &plan, &empty, Some(&holiday(HolidayCategory::Zero)), None);
        assert_eq!(zero.net_time, 0);
    }

    #[test]
    fn test_explicit_holiday_credit_takes_precedence() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.holiday_credits.category_2 = Some(300);

        let day = run(
            e,
            &plan,
            &DayBookings::default(),
            Some(&holiday(HolidayCategory::Half)),
            None,
        );

        assert_eq!(day.net_time, 300);
    }

    #[test]
    fn test_work_on_full_holiday_is_overtime() {
        let e = Uuid::new_v4();
        let day = run(
            e,
            &fixed_plan(),
            &shift(e, 480, 720),
            Some(&holiday(HolidayCategory::Full)),
            None,
        );

        assert_eq!(day.branch, DayBranch::Normal);
        assert_eq!(day.target_time, 0);
        assert_eq!(day.overtime, 240);
        assert!(day.warnings.contains(&WarningCode::WorkedOnHoliday));
    }

    #[test]
    fn test_half_day_vacation_uses_absence_target() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.target.absence_day_minutes = Some(420);
        let absence = Absence {
            portion: AbsencePortion::Half,
            kind: AbsenceKind::Vacation,
            ..Absence::vocational_school(e, make_date("2026-03-02"))
        };

        let day = run(e, &plan, &DayBookings::default(), None, Some(&absence));

        assert_eq!(day.branch, DayBranch::Absence);
        assert_eq!(day.target_time, 420);
        assert_eq!(day.net_time, 210);
        assert_eq!(day.vacation_deduction, Decimal::new(5, 1));
    }

    #[test]
    fn test_no_bookings_error() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &DayBookings::default(), None, None);

        assert_eq!(day.branch, DayBranch::NoBookings);
        assert!(day.error_codes.contains(&ErrorCode::NoBookings));
        assert_eq!(day.net_time, 0);
    }

    #[test]
    fn test_no_bookings_deduct_target() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.no_booking_behavior = NoBookingBehavior::DeductTarget;

        let day = run(e, &plan, &DayBookings::default(), None, None);

        assert_eq!(day.net_time, 0);
        assert_eq!(day.status(), DailyValueStatus::Calculated);
        assert_eq!(day.balance(), -480);
    }

    #[test]
    fn test_vocational_school_creates_absence_for_past_dates_only() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.no_booking_behavior = NoBookingBehavior::VocationalSchool;
        let bookings = DayBookings::default();

        let past = run(e, &plan, &bookings, None, None);
        assert_eq!(past.net_time, 480);
        assert!(matches!(past.effects[..], [DayEffect::CreateAbsence(_)]));
        assert!(past.warnings.contains(&WarningCode::VocationalSchoolAbsenceCreated));

        let future = calculate_day(&DayInput {
            employee_id: e,
            date: make_date("2026-03-02"),
            today: make_date("2026-03-02"),
            plan: &plan,
            bookings: &bookings,
            holiday: None,
            absence: None,
            employee_target: None,
        });
        assert_eq!(future.net_time, 480);
        assert!(future.effects.is_empty());
        assert!(!future.warnings.contains(&WarningCode::VocationalSchoolAbsenceCreated));
    }

    #[test]
    fn test_vocational_school_rerun_matches_first_run() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.no_booking_behavior = NoBookingBehavior::VocationalSchool;
        plan.target.absence_day_minutes = Some(420);
        let bookings = DayBookings::default();

        let first = run(e, &plan, &bookings, None, None);
        let created = match &first.effects[..] {
            [DayEffect::CreateAbsence(absence)] => absence.clone(),
            other => panic!("expected one created absence, got {other:?}"),
        };
        let rerun = run(e, &plan, &bookings, None, Some(&created));

        assert_eq!(first.branch, DayBranch::Absence);
        assert_eq!(first.target_time, 420);
        assert_eq!(first.net_time, 420);
        assert_eq!(rerun.target_time, first.target_time);
        assert_eq!(rerun.net_time, first.net_time);
        assert_eq!(rerun.warnings, first.warnings);
        assert!(rerun.effects.is_empty());
    }

    #[test]
    fn test_target_with_order_posts_credit() {
        let e = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.no_booking_behavior = NoBookingBehavior::TargetWithOrder;
        plan.order_id = Some(order_id);

        let day = run(e, &plan, &DayBookings::default(), None, None);

        assert_eq!(day.net_time, 480);
        assert_eq!(
            day.effects,
            vec![DayEffect::PostOrderTime(OrderPosting {
                order_id,
                employee_id: e,
                date: make_date("2026-03-02"),
                minutes: 480,
            })]
        );
    }

    #[test]
    fn test_off_day_without_bookings_is_quiet() {
        let e = Uuid::new_v4();
        let day = run(e, &DayPlan::off_day(), &DayBookings::default(), None, None);

        assert_eq!(day.net_time, 0);
        assert!(day.warnings.is_empty());
        assert!(day.error_codes.is_empty());
    }

    #[test]
    fn test_employee_master_target() {
        let e = Uuid::new_v4();
        let mut plan = fixed_plan();
        plan.target.from_employee_master = true;
        let bookings = shift(e, 480, 960);

        let day = calculate_day(&DayInput {
            employee_id: e,
            date: make_date("2026-03-02"),
            today: make_date("2026-03-10"),
            plan: &plan,
            bookings: &bookings,
            holiday: None,
            absence: None,
            employee_target: Some(420),
        });

        assert_eq!(day.target_time, 420);
        assert_eq!(day.overtime, 60);
    }

    #[test]
    fn test_auto_complete_returns_synthetic_bookings_as_effects() {
        let e = Uuid::new_v4();
        let mut plan = DayPlan::new("night", 240);
        plan.day_change_behavior = DayChangeBehavior::AutoComplete;
        let bookings = DayBookings {
            previous: vec![],
            current: vec![book(e, BookingDirection::In, 1320)],
            next: vec![Booking::new(
                e,
                make_date("2026-03-03"),
                BookingDirection::Out,
                BookingCategory::Work,
                120,
                BookingSource::Terminal,
            )],
        };

        let day = run(e, &plan, &bookings, None, None);

        assert_eq!(day.net_time, 120);
        assert_eq!(day.effects.len(), 2);
        assert!(day.error_codes.is_empty());
    }

    #[test]
    fn test_trace_steps_are_numbered() {
        let e = Uuid::new_v4();
        let day = run(e, &fixed_plan(), &shift(e, 480, 960), None, None);

        let numbers: Vec<u32> = day.trace.iter().map(|step| step.step_number).collect();
        assert_eq!(numbers, (1..=day.trace.len() as u32).collect::<Vec<_>>());
        assert_eq!(day.trace[0].rule_id, "pairing");
    }
}
