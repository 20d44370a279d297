//! Daily calculation service.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::calculation::{DayBookings, DayCalculation, DayEffect, DayInput, calculate_day};
use crate::config::EngineSettings;
use crate::error::{EngineError, EngineResult};
use crate::models::{DailyValue, DayChangeBehavior, DayPlan};
use crate::store::PlanResolution;

use super::{Clock, Collaborators, SystemClock};

/// Calculates and persists the daily value of one employee on one date.
///
/// Every call performs the lookups, runs the pure calculation, applies its
/// effects, records calculated booking times and upserts exactly one
/// [`DailyValue`]. A failed lookup or write aborts before the upsert.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use attendance_engine::config::EngineSettings;
/// use attendance_engine::models::{
///     Booking, BookingCategory, BookingDirection, BookingSource, DayPlan,
/// };
/// use attendance_engine::service::{Collaborators, DailyCalcService};
/// use attendance_engine::store::InMemoryStore;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let store = Arc::new(InMemoryStore::new());
/// let (tenant_id, employee_id) = (Uuid::new_v4(), Uuid::new_v4());
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// store.set_default_plan(employee_id, DayPlan::new("standard", 480));
/// for (direction, time) in [(BookingDirection::In, 480), (BookingDirection::Out, 1020)] {
///     store.add_booking(Booking::new(
///         employee_id, date, direction, BookingCategory::Work, time, BookingSource::Terminal,
///     ));
/// }
///
/// let service = DailyCalcService::new(
///     Collaborators::in_memory(store.clone()),
///     &EngineSettings::default(),
/// );
/// let value = service.calculate_day(tenant_id, employee_id, date)?;
/// assert_eq!(value.net_time, 540);
/// assert_eq!(store.upsert_count(), 1);
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Clone)]
pub struct DailyCalcService {
    collaborators: Collaborators,
    calculation_version: u32,
    clock: Arc<dyn Clock>,
}

impl DailyCalcService {
    /// Creates a service using the system clock.
    pub fn new(collaborators: Collaborators, settings: &EngineSettings) -> Self {
        Self {
            collaborators,
            calculation_version: settings.calculation_version,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for `calculated_at` and for deciding which
    /// dates lie in the past.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The collaborators this service works against.
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Calculates the day and upserts its value.
    ///
    /// Effects the day requires (synthetic bookings, a vocational school
    /// absence, an order posting) are applied and calculated booking times
    /// are written back before the single upsert.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant used for holiday and plan lookups
    /// * `employee_id` - Employee whose bookings are calculated
    /// * `date` - The day to calculate
    ///
    /// # Returns
    ///
    /// The stored [`DailyValue`], or an error if:
    /// - No day plan is assigned for a working day (`Configuration`)
    /// - A collaborator read or write fails (`Dependency`)
    pub fn calculate_day(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<DailyValue> {
        self.calculate_and_store(tenant_id, employee_id, date)
            .inspect_err(|error| {
                warn!(
                    tenant_id = %tenant_id,
                    employee_id = %employee_id,
                    date = %date,
                    error = %error,
                    "Daily calculation failed"
                );
            })
    }

    /// Runs the calculation without applying effects or persisting anything.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant used for holiday and plan lookups
    /// * `employee_id` - Employee whose bookings are calculated
    /// * `date` - The day to calculate
    ///
    /// # Returns
    ///
    /// The calculation with its step trace and the effects a real run would
    /// apply.
    pub fn preview_day(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<DayCalculation> {
        let plan = self.resolve_plan(tenant_id, employee_id, date)?;
        self.evaluate(tenant_id, employee_id, date, &plan)
    }

    fn calculate_and_store(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<DailyValue> {
        let plan = self.resolve_plan(tenant_id, employee_id, date)?;
        let calculation = self.evaluate(tenant_id, employee_id, date, &plan)?;
        debug!(
            employee_id = %employee_id,
            date = %date,
            plan = %plan.code,
            branch = %calculation.branch,
            "Day calculated"
        );

        for effect in &calculation.effects {
            self.apply_effect(effect)?;
        }
        if !calculation.calculated_times.is_empty() {
            self.collaborators
                .bookings
                .set_calculated_times(&calculation.calculated_times)?;
        }

        let value = calculation.to_daily_value(
            tenant_id,
            employee_id,
            date,
            self.calculation_version,
            self.clock.now(),
        );
        self.collaborators.daily_values.upsert(value.clone())?;
        info!(
            employee_id = %employee_id,
            date = %date,
            net_time = value.net_time,
            balance = value.balance(),
            status = ?value.status,
            "Daily value stored"
        );
        Ok(value)
    }

    fn resolve_plan(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<DayPlan> {
        match self
            .collaborators
            .plans
            .resolve(tenant_id, employee_id, date)?
        {
            Some(PlanResolution::Working(plan)) => Ok(plan),
            Some(PlanResolution::OffDay) => Ok(DayPlan::off_day()),
            None => Err(EngineError::Configuration {
                employee_id,
                date,
                message: "no day plan assigned".to_string(),
            }),
        }
    }

    fn evaluate(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        plan: &DayPlan,
    ) -> EngineResult<DayCalculation> {
        let collaborators = &self.collaborators;
        let holiday = collaborators.holidays.holiday_for_date(tenant_id, date)?;
        let absence = collaborators.absences.absence_for_date(employee_id, date)?;
        let employee_target = if plan.target.from_employee_master {
            collaborators
                .employees
                .employee(employee_id)?
                .and_then(|employee| employee.daily_target_minutes)
        } else {
            None
        };
        let bookings = self.day_bookings(employee_id, date, plan.day_change_behavior)?;

        Ok(calculate_day(&DayInput {
            employee_id,
            date,
            today: self.clock.now().date_naive(),
            plan,
            bookings: &bookings,
            holiday: holiday.as_ref(),
            absence: absence.as_ref(),
            employee_target,
        }))
    }

    /// Reads the date's bookings, and its neighbours' when the day-change
    /// policy can attribute bookings across midnight.
    fn day_bookings(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
        policy: DayChangeBehavior,
    ) -> EngineResult<DayBookings> {
        let store = &self.collaborators.bookings;
        let current = store.bookings_for_date(employee_id, date)?;
        if policy == DayChangeBehavior::None {
            return Ok(DayBookings::same_day(current));
        }

        let previous = match date.pred_opt() {
            Some(previous) => store.bookings_for_date(employee_id, previous)?,
            None => Vec::new(),
        };
        let next = match date.succ_opt() {
            Some(next) => store.bookings_for_date(employee_id, next)?,
            None => Vec::new(),
        };
        Ok(DayBookings {
            previous,
            current,
            next,
        })
    }

    fn apply_effect(&self, effect: &DayEffect) -> EngineResult<()> {
        match effect {
            DayEffect::InsertBooking(booking) => {
                debug!(
                    employee_id = %booking.employee_id,
                    date = %booking.date,
                    time = booking.original_time,
                    "Inserting day-change booking"
                );
                self.collaborators.bookings.insert_booking(booking.clone())
            }
            DayEffect::CreateAbsence(absence) => {
                info!(
                    employee_id = %absence.employee_id,
                    date = %absence.date,
                    "Creating vocational school absence"
                );
                self.collaborators.absences.create_absence(absence.clone())
            }
            DayEffect::PostOrderTime(posting) => {
                self.collaborators.orders.post_order_time(posting)
            }
        }
    }
}
