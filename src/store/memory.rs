//! In-memory implementation of every collaborator seam.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Absence, Booking, DailyValue, DayPlan, Employee, Holiday, OrderPosting};

use super::{
    AbsenceStore, BookingStore, DailyValueStore, DayPlanResolver, EmployeeLookup, HolidayLookup,
    OrderBookingSink, PlanResolution,
};

/// A lookup or write that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// Booking reads, keyed by employee.
    Bookings,
    /// Day plan resolution, keyed by employee.
    DayPlan,
    /// Holiday lookups, keyed by tenant.
    Holiday,
    /// Absence reads, keyed by employee.
    Absence,
    /// Employee listing, keyed by tenant.
    Employees,
    /// Daily value upserts, keyed by employee.
    Upsert,
}

impl FailurePoint {
    fn collaborator(&self) -> &'static str {
        match self {
            FailurePoint::Bookings => "booking store",
            FailurePoint::DayPlan => "day plan resolver",
            FailurePoint::Holiday => "holiday lookup",
            FailurePoint::Absence => "absence store",
            FailurePoint::Employees => "employee lookup",
            FailurePoint::Upsert => "daily value store",
        }
    }
}

type DayKey = (Uuid, NaiveDate);

/// Thread-safe store backed by hash maps.
///
/// Day plans resolve from a per-date assignment first, then from the
/// employee's default plan.
///
/// # Example
///
/// ```
/// use attendance_engine::models::DayPlan;
/// use attendance_engine::store::{DayPlanResolver, InMemoryStore, PlanResolution};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let store = InMemoryStore::new();
/// let employee_id = Uuid::new_v4();
/// store.set_default_plan(employee_id, DayPlan::new("standard", 480));
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let resolved = store.resolve(Uuid::nil(), employee_id, date).unwrap();
/// assert!(matches!(resolved, Some(PlanResolution::Working(_))));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    bookings: RwLock<HashMap<DayKey, Vec<Booking>>>,
    default_plans: RwLock<HashMap<Uuid, DayPlan>>,
    dated_plans: RwLock<HashMap<DayKey, PlanResolution>>,
    holidays: RwLock<HashMap<DayKey, Holiday>>,
    absences: RwLock<HashMap<DayKey, Absence>>,
    employees: RwLock<HashMap<Uuid, Employee>>,
    order_postings: RwLock<HashMap<(Uuid, Uuid, NaiveDate), OrderPosting>>,
    daily_values: RwLock<HashMap<DayKey, DailyValue>>,
    upsert_log: Mutex<Vec<DayKey>>,
    upserts: AtomicUsize,
    failures: RwLock<HashSet<(FailurePoint, Uuid)>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, point: FailurePoint, key: Uuid) -> EngineResult<()> {
        let failures = self.failures.read().unwrap_or_else(PoisonError::into_inner);
        if failures.contains(&(point, key)) {
            return Err(EngineError::dependency(
                point.collaborator(),
                format!("injected failure for {key}"),
            ));
        }
        Ok(())
    }

    /// Makes `point` fail for the given employee (or tenant, for holiday and
    /// employee listings).
    pub fn inject_failure(&self, point: FailurePoint, key: Uuid) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((point, key));
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        self.failures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Adds a booking under its own employee and date.
    pub fn add_booking(&self, booking: Booking) {
        self.bookings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((booking.employee_id, booking.date))
            .or_default()
            .push(booking);
    }

    /// Every stored booking of an employee on a date.
    pub fn bookings(&self, employee_id: Uuid, date: NaiveDate) -> Vec<Booking> {
        self.bookings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(employee_id, date))
            .cloned()
            .unwrap_or_default()
    }

    /// Plan used for every date without an explicit assignment.
    pub fn set_default_plan(&self, employee_id: Uuid, plan: DayPlan) {
        self.default_plans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee_id, plan);
    }

    /// Assigns a plan (or an off day) to a single date.
    pub fn set_plan_for_date(&self, employee_id: Uuid, date: NaiveDate, resolution: PlanResolution) {
        self.dated_plans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((employee_id, date), resolution);
    }

    /// Adds a tenant holiday.
    pub fn add_holiday(&self, tenant_id: Uuid, holiday: Holiday) {
        self.holidays
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((tenant_id, holiday.date), holiday);
    }

    /// Adds an approved absence.
    pub fn add_absence(&self, absence: Absence) {
        self.absences
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((absence.employee_id, absence.date), absence);
    }

    /// Adds or replaces an employee.
    pub fn add_employee(&self, employee: Employee) {
        self.employees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(employee.id, employee);
    }

    /// All order postings, sorted by date.
    pub fn order_postings(&self) -> Vec<OrderPosting> {
        let mut postings: Vec<OrderPosting> = self
            .order_postings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        postings.sort_by_key(|posting| (posting.date, posting.employee_id));
        postings
    }

    /// Number of upserts performed so far.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Dates upserted for an employee, in the order they were written.
    pub fn upserted_dates(&self, employee_id: Uuid) -> Vec<NaiveDate> {
        self.upsert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(employee, _)| *employee == employee_id)
            .map(|(_, date)| *date)
            .collect()
    }
}

impl BookingStore for InMemoryStore {
    fn bookings_for_date(&self, employee_id: Uuid, date: NaiveDate) -> EngineResult<Vec<Booking>> {
        self.check(FailurePoint::Bookings, employee_id)?;
        Ok(self.bookings(employee_id, date))
    }

    fn insert_booking(&self, booking: Booking) -> EngineResult<()> {
        self.add_booking(booking);
        Ok(())
    }

    fn set_calculated_times(&self, times: &[(Uuid, i32)]) -> EngineResult<()> {
        let calculated: HashMap<Uuid, i32> = times.iter().copied().collect();
        let mut bookings = self.bookings.write().unwrap_or_else(PoisonError::into_inner);
        for booking in bookings.values_mut().flatten() {
            if let Some(time) = calculated.get(&booking.id) {
                booking.calculated_time = Some(*time);
            }
        }
        Ok(())
    }
}

impl DayPlanResolver for InMemoryStore {
    fn resolve(
        &self,
        _tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<PlanResolution>> {
        self.check(FailurePoint::DayPlan, employee_id)?;
        let dated = self
            .dated_plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(employee_id, date))
            .cloned();
        if dated.is_some() {
            return Ok(dated);
        }
        Ok(self
            .default_plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&employee_id)
            .cloned()
            .map(PlanResolution::Working))
    }
}

impl HolidayLookup for InMemoryStore {
    fn holiday_for_date(&self, tenant_id: Uuid, date: NaiveDate) -> EngineResult<Option<Holiday>> {
        self.check(FailurePoint::Holiday, tenant_id)?;
        Ok(self
            .holidays
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(tenant_id, date))
            .cloned())
    }
}

impl AbsenceStore for InMemoryStore {
    fn absence_for_date(
        &self,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<Absence>> {
        self.check(FailurePoint::Absence, employee_id)?;
        Ok(self
            .absences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(employee_id, date))
            .cloned())
    }

    fn create_absence(&self, absence: Absence) -> EngineResult<()> {
        self.absences
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((absence.employee_id, absence.date))
            .or_insert(absence);
        Ok(())
    }
}

impl EmployeeLookup for InMemoryStore {
    fn employee(&self, employee_id: Uuid) -> EngineResult<Option<Employee>> {
        Ok(self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&employee_id)
            .cloned())
    }

    fn employees_for_tenant(&self, tenant_id: Uuid) -> EngineResult<Vec<Employee>> {
        self.check(FailurePoint::Employees, tenant_id)?;
        let mut employees: Vec<Employee> = self
            .employees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|employee| employee.tenant_id == tenant_id)
            .cloned()
            .collect();
        employees.sort_by_key(|employee| employee.id);
        Ok(employees)
    }
}

impl OrderBookingSink for InMemoryStore {
    fn post_order_time(&self, posting: &OrderPosting) -> EngineResult<()> {
        self.order_postings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                (posting.order_id, posting.employee_id, posting.date),
                posting.clone(),
            );
        Ok(())
    }
}

impl DailyValueStore for InMemoryStore {
    fn upsert(&self, value: DailyValue) -> EngineResult<()> {
        self.check(FailurePoint::Upsert, value.employee_id)?;
        let key = (value.employee_id, value.date);
        self.daily_values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
        self.upsert_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key);
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn get(&self, employee_id: Uuid, date: NaiveDate) -> EngineResult<Option<DailyValue>> {
        Ok(self
            .daily_values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(employee_id, date))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingCategory, BookingDirection, BookingSource};

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_dated_plan_overrides_default() {
        let store = InMemoryStore::new();
        let employee = Uuid::new_v4();
        let date = make_date("2026-03-07");
        store.set_default_plan(employee, DayPlan::new("standard", 480));
        store.set_plan_for_date(employee, date, PlanResolution::OffDay);

        assert_eq!(
            store.resolve(Uuid::nil(), employee, date).unwrap(),
            Some(PlanResolution::OffDay)
        );
        assert!(matches!(
            store.resolve(Uuid::nil(), employee, make_date("2026-03-06")).unwrap(),
            Some(PlanResolution::Working(_))
        ));
        assert_eq!(store.resolve(Uuid::nil(), Uuid::new_v4(), date).unwrap(), None);
    }

    #[test]
    fn test_injected_failure_is_a_dependency_error() {
        let store = InMemoryStore::new();
        let employee = Uuid::new_v4();
        store.inject_failure(FailurePoint::Bookings, employee);

        let result = store.bookings_for_date(employee, make_date("2026-03-02"));
        match result {
            Err(EngineError::Dependency { collaborator, .. }) => {
                assert_eq!(collaborator, "booking store");
            }
            other => panic!("Expected Dependency error, got {other:?}"),
        }

        store.clear_failures();
        assert!(store.bookings_for_date(employee, make_date("2026-03-02")).is_ok());
    }

    #[test]
    fn test_calculated_times_leave_original_untouched() {
        let store = InMemoryStore::new();
        let employee = Uuid::new_v4();
        let date = make_date("2026-03-02");
        let booking = Booking::new(
            employee,
            date,
            BookingDirection::In,
            BookingCategory::Work,
            472,
            BookingSource::Terminal,
        );
        let id = booking.id;
        store.add_booking(booking);

        store.set_calculated_times(&[(id, 480)]).unwrap();

        let stored = &store.bookings(employee, date)[0];
        assert_eq!(stored.original_time, 472);
        assert_eq!(stored.edited_time, 472);
        assert_eq!(stored.calculated_time, Some(480));
    }

    #[test]
    fn test_create_absence_keeps_existing() {
        let store = InMemoryStore::new();
        let employee = Uuid::new_v4();
        let date = make_date("2026-03-02");
        let first = Absence::vocational_school(employee, date);
        let first_id = first.id;

        store.create_absence(first).unwrap();
        store
            .create_absence(Absence::vocational_school(employee, date))
            .unwrap();

        assert_eq!(
            store.absence_for_date(employee, date).unwrap().map(|a| a.id),
            Some(first_id)
        );
    }
}
