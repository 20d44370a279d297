//! Collaborator seams.
//!
//! The engine reads bookings, day plans, holidays, absences and employee
//! records from stores owned by other subsystems, and writes daily values,
//! synthetic bookings, system absences and order postings back. Each
//! collaborator is a narrow trait so callers can plug in their own storage.

mod memory;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{Absence, Booking, DailyValue, DayPlan, Employee, Holiday, OrderPosting};

pub use memory::{FailurePoint, InMemoryStore};

/// How a date resolves for an employee.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanResolution {
    /// A working day with its effective plan.
    Working(DayPlan),
    /// A day without a plan assignment.
    OffDay,
}

/// Booking storage.
pub trait BookingStore: Send + Sync {
    /// All bookings of an employee on a date, in any order.
    fn bookings_for_date(&self, employee_id: Uuid, date: NaiveDate) -> EngineResult<Vec<Booking>>;

    /// Stores a system-generated booking.
    fn insert_booking(&self, booking: Booking) -> EngineResult<()>;

    /// Records calculated times by booking id. Original and edited times are
    /// left untouched.
    fn set_calculated_times(&self, times: &[(Uuid, i32)]) -> EngineResult<()>;
}

/// Resolves the effective day plan.
pub trait DayPlanResolver: Send + Sync {
    /// `None` when no plan can be resolved for a working day.
    fn resolve(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<PlanResolution>>;
}

/// Holiday calendar.
pub trait HolidayLookup: Send + Sync {
    /// The tenant's holiday on `date`, if any.
    fn holiday_for_date(&self, tenant_id: Uuid, date: NaiveDate) -> EngineResult<Option<Holiday>>;
}

/// Approved absences.
pub trait AbsenceStore: Send + Sync {
    /// The employee's absence on `date`, if any.
    fn absence_for_date(&self, employee_id: Uuid, date: NaiveDate)
    -> EngineResult<Option<Absence>>;

    /// Records a system absence.
    fn create_absence(&self, absence: Absence) -> EngineResult<()>;
}

/// Employee master data.
pub trait EmployeeLookup: Send + Sync {
    /// A single employee.
    fn employee(&self, employee_id: Uuid) -> EngineResult<Option<Employee>>;

    /// All employees of a tenant.
    fn employees_for_tenant(&self, tenant_id: Uuid) -> EngineResult<Vec<Employee>>;
}

/// Order (cost account) postings.
pub trait OrderBookingSink: Send + Sync {
    /// Posts credited time. Posting the same order, employee and date again
    /// replaces the earlier posting.
    fn post_order_time(&self, posting: &OrderPosting) -> EngineResult<()>;
}

/// Persisted daily values.
pub trait DailyValueStore: Send + Sync {
    /// Inserts or replaces the value for its employee and date.
    fn upsert(&self, value: DailyValue) -> EngineResult<()>;

    /// The stored value for an employee and date.
    fn get(&self, employee_id: Uuid, date: NaiveDate) -> EngineResult<Option<DailyValue>>;
}
