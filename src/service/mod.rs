//! Services that run the engine against the collaborator stores.
//!
//! [`DailyCalcService`] calculates and persists one employee day.
//! [`RecalcService`] recalculates ranges, batches and whole tenants on top
//! of it.

mod daily_calc;
mod recalc;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::store::{
    AbsenceStore, BookingStore, DailyValueStore, DayPlanResolver, EmployeeLookup, HolidayLookup,
    InMemoryStore, OrderBookingSink,
};

pub use daily_calc::DailyCalcService;
pub use recalc::{RecalcFailure, RecalcHandle, RecalcResult, RecalcService};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The collaborators a daily calculation reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    /// Booking storage.
    pub bookings: Arc<dyn BookingStore>,
    /// Day plan resolution.
    pub plans: Arc<dyn DayPlanResolver>,
    /// Holiday calendar.
    pub holidays: Arc<dyn HolidayLookup>,
    /// Absences.
    pub absences: Arc<dyn AbsenceStore>,
    /// Employee master data.
    pub employees: Arc<dyn EmployeeLookup>,
    /// Order postings.
    pub orders: Arc<dyn OrderBookingSink>,
    /// Daily value persistence.
    pub daily_values: Arc<dyn DailyValueStore>,
}

impl Collaborators {
    /// Uses one in-memory store for every seam.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            bookings: store.clone(),
            plans: store.clone(),
            holidays: store.clone(),
            absences: store.clone(),
            employees: store.clone(),
            orders: store.clone(),
            daily_values: store,
        }
    }

    /// Replaces the day plan resolver.
    pub fn with_plans(mut self, plans: Arc<dyn DayPlanResolver>) -> Self {
        self.plans = plans;
        self
    }
}
