//! Recalculation orchestration over dates, employees and tenants.
//!
//! One employee's range is processed sequentially in ascending date order
//! and stops at its first failing day. Employees are independent: a batch
//! distributes them over a bounded pool and reports failures per employee
//! instead of aborting. A day whose calculation panics counts as a failed
//! day like any other error.

use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RecalcSettings;
use crate::error::{EngineError, EngineResult};
use crate::store::EmployeeLookup;

use super::daily_calc::DailyCalcService;

/// A day that could not be recalculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalcFailure {
    /// Employee whose range stopped.
    pub employee_id: Uuid,
    /// The failing date.
    pub date: NaiveDate,
    /// Error description.
    pub message: String,
}

/// Outcome of a recalculation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecalcResult {
    /// Days calculated and stored.
    pub processed_days: usize,
    /// Days whose calculation failed.
    pub failed_days: usize,
    /// Days not attempted because an earlier day of the same range failed.
    pub skipped_days: usize,
    /// One entry per failed day.
    pub errors: Vec<RecalcFailure>,
    /// True when cancellation stopped employees from being scheduled.
    pub cancelled: bool,
}

impl RecalcResult {
    /// Returns true when every attempted day succeeded and nothing was
    /// cancelled.
    pub fn is_complete(&self) -> bool {
        self.failed_days == 0 && self.skipped_days == 0 && !self.cancelled
    }

    fn merge(&mut self, other: RecalcResult) {
        self.processed_days += other.processed_days;
        self.failed_days += other.failed_days;
        self.skipped_days += other.skipped_days;
        self.errors.extend(other.errors);
        self.cancelled |= other.cancelled;
    }
}

/// A recalculation running on the Tokio runtime.
///
/// Cancelling stops further employees from being scheduled. Employee ranges
/// already in flight run to completion and are included in the result.
#[derive(Debug)]
pub struct RecalcHandle {
    handle: JoinHandle<EngineResult<RecalcResult>>,
    cancel: CancellationToken,
}

impl RecalcHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once the job has finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the job and returns its result.
    pub async fn wait(self) -> EngineResult<RecalcResult> {
        self.handle.await.map_err(task_failed)?
    }
}

/// Drives [`DailyCalcService`] over date ranges and employee sets.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use attendance_engine::config::EngineSettings;
/// use attendance_engine::models::{DayPlan, NoBookingBehavior};
/// use attendance_engine::service::{Collaborators, DailyCalcService, RecalcService};
/// use attendance_engine::store::InMemoryStore;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let store = Arc::new(InMemoryStore::new());
/// let employee_id = Uuid::new_v4();
/// let mut plan = DayPlan::new("standard", 480);
/// plan.no_booking_behavior = NoBookingBehavior::DeductTarget;
/// store.set_default_plan(employee_id, plan);
///
/// let settings = EngineSettings::default();
/// let daily = DailyCalcService::new(Collaborators::in_memory(store.clone()), &settings);
/// let recalc = RecalcService::new(daily, store.clone(), &settings.recalc);
///
/// let from = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let to = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
/// let result = recalc.trigger_recalc_range(Uuid::nil(), employee_id, from, to)?;
/// assert_eq!(result.processed_days, 5);
/// assert_eq!(store.upserted_dates(employee_id).first(), Some(&from));
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Clone)]
pub struct RecalcService {
    daily: DailyCalcService,
    employees: Arc<dyn EmployeeLookup>,
    max_concurrency: usize,
}

impl RecalcService {
    /// Creates an orchestrator.
    pub fn new(
        daily: DailyCalcService,
        employees: Arc<dyn EmployeeLookup>,
        settings: &RecalcSettings,
    ) -> Self {
        Self {
            daily,
            employees,
            max_concurrency: settings.max_concurrency.max(1),
        }
    }

    /// Recalculates a single day.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant used for holiday and plan lookups
    /// * `employee_id` - Employee to recalculate
    /// * `date` - The day to recalculate
    ///
    /// # Returns
    ///
    /// A [`RecalcResult`] with one processed or one failed day.
    pub fn trigger_recalc(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<RecalcResult> {
        self.trigger_recalc_range(tenant_id, employee_id, date, date)
    }

    /// Recalculates `from..=to` for one employee in ascending order.
    ///
    /// The first failing day ends the range; later days are counted as
    /// skipped.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant used for holiday and plan lookups
    /// * `employee_id` - Employee to recalculate
    /// * `from` - First day of the range
    /// * `to` - Last day of the range, inclusive
    ///
    /// # Returns
    ///
    /// The per-day counts and failures, or `InvalidDateRange` when `from`
    /// is after `to`.
    pub fn trigger_recalc_range(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcResult> {
        ensure_range(from, to)?;
        Ok(self.recalc_employee(tenant_id, employee_id, from, to))
    }

    /// Recalculates `from..=to` for each distinct employee, in parallel.
    ///
    /// A failing employee is reported in the result without affecting the
    /// others.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant the employees belong to
    /// * `employee_ids` - Employees to recalculate; repeated ids run once
    /// * `from` - First day of the range
    /// * `to` - Last day of the range, inclusive
    ///
    /// # Returns
    ///
    /// The merged result of all employee ranges. Only an inverted range or
    /// a worker pool that cannot be built is an `Err`.
    pub fn trigger_recalc_batch(
        &self,
        tenant_id: Uuid,
        employee_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcResult> {
        ensure_range(from, to)?;
        let employees = distinct(employee_ids);
        info!(
            tenant_id = %tenant_id,
            employees = employees.len(),
            from = %from,
            to = %to,
            "Starting batch recalculation"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_concurrency)
            .build()
            .map_err(|e| EngineError::TaskFailed {
                message: e.to_string(),
            })?;
        let outcomes: Vec<RecalcResult> = pool.install(|| {
            employees
                .par_iter()
                .map(|employee_id| self.recalc_employee(tenant_id, *employee_id, from, to))
                .collect()
        });

        let mut result = RecalcResult::default();
        for outcome in outcomes {
            result.merge(outcome);
        }
        log_completion(tenant_id, &result);
        Ok(result)
    }

    /// Recalculates `from..=to` for every active employee of the tenant.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant whose active employees are recalculated
    /// * `from` - First day of the range
    /// * `to` - Last day of the range, inclusive
    ///
    /// # Returns
    ///
    /// The merged batch result, or the error of the employee listing.
    pub fn trigger_recalc_all(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcResult> {
        ensure_range(from, to)?;
        let employees = self.active_employees(tenant_id)?;
        self.trigger_recalc_batch(tenant_id, &employees, from, to)
    }

    /// Spawns [`trigger_recalc`](Self::trigger_recalc) on the current runtime.
    pub fn spawn_recalc(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<RecalcHandle> {
        self.spawn_recalc_batch(tenant_id, vec![employee_id], date, date)
    }

    /// Spawns [`trigger_recalc_range`](Self::trigger_recalc_range) on the
    /// current runtime.
    pub fn spawn_recalc_range(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcHandle> {
        self.spawn_recalc_batch(tenant_id, vec![employee_id], from, to)
    }

    /// Spawns a batch recalculation on the current runtime.
    ///
    /// At most `max_concurrency` employee ranges run at a time, each on the
    /// blocking pool.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant the employees belong to
    /// * `employee_ids` - Employees to recalculate; repeated ids run once
    /// * `from` - First day of the range
    /// * `to` - Last day of the range, inclusive
    ///
    /// # Returns
    ///
    /// A [`RecalcHandle`] to cancel or await the job. Fails immediately for
    /// an inverted range or when no runtime is available.
    pub fn spawn_recalc_batch(
        &self,
        tenant_id: Uuid,
        employee_ids: Vec<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcHandle> {
        ensure_range(from, to)?;
        let service = self.clone();
        let employees = distinct(&employee_ids);
        self.spawn(move |cancel| async move {
            service
                .run_batch(tenant_id, employees, from, to, cancel)
                .await
        })
    }

    /// Spawns a recalculation of every active employee of the tenant.
    ///
    /// # Arguments
    ///
    /// * `tenant_id` - Tenant whose active employees are recalculated
    /// * `from` - First day of the range
    /// * `to` - Last day of the range, inclusive
    ///
    /// # Returns
    ///
    /// A [`RecalcHandle`]. A failed employee listing surfaces from
    /// [`RecalcHandle::wait`].
    pub fn spawn_recalc_all(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<RecalcHandle> {
        ensure_range(from, to)?;
        let service = self.clone();
        self.spawn(move |cancel| async move {
            let lister = service.clone();
            let employees =
                tokio::task::spawn_blocking(move || lister.active_employees(tenant_id))
                    .await
                    .map_err(task_failed)??;
            service
                .run_batch(tenant_id, employees, from, to, cancel)
                .await
        })
    }

    fn spawn<F, Fut>(&self, job: F) -> EngineResult<RecalcHandle>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = EngineResult<RecalcResult>> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            EngineError::TaskFailed {
                message: e.to_string(),
            }
        })?;
        let cancel = CancellationToken::new();
        let handle = runtime.spawn(job(cancel.clone()));
        Ok(RecalcHandle { handle, cancel })
    }

    async fn run_batch(
        self,
        tenant_id: Uuid,
        employees: Vec<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
        cancel: CancellationToken,
    ) -> EngineResult<RecalcResult> {
        info!(
            tenant_id = %tenant_id,
            employees = employees.len(),
            from = %from,
            to = %to,
            max_concurrency = self.max_concurrency,
            "Starting background recalculation"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let mut result = RecalcResult::default();

        for employee_id in employees {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(tenant_id = %tenant_id, "Recalculation cancelled");
                    result.cancelled = true;
                    break;
                }
                permit = semaphore.clone().acquire_owned() => permit.map_err(|e| {
                    EngineError::TaskFailed { message: e.to_string() }
                })?,
            };

            let service = self.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                service.recalc_employee(tenant_id, employee_id, from, to)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => result.merge(outcome),
                Err(error) => warn!(
                    tenant_id = %tenant_id,
                    error = %error,
                    "Recalculation task did not complete"
                ),
            }
        }

        log_completion(tenant_id, &result);
        Ok(result)
    }

    fn active_employees(&self, tenant_id: Uuid) -> EngineResult<Vec<Uuid>> {
        Ok(self
            .employees
            .employees_for_tenant(tenant_id)?
            .into_iter()
            .filter(|employee| employee.active)
            .map(|employee| employee.id)
            .collect())
    }

    fn recalc_employee(
        &self,
        tenant_id: Uuid,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RecalcResult {
        let mut result = RecalcResult::default();
        let mut dates = from.iter_days().take_while(|date| *date <= to);

        while let Some(date) = dates.next() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                self.daily.calculate_day(tenant_id, employee_id, date)
            }))
            .unwrap_or_else(|payload| {
                Err(EngineError::TaskFailed {
                    message: panic_message(payload.as_ref()),
                })
            });
            match outcome {
                Ok(_) => result.processed_days += 1,
                Err(error) => {
                    result.failed_days += 1;
                    result.skipped_days = dates.by_ref().count();
                    warn!(
                        employee_id = %employee_id,
                        date = %date,
                        error = %error,
                        skipped_days = result.skipped_days,
                        "Stopping employee recalculation"
                    );
                    result.errors.push(RecalcFailure {
                        employee_id,
                        date,
                        message: error.to_string(),
                    });
                    break;
                }
            }
        }

        debug!(
            employee_id = %employee_id,
            processed_days = result.processed_days,
            "Employee range recalculated"
        );
        result
    }
}

fn ensure_range(from: NaiveDate, to: NaiveDate) -> EngineResult<()> {
    if from > to {
        return Err(EngineError::InvalidDateRange { from, to });
    }
    Ok(())
}

/// Drops repeated ids, keeping first occurrences in order.
fn distinct(employee_ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    employee_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

fn task_failed(error: tokio::task::JoinError) -> EngineError {
    EngineError::TaskFailed {
        message: error.to_string(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("calculation panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("calculation panicked: {message}")
    } else {
        "calculation panicked".to_string()
    }
}

fn log_completion(tenant_id: Uuid, result: &RecalcResult) {
    info!(
        tenant_id = %tenant_id,
        processed_days = result.processed_days,
        failed_days = result.failed_days,
        skipped_days = result.skipped_days,
        cancelled = result.cancelled,
        "Recalculation finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::models::{DayPlan, Employee, NoBookingBehavior};
    use crate::service::Collaborators;
    use crate::store::{DayPlanResolver, FailurePoint, InMemoryStore, PlanResolution};

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn quiet_plan() -> DayPlan {
        let mut plan = DayPlan::new("standard", 480);
        plan.no_booking_behavior = NoBookingBehavior::DeductTarget;
        plan
    }

    fn setup(max_concurrency: usize) -> (Arc<InMemoryStore>, RecalcService) {
        let store = Arc::new(InMemoryStore::new());
        let mut settings = EngineSettings::default();
        settings.recalc.max_concurrency = max_concurrency;
        let daily = DailyCalcService::new(Collaborators::in_memory(store.clone()), &settings);
        let service = RecalcService::new(daily, store.clone(), &settings.recalc);
        (store, service)
    }

    /// Resolves plans from the store but panics for one employee.
    struct PanickingResolver {
        store: Arc<InMemoryStore>,
        broken: Uuid,
    }

    impl DayPlanResolver for PanickingResolver {
        fn resolve(
            &self,
            tenant_id: Uuid,
            employee_id: Uuid,
            date: NaiveDate,
        ) -> EngineResult<Option<PlanResolution>> {
            if employee_id == self.broken {
                panic!("plan table corrupted for {employee_id}");
            }
            self.store.resolve(tenant_id, employee_id, date)
        }
    }

    /// Three employees, the second of which panics during plan resolution.
    fn setup_with_panicking_employee() -> (RecalcService, Vec<Uuid>) {
        let store = Arc::new(InMemoryStore::new());
        let employees: Vec<Uuid> = (0..3)
            .map(|_| add_employee(&store, Uuid::nil(), true))
            .collect();
        let resolver = Arc::new(PanickingResolver {
            store: store.clone(),
            broken: employees[1],
        });
        let settings = EngineSettings::default();
        let collaborators = Collaborators::in_memory(store.clone()).with_plans(resolver);
        let daily = DailyCalcService::new(collaborators, &settings);
        let service = RecalcService::new(daily, store, &settings.recalc);
        (service, employees)
    }

    fn add_employee(store: &InMemoryStore, tenant_id: Uuid, active: bool) -> Uuid {
        let id = Uuid::new_v4();
        store.add_employee(Employee {
            id,
            tenant_id,
            daily_target_minutes: None,
            active,
        });
        store.set_default_plan(id, quiet_plan());
        id
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let (_, service) = setup(2);
        let result = service.trigger_recalc_range(
            Uuid::nil(),
            Uuid::new_v4(),
            make_date("2026-03-05"),
            make_date("2026-03-01"),
        );
        assert!(matches!(result, Err(EngineError::InvalidDateRange { .. })));
    }

    #[test]
    fn test_range_stops_at_first_failure() {
        let (store, service) = setup(2);
        let employee = add_employee(&store, Uuid::nil(), true);
        store.inject_failure(FailurePoint::DayPlan, employee);

        let result = service
            .trigger_recalc_range(
                Uuid::nil(),
                employee,
                make_date("2026-03-01"),
                make_date("2026-03-05"),
            )
            .unwrap();

        assert_eq!(result.processed_days, 0);
        assert_eq!(result.failed_days, 1);
        assert_eq!(result.skipped_days, 4);
        assert_eq!(result.errors[0].date, make_date("2026-03-01"));
        assert!(!result.is_complete());
    }

    #[test]
    fn test_range_processes_dates_in_order() {
        let (store, service) = setup(2);
        let employee = add_employee(&store, Uuid::nil(), true);

        let result = service
            .trigger_recalc_range(
                Uuid::nil(),
                employee,
                make_date("2026-02-27"),
                make_date("2026-03-02"),
            )
            .unwrap();

        assert_eq!(result.processed_days, 4);
        assert_eq!(
            store.upserted_dates(employee),
            vec![
                make_date("2026-02-27"),
                make_date("2026-02-28"),
                make_date("2026-03-01"),
                make_date("2026-03-02"),
            ]
        );
    }

    #[test]
    fn test_batch_deduplicates_employees() {
        let (store, service) = setup(2);
        let a = add_employee(&store, Uuid::nil(), true);
        let b = add_employee(&store, Uuid::nil(), true);
        let date = make_date("2026-03-02");

        let result = service
            .trigger_recalc_batch(Uuid::nil(), &[a, b, a], date, date)
            .unwrap();

        assert_eq!(result.processed_days, 2);
        assert_eq!(store.upsert_count(), 2);
    }

    #[test]
    fn test_all_skips_inactive_employees() {
        let (store, service) = setup(3);
        let tenant = Uuid::new_v4();
        let active = add_employee(&store, tenant, true);
        let inactive = add_employee(&store, tenant, false);
        add_employee(&store, Uuid::new_v4(), true);
        let date = make_date("2026-03-02");

        let result = service.trigger_recalc_all(tenant, date, date).unwrap();

        assert_eq!(result.processed_days, 1);
        assert_eq!(store.upserted_dates(active), vec![date]);
        assert!(store.upserted_dates(inactive).is_empty());
    }

    #[test]
    fn test_all_propagates_listing_failure() {
        let (store, service) = setup(2);
        let tenant = Uuid::new_v4();
        store.inject_failure(FailurePoint::Employees, tenant);
        let date = make_date("2026-03-02");

        let result = service.trigger_recalc_all(tenant, date, date);

        assert!(matches!(result, Err(EngineError::Dependency { .. })));
    }

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let (_, service) = setup(1);
        let date = make_date("2026-03-02");

        let result = service.spawn_recalc(Uuid::nil(), Uuid::new_v4(), date);

        assert!(matches!(result, Err(EngineError::TaskFailed { .. })));
    }

    #[tokio::test]
    async fn test_spawned_batch_completes() {
        let (store, service) = setup(2);
        let employees: Vec<Uuid> = (0..4)
            .map(|_| add_employee(&store, Uuid::nil(), true))
            .collect();

        let handle = service
            .spawn_recalc_batch(
                Uuid::nil(),
                employees,
                make_date("2026-03-02"),
                make_date("2026-03-03"),
            )
            .unwrap();
        let result = handle.wait().await.unwrap();

        assert_eq!(result.processed_days, 8);
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_cancel_before_start_schedules_nothing() {
        let (store, service) = setup(1);
        let employees: Vec<Uuid> = (0..3)
            .map(|_| add_employee(&store, Uuid::nil(), true))
            .collect();
        let date = make_date("2026-03-02");

        let handle = service
            .spawn_recalc_batch(Uuid::nil(), employees, date, date)
            .unwrap();
        handle.cancel();
        let result = handle.wait().await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.processed_days, 0);
        assert_eq!(store.upsert_count(), 0);
    }

    #[test]
    fn test_batch_reports_panicking_employee_as_failure() {
        let (service, employees) = setup_with_panicking_employee();
        let date = make_date("2026-03-02");

        let result = service
            .trigger_recalc_batch(Uuid::nil(), &employees, date, date)
            .unwrap();

        assert_eq!(result.processed_days, 2);
        assert_eq!(result.failed_days, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].employee_id, employees[1]);
        assert!(result.errors[0].message.contains("plan table corrupted"));
    }

    #[tokio::test]
    async fn test_spawned_batch_survives_panicking_employee() {
        let (service, employees) = setup_with_panicking_employee();
        let broken = employees[1];

        let handle = service
            .spawn_recalc_batch(
                Uuid::nil(),
                employees,
                make_date("2026-03-02"),
                make_date("2026-03-03"),
            )
            .unwrap();
        let result = handle.wait().await.unwrap();

        assert_eq!(result.processed_days, 4);
        assert_eq!(result.failed_days, 1);
        assert_eq!(result.skipped_days, 1);
        assert_eq!(result.errors[0].employee_id, broken);
        assert_eq!(result.errors[0].date, make_date("2026-03-02"));
    }
}
