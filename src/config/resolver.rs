//! Day plan resolution from the configured week plan.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::store::{DayPlanResolver, PlanResolution};

use super::loader::ConfigLoader;

/// Resolves every employee's plan from the weekday of the date.
///
/// A weekday without a code is an off day. A code without a loaded plan
/// cannot be resolved.
///
/// # Example
///
/// ```
/// use attendance_engine::config::{ConfigLoader, EngineSettings, WeekPlanResolver};
/// use attendance_engine::models::DayPlan;
/// use attendance_engine::store::{DayPlanResolver, PlanResolution};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let mut settings = EngineSettings::default();
/// settings.week_plan.monday = Some("standard".to_string());
/// let loader = ConfigLoader::from_parts(settings, vec![DayPlan::new("standard", 480)]);
/// let resolver = WeekPlanResolver::new(loader);
///
/// let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let tuesday = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
/// assert!(matches!(
///     resolver.resolve(Uuid::nil(), Uuid::nil(), monday).unwrap(),
///     Some(PlanResolution::Working(_))
/// ));
/// assert_eq!(
///     resolver.resolve(Uuid::nil(), Uuid::nil(), tuesday).unwrap(),
///     Some(PlanResolution::OffDay)
/// );
/// ```
#[derive(Debug, Clone)]
pub struct WeekPlanResolver {
    config: Arc<ConfigLoader>,
}

impl WeekPlanResolver {
    /// Creates a resolver over a loaded configuration.
    pub fn new(config: impl Into<Arc<ConfigLoader>>) -> Self {
        Self {
            config: config.into(),
        }
    }
}

impl DayPlanResolver for WeekPlanResolver {
    fn resolve(
        &self,
        _tenant_id: Uuid,
        _employee_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Option<PlanResolution>> {
        let Some(code) = self.config.settings().week_plan.code_for(date.weekday()) else {
            return Ok(Some(PlanResolution::OffDay));
        };
        Ok(self
            .config
            .day_plan(code)
            .cloned()
            .map(PlanResolution::Working))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;

    #[test]
    fn test_unknown_code_is_unresolvable() {
        let mut settings = EngineSettings::default();
        settings.week_plan.wednesday = Some("missing".to_string());
        let resolver = WeekPlanResolver::new(ConfigLoader::from_parts(settings, vec![]));

        let wednesday = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        assert_eq!(
            resolver.resolve(Uuid::nil(), Uuid::nil(), wednesday).unwrap(),
            None
        );
    }

    #[test]
    fn test_loaded_configuration_resolves_weekdays() {
        let resolver = WeekPlanResolver::new(ConfigLoader::load("./config/standard").unwrap());
        let friday = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();

        match resolver.resolve(Uuid::nil(), Uuid::nil(), friday).unwrap() {
            Some(PlanResolution::Working(plan)) => assert_eq!(plan.code, "flextime"),
            other => panic!("Expected working day, got {other:?}"),
        }
        assert_eq!(
            resolver.resolve(Uuid::nil(), Uuid::nil(), sunday).unwrap(),
            Some(PlanResolution::OffDay)
        );
    }
}
