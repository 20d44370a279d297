//! Configuration types for the attendance engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `engine.yaml`.

use chrono::Weekday;
use serde::Deserialize;

fn default_calculation_version() -> u32 {
    1
}

fn default_max_concurrency() -> usize {
    4
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// Version stamped onto every calculated daily value.
    #[serde(default = "default_calculation_version")]
    pub calculation_version: u32,
    /// Recalculation settings.
    #[serde(default)]
    pub recalc: RecalcSettings,
    /// Day plan code per weekday.
    #[serde(default)]
    pub week_plan: WeekPlan,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            calculation_version: default_calculation_version(),
            recalc: RecalcSettings::default(),
            week_plan: WeekPlan::default(),
        }
    }
}

/// Settings for batch recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RecalcSettings {
    /// Upper bound on employees recalculated at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for RecalcSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Day plan assignment per weekday. An unset weekday is an off day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WeekPlan {
    /// Plan code for Mondays.
    pub monday: Option<String>,
    /// Plan code for Tuesdays.
    pub tuesday: Option<String>,
    /// Plan code for Wednesdays.
    pub wednesday: Option<String>,
    /// Plan code for Thursdays.
    pub thursday: Option<String>,
    /// Plan code for Fridays.
    pub friday: Option<String>,
    /// Plan code for Saturdays.
    pub saturday: Option<String>,
    /// Plan code for Sundays.
    pub sunday: Option<String>,
}

impl WeekPlan {
    /// The plan code assigned to `weekday`, if any.
    pub fn code_for(&self, weekday: Weekday) -> Option<&str> {
        let code = match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        };
        code.as_deref()
    }

    /// Every assigned code, in weekday order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        [
            &self.monday,
            &self.tuesday,
            &self.wednesday,
            &self.thursday,
            &self.friday,
            &self.saturday,
            &self.sunday,
        ]
        .into_iter()
        .filter_map(|code| code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: EngineSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.calculation_version, 1);
        assert_eq!(settings.recalc.max_concurrency, 4);
    }

    #[test]
    fn test_week_plan_lookup() {
        let yaml = r#"
week_plan:
  monday: standard
  friday: short
  saturday: ~
"#;
        let settings: EngineSettings = serde_yaml::from_str(yaml).unwrap();
        let week = &settings.week_plan;

        assert_eq!(week.code_for(Weekday::Mon), Some("standard"));
        assert_eq!(week.code_for(Weekday::Fri), Some("short"));
        assert_eq!(week.code_for(Weekday::Sat), None);
        assert_eq!(week.codes().collect::<Vec<_>>(), vec!["standard", "short"]);
    }
}
