//! Holiday and absence models.
//!
//! These are read from external lookups and only influence which branch the
//! daily calculation takes and which target applies.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Holiday category, which controls how much target time a holiday credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum HolidayCategory {
    /// Category 1: credits the full target by default.
    Full,
    /// Category 2: credits half the target by default.
    Half,
    /// Category 3: credits nothing by default.
    Zero,
}

impl TryFrom<u8> for HolidayCategory {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(HolidayCategory::Full),
            2 => Ok(HolidayCategory::Half),
            3 => Ok(HolidayCategory::Zero),
            other => Err(format!("unknown holiday category {other}")),
        }
    }
}

impl From<HolidayCategory> for u8 {
    fn from(category: HolidayCategory) -> Self {
        match category {
            HolidayCategory::Full => 1,
            HolidayCategory::Half => 2,
            HolidayCategory::Zero => 3,
        }
    }
}

impl fmt::Display for HolidayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category {}", u8::from(*self))
    }
}

/// A public holiday for a tenant.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{Holiday, HolidayCategory};
/// use chrono::NaiveDate;
///
/// let holiday = Holiday {
///     date: NaiveDate::from_ymd_opt(2026, 12, 24).unwrap(),
///     name: "Christmas Eve".to_string(),
///     category: HolidayCategory::Half,
/// };
/// assert_eq!(holiday.category.to_string(), "category 2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date of the holiday.
    pub date: NaiveDate,
    /// The name of the holiday.
    pub name: String,
    /// The credit category.
    pub category: HolidayCategory,
}

/// The kind of an absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceKind {
    /// Paid vacation; consumes vacation entitlement.
    Vacation,
    /// Sick leave.
    Illness,
    /// Vocational school attendance.
    VocationalSchool,
    /// Unpaid leave; credits no time.
    Unpaid,
    /// Any other paid absence.
    Other,
}

impl AbsenceKind {
    /// Returns true if the absence counts as work time.
    pub fn credits_time(&self) -> bool {
        !matches!(self, AbsenceKind::Unpaid)
    }
}

/// Whether an absence covers the full day or half of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsencePortion {
    /// The whole day.
    #[default]
    Full,
    /// Half of the day.
    Half,
}

/// An approved absence of one employee on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// Unique identifier for the absence.
    pub id: Uuid,
    /// The absent employee.
    pub employee_id: Uuid,
    /// The date of the absence.
    pub date: NaiveDate,
    /// The kind of absence.
    pub kind: AbsenceKind,
    /// Full or half day.
    #[serde(default)]
    pub portion: AbsencePortion,
    /// True for absences created by the engine.
    #[serde(default)]
    pub system_generated: bool,
}

impl Absence {
    /// Creates the system absence recorded for a vocational school day.
    pub fn vocational_school(employee_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            date,
            kind: AbsenceKind::VocationalSchool,
            portion: AbsencePortion::Full,
            system_generated: true,
        }
    }
}

/// The subset of the employee master record the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: Uuid,
    /// The tenant the employee belongs to.
    pub tenant_id: Uuid,
    /// Personal daily target in minutes, used when the day plan defers to the
    /// employee master.
    #[serde(default)]
    pub daily_target_minutes: Option<i32>,
    /// Inactive employees are skipped by tenant-wide recalculation.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holiday_category_round_trips_as_number() {
        let json = serde_json::to_string(&HolidayCategory::Half).unwrap();
        assert_eq!(json, "2");

        let category: HolidayCategory = serde_json::from_str("3").unwrap();
        assert_eq!(category, HolidayCategory::Zero);
    }

    #[test]
    fn test_unknown_holiday_category_is_rejected() {
        assert!(serde_json::from_str::<HolidayCategory>("4").is_err());
    }

    #[test]
    fn test_unpaid_absence_credits_no_time() {
        assert!(!AbsenceKind::Unpaid.credits_time());
        assert!(AbsenceKind::Vacation.credits_time());
        assert!(AbsenceKind::VocationalSchool.credits_time());
    }

    #[test]
    fn test_vocational_school_absence_is_system_generated() {
        let employee_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let absence = Absence::vocational_school(employee_id, date);

        assert_eq!(absence.kind, AbsenceKind::VocationalSchool);
        assert_eq!(absence.portion, AbsencePortion::Full);
        assert!(absence.system_generated);
    }

    #[test]
    fn test_employee_defaults_to_active() {
        let json = r#"{
            "id": "0b0e5f6a-6f43-4f4e-8f2a-6a8e2f3b1c9d",
            "tenant_id": "6f1c2a54-2a4e-4f55-9d55-0d6c6ac1e0f1"
        }"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert!(employee.active);
        assert_eq!(employee.daily_target_minutes, None);
    }
}
