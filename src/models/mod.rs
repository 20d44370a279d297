//! Core data models for the daily time engine.
//!
//! This module contains the booking, day plan, calendar and daily value
//! types shared by the calculation, configuration and service layers.

mod booking;
mod calendar;
mod daily_value;
mod day_plan;

pub use booking::{Booking, BookingCategory, BookingDirection, BookingSource};
pub use calendar::{Absence, AbsenceKind, AbsencePortion, Employee, Holiday, HolidayCategory};
pub use daily_value::{
    CalculationStep, DailyValue, DailyValueStatus, ErrorCode, OrderPosting, WarningCode,
};
pub use day_plan::{
    BreakRule, BreakType, DayChangeBehavior, DayPlan, HolidayCredits, NoBookingBehavior,
    PlanType, RoundingAlgorithm, RoundingConfig, RoundingRule, TargetHours, ToleranceConfig,
};
