//! Booking model and related types.
//!
//! A [`Booking`] is one raw clock event. The engine reads bookings but never
//! mutates them; calculated times are reported separately and written back by
//! the daily calculation service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a clock event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingDirection {
    /// Arrival (clock in).
    In,
    /// Departure (clock out).
    Out,
}

/// What a booking pair represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingCategory {
    /// Presence at work.
    Work,
    /// A manually booked break taken while clocked in.
    Break,
}

/// Where a booking originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    /// Hardware clock terminal.
    Terminal,
    /// Web self-service.
    Web,
    /// External API client.
    Api,
    /// Bulk import.
    Import,
    /// Manual or system-generated correction.
    Correction,
}

/// A single raw clock event for one employee on one date.
///
/// Times are minutes from midnight of `date`. `original_time` is the source
/// of truth and never changes; `edited_time` carries user corrections and is
/// what the engine evaluates.
///
/// # Example
///
/// ```
/// use attendance_engine::models::{Booking, BookingCategory, BookingDirection, BookingSource};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let booking = Booking::new(
///     Uuid::new_v4(),
///     NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
///     BookingDirection::In,
///     BookingCategory::Work,
///     480,
///     BookingSource::Terminal,
/// );
/// assert_eq!(booking.edited_time, 480);
/// assert_eq!(booking.calculated_time, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier for the booking.
    pub id: Uuid,
    /// The employee who booked.
    pub employee_id: Uuid,
    /// The date the booking belongs to.
    pub date: NaiveDate,
    /// Arrival or departure.
    pub direction: BookingDirection,
    /// Work or break.
    pub category: BookingCategory,
    /// The time as originally recorded.
    pub original_time: i32,
    /// The time after user correction. Defaults to `original_time`.
    pub edited_time: i32,
    /// The time after tolerance, rounding and capping, once calculated.
    #[serde(default)]
    pub calculated_time: Option<i32>,
    /// Links an arrival to its departure when pairing is already known.
    #[serde(default)]
    pub pair_id: Option<Uuid>,
    /// Where the booking came from.
    pub source: BookingSource,
    /// True for bookings synthesized by the engine (day-change auto-complete).
    #[serde(default)]
    pub system_generated: bool,
}

impl Booking {
    /// Creates an unpaired, uncalculated booking with `edited_time == original_time`.
    pub fn new(
        employee_id: Uuid,
        date: NaiveDate,
        direction: BookingDirection,
        category: BookingCategory,
        time: i32,
        source: BookingSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            date,
            direction,
            category,
            original_time: time,
            edited_time: time,
            calculated_time: None,
            pair_id: None,
            source,
            system_generated: false,
        }
    }

    /// Creates a system-generated correction booking, as used by day-change
    /// auto-completion.
    pub fn system_correction(
        employee_id: Uuid,
        date: NaiveDate,
        direction: BookingDirection,
        time: i32,
    ) -> Self {
        Self {
            system_generated: true,
            ..Self::new(
                employee_id,
                date,
                direction,
                BookingCategory::Work,
                time,
                BookingSource::Correction,
            )
        }
    }

    /// Returns true for a work arrival.
    pub fn is_work_in(&self) -> bool {
        self.category == BookingCategory::Work && self.direction == BookingDirection::In
    }

    /// Returns true for a work departure.
    pub fn is_work_out(&self) -> bool {
        self.category == BookingCategory::Work && self.direction == BookingDirection::Out
    }
}
