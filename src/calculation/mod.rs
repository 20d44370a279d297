//! Calculation logic for the daily time engine.
//!
//! Each stage of the daily pipeline lives in its own module: pairing of
//! bookings (including day-change handling), tolerance, rounding, evaluation
//! window capping with presence validation, break deduction, and the
//! aggregation that selects a branch per day and combines the stages.

mod aggregation;
mod breaks;
mod capping;
mod pairing;
mod rounding;
mod time_value;
mod tolerance;

pub use aggregation::{
    DayBranch, DayCalculation, DayEffect, DayInput, calculate_day, holiday_credit, resolve_target,
};
pub use breaks::{AppliedBreak, BreakDeduction, calculate_break_deduction};
pub use capping::{
    CappedBoundary, CappingSource, WindowCapping, apply_window_capping, arrival_floor,
    cap_net_time, departure_ceiling, validate_core_hours, validate_time_window,
};
pub use pairing::{BookingPair, DayBookings, PairEndpoint, PairingResult, pair_bookings};
pub use rounding::{apply_rounding, round_time};
pub use time_value::{
    MINUTES_PER_DAY, TimeInterval, format_minutes, gap_minutes, overlap_minutes,
    overlap_with_all, total_duration,
};
pub use tolerance::{
    EffectiveTolerance, apply_come_tolerance, apply_go_tolerance, effective_tolerance,
};
