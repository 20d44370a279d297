//! Daily Time Calculation Engine for time-and-attendance
//!
//! This crate turns an employee's raw clock bookings for one day into a
//! daily value (gross, net, break, target, overtime and undertime minutes)
//! under the rules of a day plan, and orchestrates recalculation of date
//! ranges, employee batches and whole tenants.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
