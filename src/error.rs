//! Error types for the attendance engine.
//!
//! Only failures that prevent a day from being calculated are errors.
//! Rule violations (missed core time, minimum work time not reached, ...)
//! are recorded as [`ErrorCode`](crate::models::ErrorCode)s on the
//! calculated [`DailyValue`](crate::models::DailyValue) instead.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the attendance engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/engine.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/engine.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// No day plan could be resolved for a working day.
    #[error("No day plan resolvable for employee {employee_id} on {date}: {message}")]
    Configuration {
        /// The employee being calculated.
        employee_id: Uuid,
        /// The date being calculated.
        date: NaiveDate,
        /// A description of what was missing.
        message: String,
    },

    /// A lookup or write against an external collaborator failed.
    #[error("{collaborator} failed: {message}")]
    Dependency {
        /// The collaborator that failed (e.g. "booking store").
        collaborator: String,
        /// A description of the failure.
        message: String,
    },

    /// A recalculation range ends before it starts.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// First day of the range.
        from: NaiveDate,
        /// Last day of the range.
        to: NaiveDate,
    },

    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A background recalculation task did not run to completion.
    #[error("Recalculation task failed: {message}")]
    TaskFailed {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Builds a [`EngineError::Dependency`] for the named collaborator.
    pub fn dependency(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dependency {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
