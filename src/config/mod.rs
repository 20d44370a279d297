//! Configuration loading for the attendance engine.
//!
//! This module loads engine settings and day plans from YAML files and
//! resolves day plans from the configured week plan.
//!
//! # Example
//!
//! ```no_run
//! use attendance_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/standard").unwrap();
//! println!("Calculation version: {}", config.settings().calculation_version);
//! ```

mod loader;
mod resolver;
mod types;

pub use loader::ConfigLoader;
pub use resolver::WeekPlanResolver;
pub use types::{EngineSettings, RecalcSettings, WeekPlan};
