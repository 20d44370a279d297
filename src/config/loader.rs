//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine settings
//! and day plans from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::DayPlan;

use super::types::EngineSettings;

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── engine.yaml         # Engine settings and week plan
/// └── day_plans/
///     ├── standard.yaml   # One day plan per file
///     └── flextime.yaml
/// ```
///
/// # Example
///
/// ```no_run
/// use attendance_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard")?;
/// let plan = loader.day_plan("standard").expect("plan exists");
/// println!("Target: {} minutes", plan.target.regular_minutes);
/// # Ok::<(), attendance_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    day_plans: HashMap<String, DayPlan>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration directory (e.g., "./config/standard")
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `engine.yaml` or the `day_plans` directory is missing (`ConfigNotFound`)
    /// - A file is not valid YAML for its type (`ConfigParseError`)
    /// - Two plans share a code or the week plan names an unknown code
    ///   (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let engine_path = path.join("engine.yaml");
        let settings = Self::load_yaml::<EngineSettings>(&engine_path)?;

        let day_plans = Self::load_day_plans(&path.join("day_plans"))?;

        for code in settings.week_plan.codes() {
            if !day_plans.contains_key(code) {
                return Err(EngineError::ConfigParseError {
                    path: engine_path.display().to_string(),
                    message: format!("week plan references unknown day plan '{code}'"),
                });
            }
        }

        debug!(
            path = %path.display(),
            day_plans = day_plans.len(),
            calculation_version = settings.calculation_version,
            "Loaded engine configuration"
        );
        Ok(Self {
            settings,
            day_plans,
        })
    }

    /// Builds a loader from values already in memory.
    pub fn from_parts(settings: EngineSettings, day_plans: Vec<DayPlan>) -> Self {
        Self {
            settings,
            day_plans: day_plans
                .into_iter()
                .map(|plan| (plan.code.clone(), plan))
                .collect(),
        }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every `.yaml` file of the day plan directory, keyed by code.
    fn load_day_plans(dir: &Path) -> EngineResult<HashMap<String, DayPlan>> {
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut plans = HashMap::new();
        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let plan = Self::load_yaml::<DayPlan>(&path)?;
                if plans.contains_key(&plan.code) {
                    return Err(EngineError::ConfigParseError {
                        path: path.display().to_string(),
                        message: format!("duplicate day plan code '{}'", plan.code),
                    });
                }
                plans.insert(plan.code.clone(), plan);
            }
        }

        Ok(plans)
    }

    /// Engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// A day plan by code.
    pub fn day_plan(&self, code: &str) -> Option<&DayPlan> {
        self.day_plans.get(code)
    }

    /// Number of loaded day plans.
    pub fn day_plan_count(&self) -> usize {
        self.day_plans.len()
    }
}
