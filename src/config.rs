//! Configuration for the circadian biomarker CLI.

use crate::core::{CircadianConfig, DaySelection, L5_WINDOW_HOURS, M10_WINDOW_HOURS};
use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Zone used for recordings that do not name one
    pub timezone: Tz,

    /// L5 window length
    #[serde(with = "hours_serde")]
    pub l5_window: Duration,

    /// M10 window length
    #[serde(with = "hours_serde")]
    pub m10_window: Duration,

    /// Days used for VMC and heart-rate markers
    pub days: DaySelection,

    /// Number of recordings analyzed in parallel
    pub workers: usize,

    /// Path for exported biomarker reports
    pub export_path: PathBuf,

    /// Path for run statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("circadian-biomarkers");

        Self {
            timezone: Tz::UTC,
            l5_window: Duration::hours(L5_WINDOW_HOURS),
            m10_window: Duration::hours(M10_WINDOW_HOURS),
            days: DaySelection::default(),
            workers: 4,
            export_path: data_dir.join("reports"),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        self.validate()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("circadian-biomarkers")
            .join("config.json")
    }

    /// Path of the persisted run statistics.
    pub fn run_log_path(&self) -> PathBuf {
        self.data_path.join("run_stats.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Check that the settings describe a usable analysis.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.l5_window <= Duration::zero() || self.m10_window <= Duration::zero() {
            return Err(ConfigError::Invalid(
                "window lengths must be positive".to_string(),
            ));
        }
        if self.days.is_empty() {
            return Err(ConfigError::Invalid(
                "day selection must include weekdays, weekends or both".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Window lengths for the core computations.
    pub fn circadian(&self) -> Result<CircadianConfig, ConfigError> {
        self.validate()?;
        Ok(CircadianConfig {
            l5_window: self.l5_window,
            m10_window: self.m10_window,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde support for window lengths, stored as whole hours.
mod hours_serde {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.num_hours().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hours = i64::deserialize(deserializer)?;
        Duration::try_hours(hours)
            .ok_or_else(|| serde::de::Error::custom(format!("window of {hours} hours is out of range")))
    }
}
