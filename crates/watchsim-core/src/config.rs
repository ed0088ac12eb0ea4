//! YAML configuration for a simulation run.

use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

use crate::device::StepModulation;
use crate::pacer::PacingConfig;

/// Default configuration file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "watchsim-config.yaml";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML for this schema.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yml::Error),
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Run parameters.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Frame pacing cadences and threshold.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Logging verbosity.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Optional per-minute step export.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Parameters of the simulated run itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Simulated start timestamp.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDateTime,

    /// Wearer archetype id; unknown ids fall back to the default
    /// profile with a warning.
    #[serde(default = "default_archetype")]
    pub archetype: String,

    /// Speed multiplier, 1-1000.
    #[serde(default = "default_speed")]
    pub speed: u32,

    /// Simulated days to run before completion.
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,

    /// Planner seed for reproducible runs; omitted means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// How device state feeds back into step generation.
    #[serde(default)]
    pub modulation: StepModulation,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_date: default_start_date(),
            archetype: default_archetype(),
            speed: default_speed(),
            duration_days: default_duration_days(),
            seed: None,
            modulation: StepModulation::default(),
        }
    }
}

fn default_start_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

fn default_archetype() -> String {
    "office".to_owned()
}

const fn default_speed() -> u32 {
    1
}

const fn default_duration_days() -> u32 {
    7
}

/// Logging verbosity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter directive (overridable via `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// On-disk export of per-minute step counts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Whether to write an export file when the run completes.
    #[serde(default)]
    pub enabled: bool,

    /// Output path.
    #[serde(default = "default_export_path")]
    pub path: String,

    /// Output format.
    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_export_path(),
            format: ExportFormat::default(),
        }
    }
}

fn default_export_path() -> String {
    "watchsim-export.csv".to_owned()
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Newline-separated `timestamp,steps` records.
    #[default]
    Csv,
    /// A single JSON document with the same fields.
    Json,
}

impl SimulationConfig {
    /// Load and parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse a configuration document from a string.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(raw)?)
    }
}
