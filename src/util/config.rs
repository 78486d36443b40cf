use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// Upper bound for every configured duration, ten years.
pub const MAX_DURATION_SECS: i64 = 10 * 366 * 86_400;

/// How a task is judged observable from a set of access windows.
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoveragePolicy {
    /// A single access window has to contain the whole task.
    Complete,
    /// The summed overlap has to reach the configured minimum ratio.
    Partial,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl std::error::Error for ConfigError {}

/// Complete configuration of a planning run. Every section falls back to its defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub grid: GridConfig,
    pub phase: PhaseConfig,
    pub standardization: StandardizationConfig,
    pub visibility: VisibilityConfig,
    pub position_sync: PositionSyncConfig,
    pub target_position: TargetPositionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub atomic_task_secs: i64,
    pub max_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    pub altitude_threshold_km: f64,
    pub min_phase_secs: i64,
    pub boost_ratio: f64,
    pub terminal_ratio: f64,
    pub min_valid_samples: usize,
    pub nominal_flight_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizationConfig {
    pub enabled: bool,
    pub standard_secs: i64,
    pub min_secs: i64,
    pub max_secs: i64,
    pub overlap_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    pub coverage_policy: CoveragePolicy,
    pub minimum_overlap_ratio: f64,
    pub merge_adjacent_windows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSyncConfig {
    pub sample_interval_secs: i64,
    pub max_samples_per_task: usize,
    pub provider_timeout_secs: u64,
    pub batch_size: usize,
    pub enable_cache: bool,
    pub cartesian_magnitude_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetPositionConfig {
    pub max_time_diff_secs: i64,
    pub interpolate_above_secs: i64,
}

impl Default for GridConfig {
    fn default() -> Self { Self { atomic_task_secs: 300, max_tasks: 1000 } }
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            altitude_threshold_km: 100.0,
            min_phase_secs: 300,
            boost_ratio: 0.1,
            terminal_ratio: 0.1,
            min_valid_samples: 3,
            nominal_flight_secs: 1800,
        }
    }
}

impl Default for StandardizationConfig {
    fn default() -> Self {
        Self { enabled: false, standard_secs: 2400, min_secs: 1800, max_secs: 2700, overlap_secs: 300 }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            coverage_policy: CoveragePolicy::Complete,
            minimum_overlap_ratio: 1.0,
            merge_adjacent_windows: false,
        }
    }
}

impl Default for PositionSyncConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 30,
            max_samples_per_task: 20,
            provider_timeout_secs: 30,
            batch_size: 10,
            enable_cache: false,
            cartesian_magnitude_threshold: 1000.0,
        }
    }
}

impl Default for TargetPositionConfig {
    fn default() -> Self { Self { max_time_diff_secs: 600, interpolate_above_secs: 15 } }
}

impl GridConfig {
    pub fn task_width(&self) -> TimeDelta { TimeDelta::seconds(self.atomic_task_secs) }
}

impl PositionSyncConfig {
    pub fn sample_interval(&self) -> TimeDelta { TimeDelta::seconds(self.sample_interval_secs) }

    pub fn provider_timeout(&self) -> Duration { Duration::from_secs(self.provider_timeout_secs) }
}

impl PlannerConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a TOML configuration string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.grid.atomic_task_secs <= 0 {
            return invalid("grid.atomic_task_secs must be positive");
        }
        if self.grid.max_tasks == 0 {
            return invalid("grid.max_tasks must be at least 1");
        }
        let p = &self.phase;
        if !(0.0..1.0).contains(&p.boost_ratio)
            || !(0.0..1.0).contains(&p.terminal_ratio)
            || p.boost_ratio + p.terminal_ratio >= 1.0
        {
            return invalid("phase ratios must be in [0, 1) and sum to less than 1");
        }
        if p.min_phase_secs < 0 || p.nominal_flight_secs <= 0 {
            return invalid("phase durations must not be negative");
        }
        let s = &self.standardization;
        if s.enabled && (s.min_secs <= 0 || s.min_secs > s.max_secs || s.overlap_secs < 0) {
            return invalid("standardization requires 0 < min_secs <= max_secs and overlap_secs >= 0");
        }
        let ratio = self.visibility.minimum_overlap_ratio;
        if !(ratio > 0.0 && ratio <= 1.0) {
            return invalid("visibility.minimum_overlap_ratio must be in (0, 1]");
        }
        let ps = &self.position_sync;
        if ps.sample_interval_secs <= 0 || ps.max_samples_per_task < 2 || ps.batch_size == 0 {
            return invalid(
                "position_sync requires a positive interval, at least 2 samples and a non-empty batch",
            );
        }
        if ps.provider_timeout_secs == 0 {
            return invalid("position_sync.provider_timeout_secs must be positive");
        }
        if self.target_position.max_time_diff_secs < 0 || self.target_position.interpolate_above_secs < 0 {
            return invalid("target_position limits must not be negative");
        }
        let durations = [
            ("grid.atomic_task_secs", self.grid.atomic_task_secs),
            ("phase.min_phase_secs", p.min_phase_secs),
            ("phase.nominal_flight_secs", p.nominal_flight_secs),
            ("standardization.standard_secs", s.standard_secs),
            ("standardization.min_secs", s.min_secs),
            ("standardization.max_secs", s.max_secs),
            ("standardization.overlap_secs", s.overlap_secs),
            ("position_sync.sample_interval_secs", ps.sample_interval_secs),
            (
                "position_sync.provider_timeout_secs",
                i64::try_from(ps.provider_timeout_secs).unwrap_or(i64::MAX),
            ),
            ("target_position.max_time_diff_secs", self.target_position.max_time_diff_secs),
            ("target_position.interpolate_above_secs", self.target_position.interpolate_above_secs),
        ];
        let horizon = MAX_DURATION_SECS.unsigned_abs();
        if let Some((key, _)) = durations.iter().find(|(_, secs)| secs.unsigned_abs() > horizon) {
            return Err(ConfigError::Invalid(format!("{key} exceeds the {MAX_DURATION_SECS}s horizon")));
        }
        Ok(())
    }
}
