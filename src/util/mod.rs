mod config;
mod time_interval;
mod timestamp;


pub use config::{
    ConfigError, CoveragePolicy, GridConfig, MAX_DURATION_SECS, PhaseConfig, PlannerConfig,
    PositionSyncConfig, StandardizationConfig, TargetPositionConfig, VisibilityConfig,
};
pub use time_interval::{TimeInterval, delta_secs, secs_delta};
pub use timestamp::{RawTimestamp, TimestampError, TimestampFormat, offset_secs, parse_text};
