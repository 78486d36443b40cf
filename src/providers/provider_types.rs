use crate::util::RawTimestamp;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// One trajectory sample of a target as delivered by the geometry engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: RawTimestamp,
    pub altitude_km: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// The raw trajectory of a single target. Numeric sample times are seconds after `launch_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetTrajectory {
    pub target_id: String,
    #[serde(default)]
    pub launch_time: Option<RawTimestamp>,
    #[serde(default)]
    pub samples: Vec<TrajectorySample>,
}

/// An access window in the textual form reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAccessWindow {
    pub start: String,
    pub end: String,
}

/// A position returned by the position provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
pub enum Coordinate {
    Cartesian { x: f64, y: f64, z: f64 },
    Geodetic { latitude: f64, longitude: f64, altitude: f64 },
}

impl Coordinate {
    /// The three components in declaration order.
    pub fn components(&self) -> [f64; 3] {
        match *self {
            Coordinate::Cartesian { x, y, z } => [x, y, z],
            Coordinate::Geodetic { latitude, longitude, altitude } => [latitude, longitude, altitude],
        }
    }
}

/// A single position request for an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionQuery {
    pub observer_id: String,
    pub sample_time: DateTime<Utc>,
    /// Offset of `sample_time` from the start of the planning window.
    pub window_offset: TimeDelta,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The requested object is unknown to the provider.
    UnknownObject(String),
    /// The provider could not produce the data, e.g. a failed engine call.
    Unavailable(String),
    /// The call exceeded its time budget.
    Timeout,
    /// The provider worker is gone.
    Disconnected,
}

impl std::error::Error for ProviderError {}
