use super::atomic_task::AtomicTask;
use super::flight_phase::{ResolvedTrajectory, TrajectoryPoint};
use crate::util::{TargetPositionConfig, delta_secs};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// Target position at a given instant, looked up from the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TargetFix {
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
    pub interpolated: bool,
    /// Distance in seconds to the trajectory sample used, zero for interpolated fixes.
    pub sample_distance_secs: f64,
}

/// An entry of a target's meta-task timeline: the task and the target position at its bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaTaskEntry {
    pub task: AtomicTask,
    pub start_position: Option<TargetFix>,
    pub end_position: Option<TargetFix>,
}

impl MetaTaskEntry {
    pub fn new(task: AtomicTask, trajectory: Option<&ResolvedTrajectory>, config: &TargetPositionConfig) -> Self {
        let lookup = |t| trajectory.and_then(|tr| tr.position_at(t, config));
        let interval = task.interval();
        Self { start_position: lookup(interval.start()), end_position: lookup(interval.end()), task }
    }

    pub fn has_position_data(&self) -> bool { self.start_position.is_some() || self.end_position.is_some() }
}

impl ResolvedTrajectory {
    /// Position of the target at `t`.
    ///
    /// Uses the nearest sample, or interpolates linearly between the bracketing samples if the
    /// nearest one is further away than `interpolate_above_secs`.
    ///
    /// # Returns
    /// `None` if the trajectory is empty or the nearest sample is more than `max_time_diff_secs` away.
    pub fn position_at(&self, t: DateTime<Utc>, config: &TargetPositionConfig) -> Option<TargetFix> {
        let points = self.points();
        let idx = points.partition_point(|p| p.time < t);
        let before = idx.checked_sub(1).and_then(|i| points.get(i));
        let after = points.get(idx);
        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                if t - b.time <= a.time - t { b } else { a }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        let distance = (nearest.time - t).abs();
        if distance > TimeDelta::seconds(config.max_time_diff_secs) {
            return None;
        }
        if distance > TimeDelta::seconds(config.interpolate_above_secs) {
            if let (Some(b), Some(a)) = (before, after) {
                return Some(interpolate(b, a, t));
            }
        }
        Some(TargetFix {
            time: t,
            latitude: nearest.latitude,
            longitude: nearest.longitude,
            altitude_km: nearest.altitude_km,
            interpolated: false,
            sample_distance_secs: delta_secs(distance),
        })
    }
}

fn interpolate(before: &TrajectoryPoint, after: &TrajectoryPoint, t: DateTime<Utc>) -> TargetFix {
    let frac = delta_secs(t - before.time) / delta_secs(after.time - before.time);
    let mix = |a: f64, b: f64| a + (b - a) * frac;
    TargetFix {
        time: t,
        latitude: mix(before.latitude, after.latitude),
        longitude: mix(before.longitude, after.longitude),
        altitude_km: mix(before.altitude_km, after.altitude_km),
        interpolated: true,
        sample_distance_secs: 0.0,
    }
}
