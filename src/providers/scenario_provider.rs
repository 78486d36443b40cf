use super::{
    AccessProvider, Coordinate, PositionProvider, PositionQuery, ProviderError, RawAccessWindow,
    TargetTrajectory, TrajectoryProvider,
};
use crate::util::{delta_secs, parse_text};
use crate::{event, warn};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A precomputed scenario as exported from the geometry engine.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioData {
    #[serde(default)]
    pub observers: Vec<String>,
    #[serde(default)]
    pub targets: Vec<TargetTrajectory>,
    #[serde(default)]
    pub access: Vec<AccessEntry>,
    #[serde(default)]
    pub observer_tracks: Vec<ObserverTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessEntry {
    pub observer_id: String,
    pub target_id: String,
    #[serde(default)]
    pub windows: Vec<RawAccessWindow>,
    /// Simulates a failing access computation for this pair.
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverTrack {
    pub observer_id: String,
    pub points: Vec<TrackPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPoint {
    pub time: String,
    pub position: Coordinate,
}

/// Serves trajectories, access windows and interpolated observer positions from a [`ScenarioData`].
///
/// Cloning is cheap; all clones share the same scenario.
#[derive(Debug, Clone)]
pub struct ScenarioProvider {
    data: Arc<ScenarioData>,
    tracks: Arc<HashMap<String, Vec<(DateTime<Utc>, Coordinate)>>>,
    call_delay: Duration,
}

impl ScenarioProvider {
    pub fn new(data: ScenarioData) -> Self {
        let mut tracks = HashMap::new();
        for track in &data.observer_tracks {
            let points = track
                .points
                .iter()
                .filter_map(|p| match parse_text(&p.time) {
                    Ok(t) => Some((t, p.position)),
                    Err(e) => {
                        warn!("Skipping track point of {}: {e:?}", track.observer_id);
                        None
                    }
                })
                .sorted_by_key(|(t, _)| *t)
                .collect::<Vec<_>>();
            tracks.insert(track.observer_id.clone(), points);
        }
        Self { data: Arc::new(data), tracks: Arc::new(tracks), call_delay: Duration::ZERO }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str::<ScenarioData>(json)
            .map(Self::new)
            .map_err(|e| ProviderError::Unavailable(format!("invalid scenario: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ProviderError::Unavailable(format!("cannot read scenario: {e}")))?;
        Self::from_json_str(&text)
    }

    /// Adds an artificial blocking delay to every position call, emulating a slow engine.
    #[must_use]
    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    /// The declared observers, or every observer mentioned anywhere in the scenario.
    pub fn observer_ids(&self) -> Vec<String> {
        if !self.data.observers.is_empty() {
            return self.data.observers.clone();
        }
        self.data
            .access
            .iter()
            .map(|a| a.observer_id.clone())
            .chain(self.data.observer_tracks.iter().map(|t| t.observer_id.clone()))
            .sorted()
            .dedup()
            .collect()
    }

    pub fn target_ids(&self) -> Vec<String> {
        self.data.targets.iter().map(|t| t.target_id.clone()).collect()
    }

    fn interpolate(&self, observer_id: &str, t: DateTime<Utc>) -> Option<Coordinate> {
        let points = self.tracks.get(observer_id)?;
        let idx = points.partition_point(|(pt, _)| *pt <= t);
        if idx == 0 {
            return None;
        }
        let (t0, c0) = points[idx - 1];
        if t0 == t {
            return Some(c0);
        }
        let (t1, c1) = *points.get(idx)?;
        let frac = delta_secs(t - t0) / delta_secs(t1 - t0);
        Some(lerp(c0, c1, frac))
    }
}

fn lerp(a: Coordinate, b: Coordinate, frac: f64) -> Coordinate {
    let mix = |u: f64, v: f64| u + (v - u) * frac;
    match (a, b) {
        (Coordinate::Cartesian { x, y, z }, Coordinate::Cartesian { x: x1, y: y1, z: z1 }) => {
            Coordinate::Cartesian { x: mix(x, x1), y: mix(y, y1), z: mix(z, z1) }
        }
        (
            Coordinate::Geodetic { latitude, longitude, altitude },
            Coordinate::Geodetic { latitude: la1, longitude: lo1, altitude: al1 },
        ) => Coordinate::Geodetic {
            latitude: mix(latitude, la1),
            longitude: mix(longitude, lo1),
            altitude: mix(altitude, al1),
        },
        _ => {
            if frac < 0.5 { a } else { b }
        }
    }
}

impl TrajectoryProvider for ScenarioProvider {
    fn trajectory(&self, target_id: &str) -> Result<TargetTrajectory, ProviderError> {
        self.data
            .targets
            .iter()
            .find(|t| t.target_id == target_id)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownObject(target_id.to_string()))
    }
}

impl AccessProvider for ScenarioProvider {
    fn access_windows(
        &self,
        observer_id: &str,
        target_id: &str,
    ) -> Result<Vec<RawAccessWindow>, ProviderError> {
        match self.data.access.iter().find(|a| a.observer_id == observer_id && a.target_id == target_id) {
            Some(entry) if entry.unavailable => Err(ProviderError::Unavailable(format!(
                "access computation failed for {observer_id}/{target_id}"
            ))),
            Some(entry) => Ok(entry.windows.clone()),
            None => Ok(Vec::new()),
        }
    }
}

impl PositionProvider for ScenarioProvider {
    fn position_at(
        &mut self,
        query: &PositionQuery,
        _timeout: Duration,
    ) -> Result<Option<Coordinate>, ProviderError> {
        if !self.call_delay.is_zero() {
            std::thread::sleep(self.call_delay);
        }
        if !self.tracks.contains_key(&query.observer_id) {
            return Err(ProviderError::UnknownObject(query.observer_id.clone()));
        }
        let pos = self.interpolate(&query.observer_id, query.sample_time);
        event!("Position of {} at {}: {pos:?}", query.observer_id, query.sample_time);
        Ok(pos)
    }
}
