use crate::providers::TargetTrajectory;
use crate::util::{PhaseConfig, RawTimestamp, TimeInterval, TimestampError};
use crate::{log, warn};
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use serde::Serialize;
use strum_macros::Display;

/// A trajectory sample with a resolved timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub time: DateTime<Utc>,
    pub altitude_km: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// The parsed, time ordered trajectory of a target.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTrajectory {
    target_id: String,
    launch_time: Option<DateTime<Utc>>,
    points: Vec<TrajectoryPoint>,
    skipped_samples: usize,
}

impl ResolvedTrajectory {
    /// Parses all samples of `raw`. Samples with malformed timestamps or non-finite values are
    /// skipped and counted, duplicate timestamps keep their first sample.
    pub fn from_raw(raw: &TargetTrajectory) -> Self {
        let launch_time = raw.launch_time.as_ref().and_then(|lt| match lt {
            RawTimestamp::Text(_) => lt
                .resolve(None)
                .inspect_err(|e| warn!("Unparseable launch time for {}: {e:?}", raw.target_id))
                .ok(),
            RawTimestamp::Seconds(_) => {
                warn!("Launch time of {} has no epoch, ignoring it", raw.target_id);
                None
            }
        });

        let mut skipped_samples = 0;
        let mut last_err: Option<TimestampError> = None;
        let points = raw
            .samples
            .iter()
            .filter_map(|s| {
                let valid_values =
                    s.altitude_km.is_finite() && s.latitude.is_finite() && s.longitude.is_finite();
                match s.time.resolve(launch_time) {
                    Ok(time) if valid_values => Some(TrajectoryPoint {
                        time,
                        altitude_km: s.altitude_km,
                        latitude: s.latitude,
                        longitude: s.longitude,
                    }),
                    Ok(_) => {
                        skipped_samples += 1;
                        None
                    }
                    Err(e) => {
                        skipped_samples += 1;
                        last_err = Some(e);
                        None
                    }
                }
            })
            .sorted_by_key(|p| p.time)
            .dedup_by(|a, b| a.time == b.time)
            .collect::<Vec<_>>();

        if skipped_samples > 0 {
            warn!(
                "Skipped {skipped_samples} of {} trajectory samples for {} (last error: {last_err:?})",
                raw.samples.len(),
                raw.target_id
            );
        }
        Self { target_id: raw.target_id.clone(), launch_time, points, skipped_samples }
    }

    pub fn target_id(&self) -> &str { &self.target_id }

    pub fn launch_time(&self) -> Option<DateTime<Utc>> { self.launch_time }

    pub fn points(&self) -> &[TrajectoryPoint] { &self.points }

    pub fn skipped_samples(&self) -> usize { self.skipped_samples }

    /// The span between the first and the last valid sample.
    pub fn observed_span(&self) -> Option<TimeInterval> {
        TimeInterval::new(self.points.first()?.time, self.points.last()?.time)
    }
}

/// How the critical phase of a target was determined.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PhaseSource {
    /// First and last sample above the altitude threshold.
    AltitudeAnalysis,
    /// Fixed ratios of the observed sample span.
    ObservedSpanRatio,
    /// Fixed ratios of the nominal flight duration after launch.
    NominalFlightRatio,
}

/// The flight phases of a single target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightPhases {
    pub target_id: String,
    pub source: PhaseSource,
    pub boost: Option<TimeInterval>,
    pub critical: TimeInterval,
    pub terminal: Option<TimeInterval>,
}

/// Determines the critical (mid-course) phase of targets from their trajectories.
#[derive(Debug, Clone)]
pub struct PhaseResolver {
    config: PhaseConfig,
}

impl PhaseResolver {
    pub fn new(config: PhaseConfig) -> Self { Self { config } }

    /// Resolves the phases of one target, walking the fallback chain
    /// altitude analysis, observed span ratio, nominal flight ratio.
    ///
    /// # Returns
    /// `None` if no strategy can produce a phase.
    pub fn resolve(&self, trajectory: &ResolvedTrajectory) -> Option<FlightPhases> {
        let target_id = trajectory.target_id();
        if trajectory.points().len() >= self.config.min_valid_samples {
            if let Some(phases) = self.by_altitude(trajectory) {
                log!("Critical phase of {target_id} from altitude analysis: {}", phases.critical);
                return Some(phases);
            }
            warn!(
                "No span of at least {}s above {}km for {target_id}, using ratio split",
                self.config.min_phase_secs, self.config.altitude_threshold_km
            );
        } else {
            warn!(
                "Only {} valid samples for {target_id}, using ratio split",
                trajectory.points().len()
            );
        }

        let observed = trajectory
            .observed_span()
            .and_then(|span| self.by_ratio(target_id, span, PhaseSource::ObservedSpanRatio));
        if observed.is_some() {
            return observed;
        }
        let nominal = trajectory.launch_time().and_then(|launch| {
            TimeInterval::with_duration(launch, TimeDelta::seconds(self.config.nominal_flight_secs))
        });
        if let Some(flight) = nominal {
            warn!("Using nominal flight duration from launch for {target_id}");
            return self.by_ratio(target_id, flight, PhaseSource::NominalFlightRatio);
        }
        warn!("Flight phases of {target_id} cannot be resolved");
        None
    }

    fn by_altitude(&self, trajectory: &ResolvedTrajectory) -> Option<FlightPhases> {
        let points = trajectory.points();
        let above = |p: &&TrajectoryPoint| p.altitude_km >= self.config.altitude_threshold_km;
        let first = points.iter().find(above)?;
        let last = points.iter().rev().find(above)?;
        let critical = TimeInterval::new(first.time, last.time)?;
        if critical.duration() < TimeDelta::seconds(self.config.min_phase_secs) {
            return None;
        }
        let flight_start = points.first()?.time;
        let flight_end = points.last()?.time;
        Some(FlightPhases {
            target_id: trajectory.target_id().to_string(),
            source: PhaseSource::AltitudeAnalysis,
            boost: TimeInterval::new(flight_start, critical.start()),
            critical,
            terminal: TimeInterval::new(critical.end(), flight_end),
        })
    }

    fn by_ratio(&self, target_id: &str, flight: TimeInterval, source: PhaseSource) -> Option<FlightPhases> {
        let (boost, critical, terminal) =
            flight.split_ratio(self.config.boost_ratio, self.config.terminal_ratio);
        Some(FlightPhases { target_id: target_id.to_string(), source, boost, critical: critical?, terminal })
    }
}
