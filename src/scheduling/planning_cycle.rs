use super::flight_phase::FlightPhases;
use crate::util::{StandardizationConfig, TimeInterval};
use crate::{info, log};
use chrono::TimeDelta;
use serde::Serialize;
use std::collections::BTreeMap;

/// The common planning horizon of all targets.
///
/// `interval` always contains the union of every entry in `per_target_phase`. Without
/// standardization it is exactly their hull, which is kept in `original` either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningCycle {
    interval: TimeInterval,
    original: TimeInterval,
    standardized: bool,
    per_target_phase: BTreeMap<String, TimeInterval>,
    earliest_target: String,
    latest_target: String,
}

impl PlanningCycle {
    /// Combines the critical phases of all resolved targets into one planning cycle.
    ///
    /// # Arguments
    /// - `phases`: The resolved phases, one entry per target.
    /// - `standardization`: Optional normalization of the cycle length.
    ///
    /// # Returns
    /// `None` if `phases` is empty.
    pub fn from_phases(phases: &[FlightPhases], standardization: &StandardizationConfig) -> Option<Self> {
        let per_target_phase: BTreeMap<String, TimeInterval> =
            phases.iter().map(|p| (p.target_id.clone(), p.critical)).collect();
        let (earliest_target, earliest) =
            per_target_phase.iter().min_by_key(|(_, phase)| phase.start())?;
        let (latest_target, latest) = per_target_phase.iter().max_by_key(|(_, phase)| phase.end())?;
        let original = earliest.hull(latest);

        let interval =
            if standardization.enabled { Self::standardize(original, standardization) } else { original };
        info!(
            "Planning cycle {interval} ({:.0}s) over {} targets, earliest {earliest_target}, latest {latest_target}",
            interval.duration_secs(),
            per_target_phase.len()
        );
        Some(Self {
            interval,
            original,
            standardized: standardization.enabled,
            earliest_target: earliest_target.clone(),
            latest_target: latest_target.clone(),
            per_target_phase,
        })
    }

    /// Symmetrically resizes `hull` around its center to a standard length, never shrinking below
    /// the hull itself and keeping at least the overlap margin on both sides.
    pub fn standardize(hull: TimeInterval, config: &StandardizationConfig) -> TimeInterval {
        let original = hull.duration();
        let min = TimeDelta::seconds(config.min_secs);
        let max = TimeDelta::seconds(config.max_secs);
        let standard = TimeDelta::seconds(config.standard_secs);
        let margin = TimeDelta::seconds(config.overlap_secs);

        let target = if original < min {
            min
        } else if original > max {
            max
        } else {
            standard.max(original)
        };
        let target = target.max(original);

        let mut start = hull.center() - target / 2;
        let mut end = start + target;
        if hull.start() - start < margin {
            start = hull.start() - margin;
        }
        if end - hull.end() < margin {
            end = hull.end() + margin;
        }
        let standardized = TimeInterval::new(start, end).unwrap_or(hull);
        log!(
            "Standardized cycle from {:.0}s to {:.0}s",
            hull.duration_secs(),
            standardized.duration_secs()
        );
        standardized
    }

    pub fn interval(&self) -> TimeInterval { self.interval }

    pub fn original(&self) -> TimeInterval { self.original }

    pub fn standardized(&self) -> bool { self.standardized }

    pub fn per_target_phase(&self) -> &BTreeMap<String, TimeInterval> { &self.per_target_phase }

    pub fn phase_of(&self, target_id: &str) -> Option<&TimeInterval> { self.per_target_phase.get(target_id) }

    pub fn earliest_target(&self) -> &str { &self.earliest_target }

    pub fn latest_target(&self) -> &str { &self.latest_target }
}
