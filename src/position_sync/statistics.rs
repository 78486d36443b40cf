use super::synchronizer::PositionSample;
use itertools::Itertools;
use serde::Serialize;
use strum_macros::Display;

/// Frame guess for a sample series, based on coordinate magnitudes.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoordinateFrame {
    Cartesian,
    Lla,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn span(&self) -> f64 { self.max - self.min }
}

/// Summary of the positions sampled for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStatistics {
    pub sample_count: usize,
    pub frame: CoordinateFrame,
    pub ranges: [AxisRange; 3],
    /// Sum of straight line distances between consecutive samples, Cartesian-like series only.
    pub path_length: Option<f64>,
}

impl PositionStatistics {
    /// # Arguments
    /// - `samples`: The samples in time order.
    /// - `cartesian_threshold`: Largest absolute first component above which the series counts as Cartesian.
    ///
    /// # Returns
    /// `None` for an empty series.
    pub fn from_samples(samples: &[PositionSample], cartesian_threshold: f64) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let components = samples.iter().map(|s| s.position.components()).collect::<Vec<_>>();
        let range = |axis: usize| {
            components.iter().map(|c| c[axis]).fold(
                AxisRange { min: f64::INFINITY, max: f64::NEG_INFINITY },
                |acc, v| AxisRange { min: acc.min.min(v), max: acc.max.max(v) },
            )
        };
        let max_abs_first = components.iter().map(|c| c[0].abs()).fold(0.0, f64::max);
        let frame =
            if max_abs_first > cartesian_threshold { CoordinateFrame::Cartesian } else { CoordinateFrame::Lla };
        let path_length = (frame == CoordinateFrame::Cartesian).then(|| {
            components
                .iter()
                .tuple_windows()
                .map(|(a, b)| {
                    let d = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
                    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
                })
                .sum()
        });
        Some(Self { sample_count: samples.len(), frame, ranges: [range(0), range(1), range(2)], path_length })
    }
}
