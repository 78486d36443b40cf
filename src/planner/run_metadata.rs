use crate::position_sync::SyncCounters;
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{Display, EnumIter};

#[derive(Debug, Display, EnumIter, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanningStage {
    CycleResolution,
    TaskGrid,
    Visibility,
    PositionSync,
}

/// Wall clock time spent per stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub cycle_resolution_ms: f64,
    pub task_grid_ms: f64,
    pub visibility_ms: f64,
    pub position_sync_ms: f64,
}

impl StageTimings {
    pub fn record(&mut self, stage: PlanningStage, ms: f64) {
        match stage {
            PlanningStage::CycleResolution => self.cycle_resolution_ms += ms,
            PlanningStage::TaskGrid => self.task_grid_ms += ms,
            PlanningStage::Visibility => self.visibility_ms += ms,
            PlanningStage::PositionSync => self.position_sync_ms += ms,
        }
    }

    pub fn get(&self, stage: PlanningStage) -> f64 {
        match stage {
            PlanningStage::CycleResolution => self.cycle_resolution_ms,
            PlanningStage::TaskGrid => self.task_grid_ms,
            PlanningStage::Visibility => self.visibility_ms,
            PlanningStage::PositionSync => self.position_sync_ms,
        }
    }

    pub fn total_ms(&self) -> f64 {
        self.cycle_resolution_ms + self.task_grid_ms + self.visibility_ms + self.position_sync_ms
    }
}

/// Counters and flags describing how complete a planning run is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetadata {
    pub started_at: Option<DateTime<Utc>>,
    pub targets_requested: usize,
    pub targets_resolved: usize,
    pub targets_from_fallback: usize,
    pub unresolved_targets: Vec<String>,
    pub trajectory_fetch_failures: usize,
    pub trajectory_samples_skipped: usize,
    pub observers: usize,
    pub pairs: usize,
    pub planning_duration_hours: f64,
    pub grid_truncated: bool,
    pub total_tasks: usize,
    pub real_tasks: usize,
    pub virtual_tasks: usize,
    pub visible_tasks: usize,
    pub windows_parsed: usize,
    pub windows_skipped: usize,
    pub access_failures: usize,
    pub position_sync: SyncCounters,
    pub total_positions_collected: usize,
    pub cancelled: bool,
    pub timings: StageTimings,
}
