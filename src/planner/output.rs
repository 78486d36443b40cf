use super::run_metadata::RunMetadata;
use crate::position_sync::PositionSyncResult;
use crate::scheduling::{FlightPhases, MetaTaskEntry, PlanningCycle, Timeline};
use crate::visibility::{ConstellationSummary, VisibilityRecord, VisibilitySummary};
use serde::Serialize;

/// Task list and meta-task timeline of one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetPlan {
    pub target_id: String,
    pub phases: FlightPhases,
    /// All atomic tasks of the target, real and virtual, with target positions at their bounds.
    pub tasks: Vec<MetaTaskEntry>,
    /// Real tasks by id, with virtual filler over the rest of the cycle.
    pub timeline: Timeline<String>,
    pub real_count: usize,
    pub virtual_count: usize,
}

/// Payload of a real segment in a pair timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleTask {
    pub record: VisibilityRecord,
    pub position_sync: Option<PositionSyncResult>,
}

/// Visibility timeline of one observer/target pair.
#[derive(Debug, Clone, Serialize)]
pub struct PairPlan {
    pub observer_id: String,
    pub target_id: String,
    pub summary: VisibilitySummary,
    pub windows_parsed: usize,
    pub windows_skipped: usize,
    pub access_failed: bool,
    /// One record per atomic task of the target, visible or not, in grid order.
    pub records: Vec<VisibilityRecord>,
    pub timeline: Timeline<VisibleTask>,
}

/// Everything a planning run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PlanningOutput {
    pub cycle: PlanningCycle,
    pub targets: Vec<TargetPlan>,
    pub pairs: Vec<PairPlan>,
    pub constellation: ConstellationSummary,
    pub metadata: RunMetadata,
}

impl PlanningOutput {
    pub fn target(&self, target_id: &str) -> Option<&TargetPlan> {
        self.targets.iter().find(|t| t.target_id == target_id)
    }

    /// The visibility record of `task_id` in the given pair.
    pub fn record(&self, observer_id: &str, target_id: &str, task_id: &str) -> Option<&VisibilityRecord> {
        self.pair(observer_id, target_id)?.records.iter().find(|r| r.task().id() == task_id)
    }

    pub fn pair(&self, observer_id: &str, target_id: &str) -> Option<&PairPlan> {
        self.pairs.iter().find(|p| p.observer_id == observer_id && p.target_id == target_id)
    }
}
