//! The planning run: ties trajectory data, the task grid, visibility and position sync together.

mod output;
mod planning_run;
mod run_metadata;
mod trajectory_cache;


pub use output::{PairPlan, PlanningOutput, TargetPlan, VisibleTask};
pub use planning_run::{MetaTaskPlanner, PlanningError, PlanningRequest};
pub use run_metadata::{PlanningStage, RunMetadata, StageTimings};
pub use trajectory_cache::TrajectoryCache;
