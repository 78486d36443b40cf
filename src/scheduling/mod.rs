//! Grid generation, planning cycle resolution and timeline construction.

mod atomic_task;
mod flight_phase;
mod gap_filler;
mod planning_cycle;
mod target_position;
mod task_grid;

#[cfg(test)]
mod tests;

pub use atomic_task::{AtomicTask, TaskKind};
pub use flight_phase::{FlightPhases, PhaseResolver, PhaseSource, ResolvedTrajectory, TrajectoryPoint};
pub use gap_filler::{SegmentOrigin, Timeline, TimelineError, TimelineSegment};
pub use planning_cycle::PlanningCycle;
pub use target_position::{MetaTaskEntry, TargetFix};
pub use task_grid::TaskGrid;
