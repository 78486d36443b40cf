use crate::util::TimeInterval;
use serde::Serialize;
use strum_macros::Display;

/// Whether an atomic task falls into the owner's critical flight phase.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskKind {
    Real,
    Virtual,
}

/// A fixed-width slot of the planning grid, owned by one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AtomicTask {
    id: String,
    sequence_index: usize,
    interval: TimeInterval,
    owner_target_id: String,
    kind: TaskKind,
}

impl AtomicTask {
    /// Creates a task for slot `sequence_index` (1-based) of the grid.
    ///
    /// # Arguments
    /// - `sequence_index`: Position of the slot in the grid, starting at 1.
    /// - `interval`: The slot itself.
    /// - `owner_target_id`: The target this task belongs to.
    /// - `critical_phase`: The owner's critical phase, used to derive the task kind.
    pub fn new(
        sequence_index: usize,
        interval: TimeInterval,
        owner_target_id: &str,
        critical_phase: &TimeInterval,
    ) -> Self {
        let kind = if interval.overlaps(critical_phase) { TaskKind::Real } else { TaskKind::Virtual };
        Self {
            id: Self::format_id(sequence_index),
            sequence_index,
            interval,
            owner_target_id: owner_target_id.to_string(),
            kind,
        }
    }

    /// The canonical id of the slot with the given index, e.g. `atomic_task_007`.
    pub fn format_id(sequence_index: usize) -> String { format!("atomic_task_{sequence_index:03}") }

    pub fn id(&self) -> &str { &self.id }

    pub fn sequence_index(&self) -> usize { self.sequence_index }

    pub fn interval(&self) -> TimeInterval { self.interval }

    pub fn owner_target_id(&self) -> &str { &self.owner_target_id }

    pub fn kind(&self) -> TaskKind { self.kind }

    pub fn is_real(&self) -> bool { self.kind == TaskKind::Real }
}
