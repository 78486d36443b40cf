use super::atomic_task::AtomicTask;
use crate::util::TimeInterval;
use crate::warn;
use chrono::TimeDelta;

/// Partition of a planning window into consecutive fixed-width slots.
///
/// All slots have the configured width except the last one, which is clipped to the window end.
/// If the slot cap is reached the grid stops early and `truncated` is set.
#[derive(Debug, Clone)]
pub struct TaskGrid {
    window: TimeInterval,
    width: TimeDelta,
    slots: Vec<TimeInterval>,
    truncated: bool,
}

impl TaskGrid {
    /// Generates the grid for `window`.
    ///
    /// # Arguments
    /// - `window`: The interval to partition.
    /// - `width`: The slot width, has to be positive.
    /// - `max_tasks`: Upper bound on the number of slots.
    ///
    /// # Returns
    /// `None` if `width` is not positive.
    pub fn generate(window: TimeInterval, width: TimeDelta, max_tasks: usize) -> Option<Self> {
        if width <= TimeDelta::zero() {
            return None;
        }
        let mut slots = Vec::new();
        let mut cursor = window.start();
        let mut truncated = false;
        while cursor < window.end() {
            if slots.len() >= max_tasks {
                truncated = true;
                break;
            }
            // an unrepresentable slot end lies past the window end as well
            let end = cursor.checked_add_signed(width).map_or(window.end(), |e| e.min(window.end()));
            // cursor < end holds since cursor < window.end() and width > 0
            slots.extend(TimeInterval::new(cursor, end));
            cursor = end;
        }
        if truncated {
            warn!(
                "Task grid for {window} capped at {max_tasks} slots, {} remain uncovered",
                window.end() - cursor
            );
        }
        Some(Self { window, width, slots, truncated })
    }

    pub fn window(&self) -> TimeInterval { self.window }

    pub fn width(&self) -> TimeDelta { self.width }

    pub fn slots(&self) -> &[TimeInterval] { &self.slots }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn truncated(&self) -> bool { self.truncated }

    /// Instantiates the grid for a single target, tagging each slot as real or virtual.
    pub fn tasks_for(&self, target_id: &str, critical_phase: &TimeInterval) -> Vec<AtomicTask> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| AtomicTask::new(i + 1, *slot, target_id, critical_phase))
            .collect()
    }
}
