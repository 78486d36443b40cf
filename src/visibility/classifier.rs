use super::access_window::AccessWindow;
use crate::log;
use crate::scheduling::AtomicTask;
use crate::util::{CoveragePolicy, TimeInterval, VisibilityConfig};
use chrono::TimeDelta;
use itertools::Itertools;
use serde::Serialize;
use std::borrow::Cow;

/// Observability of a single atomic task for one observer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityRecord {
    task: AtomicTask,
    is_visible: bool,
    overlapping_windows: Vec<TimeInterval>,
    coverage_ratio: f64,
}

impl VisibilityRecord {
    pub fn task(&self) -> &AtomicTask { &self.task }

    pub fn is_visible(&self) -> bool { self.is_visible }

    /// The access windows intersecting the task, clipped to the task bounds.
    pub fn overlapping_windows(&self) -> &[TimeInterval] { &self.overlapping_windows }

    pub fn coverage_ratio(&self) -> f64 { self.coverage_ratio }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilitySummary {
    pub total: usize,
    pub visible: usize,
    pub virtual_count: usize,
    pub visibility_ratio: f64,
}

/// All visibility records of one observer/target pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairVisibility {
    pub observer_id: String,
    pub target_id: String,
    pub records: Vec<VisibilityRecord>,
    pub summary: VisibilitySummary,
}

/// Aggregate over all pairs of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConstellationSummary {
    pub observer_count: usize,
    pub target_count: usize,
    pub total_visible: usize,
    pub total_virtual: usize,
    pub visibility_ratio: f64,
    pub avg_visible_per_observer: f64,
    pub avg_virtual_per_observer: f64,
}

/// Decides for each atomic task whether it can be observed within a set of access windows.
#[derive(Debug, Clone)]
pub struct VisibilityClassifier {
    policy: CoveragePolicy,
    minimum_overlap_ratio: f64,
    merge_adjacent_windows: bool,
}

impl VisibilityClassifier {
    pub fn new(config: &VisibilityConfig) -> Self {
        Self {
            policy: config.coverage_policy,
            minimum_overlap_ratio: config.minimum_overlap_ratio,
            merge_adjacent_windows: config.merge_adjacent_windows,
        }
    }

    pub fn policy(&self) -> CoveragePolicy { self.policy }

    /// Classifies a single task.
    ///
    /// # Arguments
    /// - `task`: The task to classify.
    /// - `windows`: The access windows of the pair, in any order.
    ///
    /// # Returns
    /// A [`VisibilityRecord`] with the clipped overlapping windows and the capped coverage ratio.
    pub fn classify(&self, task: &AtomicTask, windows: &[AccessWindow]) -> VisibilityRecord {
        let windows = self.prepare(windows);
        Self::classify_prepared(self.policy, self.minimum_overlap_ratio, task, &windows)
    }

    /// Classifies all tasks of a pair and builds the pair summary.
    pub fn classify_pair(
        &self,
        observer_id: &str,
        target_id: &str,
        tasks: &[AtomicTask],
        windows: &[AccessWindow],
    ) -> PairVisibility {
        let windows = self.prepare(windows);
        let records = tasks
            .iter()
            .map(|t| Self::classify_prepared(self.policy, self.minimum_overlap_ratio, t, &windows))
            .collect::<Vec<_>>();
        let summary = VisibilitySummary::from_records(&records);
        log!(
            "{observer_id} -> {target_id}: {}/{} tasks visible ({:.1}%) under {} policy",
            summary.visible,
            summary.total,
            summary.visibility_ratio * 100.0,
            self.policy
        );
        PairVisibility { observer_id: observer_id.to_string(), target_id: target_id.to_string(), records, summary }
    }

    fn prepare<'a>(&self, windows: &'a [AccessWindow]) -> Cow<'a, [AccessWindow]> {
        if self.merge_adjacent_windows {
            Cow::Owned(AccessWindow::merge_touching(windows))
        } else {
            Cow::Borrowed(windows)
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn classify_prepared(
        policy: CoveragePolicy,
        minimum_overlap_ratio: f64,
        task: &AtomicTask,
        windows: &[AccessWindow],
    ) -> VisibilityRecord {
        let span = task.interval();
        let overlapping_windows = windows
            .iter()
            .filter_map(|w| w.interval().intersection(&span))
            .sorted()
            .collect::<Vec<_>>();
        let covered: TimeDelta = overlapping_windows.iter().map(TimeInterval::duration).sum();

        let coverage_ratio = if covered >= span.duration() {
            1.0
        } else {
            let covered_ns = covered.num_nanoseconds().unwrap_or(i64::MAX) as f64;
            let span_ns = span.duration().num_nanoseconds().unwrap_or(i64::MAX) as f64;
            (covered_ns / span_ns).clamp(0.0, 1.0)
        };
        let is_visible = !overlapping_windows.is_empty()
            && match policy {
                CoveragePolicy::Complete => windows.iter().any(|w| w.interval().contains_interval(&span)),
                CoveragePolicy::Partial => coverage_ratio >= minimum_overlap_ratio,
            };
        VisibilityRecord { task: task.clone(), is_visible, overlapping_windows, coverage_ratio }
    }
}

impl VisibilitySummary {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[VisibilityRecord]) -> Self {
        let total = records.len();
        let visible = records.iter().filter(|r| r.is_visible).count();
        let visibility_ratio = if total == 0 { 0.0 } else { visible as f64 / total as f64 };
        Self { total, visible, virtual_count: total - visible, visibility_ratio }
    }
}

impl ConstellationSummary {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_pairs(pairs: &[PairVisibility]) -> Self {
        let observer_count = pairs.iter().map(|p| &p.observer_id).unique().count();
        let target_count = pairs.iter().map(|p| &p.target_id).unique().count();
        let total_visible = pairs.iter().map(|p| p.summary.visible).sum::<usize>();
        let total_virtual = pairs.iter().map(|p| p.summary.virtual_count).sum::<usize>();
        let total = total_visible + total_virtual;
        let per_observer = |n: usize| if observer_count == 0 { 0.0 } else { n as f64 / observer_count as f64 };
        Self {
            observer_count,
            target_count,
            total_visible,
            total_virtual,
            visibility_ratio: if total == 0 { 0.0 } else { total_visible as f64 / total as f64 },
            avg_visible_per_observer: per_observer(total_visible),
            avg_virtual_per_observer: per_observer(total_virtual),
        }
    }
}
