use super::provider_actor::{PositionChannel, SampleOutcome};
use super::sampling::sample_times;
use super::statistics::PositionStatistics;
use crate::providers::{Coordinate, PositionQuery};
use crate::util::{PositionSyncConfig, TimeInterval, delta_secs};
use crate::{event, info, log, warn};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::ops::AddAssign;
use tokio_util::sync::CancellationToken;

/// A visible task whose observer positions should be sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub observer_id: String,
    pub target_id: String,
    pub task_id: String,
    pub interval: TimeInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSample {
    pub sample_time: DateTime<Utc>,
    /// Seconds since the start of the planning window.
    pub offset_from_window_start: f64,
    /// Seconds since the start of the task.
    pub task_relative_offset: f64,
    pub position: Coordinate,
}

/// Sampled observer positions for one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSyncResult {
    pub task_id: String,
    pub observer_id: String,
    pub target_id: String,
    pub samples: Vec<PositionSample>,
    pub statistics: PositionStatistics,
    pub requested: usize,
    pub succeeded: usize,
}

impl PositionSyncResult {
    /// Share of successful samples in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.requested == 0 { 0.0 } else { self.succeeded as f64 / self.requested as f64 * 100.0 }
    }
}

/// Counters over all jobs of a synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncCounters {
    pub tasks_requested: usize,
    pub tasks_processed: usize,
    pub tasks_synced: usize,
    pub tasks_without_samples: usize,
    pub tasks_skipped: usize,
    pub samples_requested: usize,
    pub samples_succeeded: usize,
    pub samples_empty: usize,
    pub samples_failed: usize,
    pub samples_timed_out: usize,
}

impl AddAssign for SyncCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.tasks_requested += rhs.tasks_requested;
        self.tasks_processed += rhs.tasks_processed;
        self.tasks_synced += rhs.tasks_synced;
        self.tasks_without_samples += rhs.tasks_without_samples;
        self.tasks_skipped += rhs.tasks_skipped;
        self.samples_requested += rhs.samples_requested;
        self.samples_succeeded += rhs.samples_succeeded;
        self.samples_empty += rhs.samples_empty;
        self.samples_failed += rhs.samples_failed;
        self.samples_timed_out += rhs.samples_timed_out;
    }
}

/// Results of [`PositionSynchronizer::synchronize`], aligned with the submitted jobs.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub results: Vec<Option<PositionSyncResult>>,
    pub counters: SyncCounters,
    pub cancelled: bool,
}

/// Samples observer positions for visible tasks in bounded batches.
#[derive(Debug, Clone)]
pub struct PositionSynchronizer {
    config: PositionSyncConfig,
    window_start: DateTime<Utc>,
}

impl PositionSynchronizer {
    /// # Arguments
    /// - `config`: Sampling interval, per-task cap and batch size.
    /// - `window_start`: Reference for the `offset_from_window_start` of each sample.
    pub fn new(config: PositionSyncConfig, window_start: DateTime<Utc>) -> Self { Self { config, window_start } }

    /// Synchronizes all `jobs`, one batch at a time.
    ///
    /// Cancellation is checked between batches. A batch that already started runs to completion,
    /// the remaining jobs are counted as skipped.
    pub async fn synchronize(
        &self,
        channel: &PositionChannel,
        jobs: &[SyncJob],
        cancel: &CancellationToken,
    ) -> SyncReport {
        let mut results = Vec::with_capacity(jobs.len());
        let mut counters = SyncCounters { tasks_requested: jobs.len(), ..SyncCounters::default() };
        let mut cancelled = false;
        let batch_count = jobs.len().div_ceil(self.config.batch_size.max(1));

        for (i, batch) in jobs.chunks(self.config.batch_size.max(1)).enumerate() {
            if cancel.is_cancelled() {
                warn!("Position sync cancelled before batch {}/{batch_count}", i + 1);
                cancelled = true;
                break;
            }
            log!("Position sync batch {}/{batch_count} with {} tasks", i + 1, batch.len());
            let outcomes = join_all(batch.iter().map(|job| self.sync_job(channel, job))).await;
            for (result, job_counters) in outcomes {
                counters += job_counters;
                results.push(result);
            }
        }
        counters.tasks_skipped = jobs.len() - results.len();
        results.resize(jobs.len(), None);
        info!(
            "Position sync finished: {}/{} tasks synced, {}/{} samples, {} timeouts",
            counters.tasks_synced,
            counters.tasks_requested,
            counters.samples_succeeded,
            counters.samples_requested,
            counters.samples_timed_out
        );
        SyncReport { results, counters, cancelled }
    }

    async fn sync_job(&self, channel: &PositionChannel, job: &SyncJob) -> (Option<PositionSyncResult>, SyncCounters) {
        let times = sample_times(job.interval, self.config.sample_interval(), self.config.max_samples_per_task);
        let mut counters =
            SyncCounters { tasks_processed: 1, samples_requested: times.len(), ..SyncCounters::default() };
        let mut samples = Vec::with_capacity(times.len());

        // samples of one task are requested in order, tasks of a batch interleave on the channel
        for sample_time in times {
            let query = PositionQuery {
                observer_id: job.observer_id.clone(),
                sample_time,
                window_offset: sample_time - self.window_start,
            };
            match channel.request(query).await {
                SampleOutcome::Position(position) => {
                    counters.samples_succeeded += 1;
                    samples.push(PositionSample {
                        sample_time,
                        offset_from_window_start: delta_secs(sample_time - self.window_start),
                        task_relative_offset: delta_secs(sample_time - job.interval.start()),
                        position,
                    });
                }
                SampleOutcome::Empty => counters.samples_empty += 1,
                SampleOutcome::Failed(e) => {
                    counters.samples_failed += 1;
                    event!("Sample {sample_time} of {} failed: {e:?}", job.task_id);
                }
                SampleOutcome::TimedOut => {
                    counters.samples_timed_out += 1;
                    event!("Sample {sample_time} of {} timed out", job.task_id);
                }
            }
        }
        samples.sort_by_key(|s| s.sample_time);

        let Some(statistics) = PositionStatistics::from_samples(&samples, self.config.cartesian_magnitude_threshold)
        else {
            warn!(
                "No positions for {} of {} -> {}, {} samples requested",
                job.task_id, job.observer_id, job.target_id, counters.samples_requested
            );
            counters.tasks_without_samples = 1;
            return (None, counters);
        };
        counters.tasks_synced = 1;
        let result = PositionSyncResult {
            task_id: job.task_id.clone(),
            observer_id: job.observer_id.clone(),
            target_id: job.target_id.clone(),
            requested: counters.samples_requested,
            succeeded: samples.len(),
            samples,
            statistics,
        };
        (Some(result), counters)
    }
}
