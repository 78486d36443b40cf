use super::output::{PairPlan, PlanningOutput, TargetPlan, VisibleTask};
use super::run_metadata::{PlanningStage, RunMetadata};
use super::trajectory_cache::TrajectoryCache;
use crate::keychain::Keychain;
use crate::position_sync::{PositionChannel, PositionSynchronizer, SyncJob};
use crate::providers::ProviderError;
use crate::scheduling::{
    FlightPhases, MetaTaskEntry, PhaseResolver, PhaseSource, PlanningCycle, TaskGrid, Timeline,
    TimelineError,
};
use crate::util::{ConfigError, PlannerConfig};
use crate::visibility::{AccessWindow, ConstellationSummary, ParsedWindows, VisibilityClassifier};
use crate::{error, info, log, stage, warn};
use chrono::Utc;
use std::time::Instant;
use strum_macros::Display;

/// A set of observers and targets to plan for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningRequest {
    pub observer_ids: Vec<String>,
    pub target_ids: Vec<String>,
}

#[derive(Debug, Display)]
pub enum PlanningError {
    /// Not a single target yielded a flight phase.
    Unresolvable,
    InvalidConfig(ConfigError),
    /// Internal inconsistency while building a timeline.
    Timeline(TimelineError),
}

impl std::error::Error for PlanningError {}

impl From<TimelineError> for PlanningError {
    fn from(value: TimelineError) -> Self { PlanningError::Timeline(value) }
}

/// Runs the planning pipeline: cycle resolution, task grid, visibility and position sync.
pub struct MetaTaskPlanner {
    cache: TrajectoryCache,
}

impl MetaTaskPlanner {
    pub fn new() -> Self { Self { cache: TrajectoryCache::new() } }

    /// Executes a complete planning run including position synchronization.
    ///
    /// # Arguments
    /// - `keychain`: Providers, configuration and cancellation token.
    /// - `request`: Observers and targets to plan for.
    /// - `positions`: Channel to the position worker.
    ///
    /// # Returns
    /// The planning output, or a [`PlanningError`] if no target could be resolved.
    pub async fn run(
        &mut self,
        keychain: &Keychain,
        request: &PlanningRequest,
        positions: &PositionChannel,
    ) -> Result<PlanningOutput, PlanningError> {
        let mut output = self.plan(keychain, request)?;
        Self::synchronize_positions(keychain, &mut output, positions).await;
        Ok(output)
    }

    /// Executes the synchronous stages of a run. The trajectory cache is cleared first.
    pub fn plan(&mut self, keychain: &Keychain, request: &PlanningRequest) -> Result<PlanningOutput, PlanningError> {
        let config = keychain.config();
        config.validate().map_err(PlanningError::InvalidConfig)?;
        self.cache.clear();
        let mut metadata = RunMetadata {
            started_at: Some(Utc::now()),
            targets_requested: request.target_ids.len(),
            observers: request.observer_ids.len(),
            ..RunMetadata::default()
        };

        stage!("Resolving planning cycle for {} targets", request.target_ids.len());
        let timer = Instant::now();
        let phases = self.resolve_phases(keychain, request, &mut metadata);
        let cycle = PlanningCycle::from_phases(&phases, &config.standardization).ok_or_else(|| {
            error!("None of the {} targets could be resolved", request.target_ids.len());
            PlanningError::Unresolvable
        })?;
        metadata.planning_duration_hours = cycle.interval().duration_secs() / 3600.0;
        metadata.timings.record(PlanningStage::CycleResolution, elapsed_ms(timer));

        stage!("Generating atomic tasks over {}", cycle.interval());
        let timer = Instant::now();
        let targets = self.build_targets(&config, &cycle, phases, &mut metadata)?;
        metadata.timings.record(PlanningStage::TaskGrid, elapsed_ms(timer));

        stage!("Classifying visibility for {} observers", request.observer_ids.len());
        let timer = Instant::now();
        let (pairs, constellation) = Self::build_pairs(keychain, &config, &cycle, request, &targets, &mut metadata)?;
        metadata.timings.record(PlanningStage::Visibility, elapsed_ms(timer));

        info!(
            "Planned {} tasks ({} real, {} virtual), {} visible over {} pairs",
            metadata.total_tasks, metadata.real_tasks, metadata.virtual_tasks, metadata.visible_tasks, metadata.pairs
        );
        Ok(PlanningOutput { cycle, targets, pairs, constellation, metadata })
    }

    /// Samples observer positions for every visible task and attaches the results to the pair
    /// timelines. Tasks without a single successful sample stay without a result.
    pub async fn synchronize_positions(keychain: &Keychain, output: &mut PlanningOutput, positions: &PositionChannel) {
        let config = keychain.config();
        stage!("Synchronizing observer positions");
        let timer = Instant::now();
        let jobs = output
            .pairs
            .iter()
            .flat_map(|pair| {
                pair.timeline.real_payloads().map(|visible| SyncJob {
                    observer_id: pair.observer_id.clone(),
                    target_id: pair.target_id.clone(),
                    task_id: visible.record.task().id().to_string(),
                    interval: visible.record.task().interval(),
                })
            })
            .collect::<Vec<_>>();

        let synchronizer = PositionSynchronizer::new(config.position_sync.clone(), output.cycle.interval().start());
        let report = synchronizer.synchronize(positions, &jobs, &keychain.cancel_token()).await;

        let mut results = report.results.into_iter();
        for pair in &mut output.pairs {
            for (visible, result) in pair.timeline.real_payloads_mut().zip(results.by_ref()) {
                visible.position_sync = result;
            }
        }
        let metadata = &mut output.metadata;
        metadata.total_positions_collected = report.counters.samples_succeeded;
        metadata.position_sync = report.counters;
        metadata.cancelled = report.cancelled;
        metadata.timings.record(PlanningStage::PositionSync, elapsed_ms(timer));
        if report.cancelled {
            warn!("Run cancelled, {} tasks left without positions", report.counters.tasks_skipped);
        }
    }

    pub fn cache(&self) -> &TrajectoryCache { &self.cache }

    fn resolve_phases(
        &mut self,
        keychain: &Keychain,
        request: &PlanningRequest,
        metadata: &mut RunMetadata,
    ) -> Vec<FlightPhases> {
        let config = keychain.config();
        let resolver = PhaseResolver::new(config.phase.clone());
        let provider = keychain.trajectories();
        let mut phases = Vec::with_capacity(request.target_ids.len());
        for target_id in &request.target_ids {
            let trajectory = match self.cache.get_or_fetch(provider.as_ref(), target_id) {
                Ok(trajectory) => trajectory,
                Err(e) => {
                    warn!("Trajectory of {target_id} unavailable: {e:?}");
                    metadata.trajectory_fetch_failures += 1;
                    metadata.unresolved_targets.push(target_id.clone());
                    continue;
                }
            };
            metadata.trajectory_samples_skipped += trajectory.skipped_samples();
            match resolver.resolve(trajectory) {
                Some(p) => {
                    if p.source != PhaseSource::AltitudeAnalysis {
                        metadata.targets_from_fallback += 1;
                    }
                    phases.push(p);
                }
                None => metadata.unresolved_targets.push(target_id.clone()),
            }
        }
        metadata.targets_resolved = phases.len();
        phases
    }

    fn build_targets(
        &self,
        config: &PlannerConfig,
        cycle: &PlanningCycle,
        phases: Vec<FlightPhases>,
        metadata: &mut RunMetadata,
    ) -> Result<Vec<TargetPlan>, PlanningError> {
        let grid = TaskGrid::generate(cycle.interval(), config.grid.task_width(), config.grid.max_tasks)
            .ok_or_else(|| PlanningError::InvalidConfig(ConfigError::Invalid("grid width".to_string())))?;
        metadata.grid_truncated = grid.truncated();

        let mut targets = Vec::with_capacity(phases.len());
        for phases in phases {
            let target_id = phases.target_id.clone();
            let tasks = grid
                .tasks_for(&target_id, &phases.critical)
                .into_iter()
                .map(|task| MetaTaskEntry::new(task, self.cache.get(&target_id), &config.target_position))
                .collect::<Vec<_>>();
            let real = tasks
                .iter()
                .filter(|e| e.task.is_real())
                .map(|e| (e.task.interval(), e.task.id().to_string()));
            let timeline = Timeline::fill_gaps(cycle.interval(), real)?;
            let real_count = tasks.iter().filter(|e| e.task.is_real()).count();
            let virtual_count = tasks.len() - real_count;
            log!("{target_id}: {} atomic tasks, {real_count} real, {virtual_count} virtual", tasks.len());

            metadata.total_tasks += tasks.len();
            metadata.real_tasks += real_count;
            metadata.virtual_tasks += virtual_count;
            targets.push(TargetPlan { target_id, phases, tasks, timeline, real_count, virtual_count });
        }
        Ok(targets)
    }

    fn build_pairs(
        keychain: &Keychain,
        config: &PlannerConfig,
        cycle: &PlanningCycle,
        request: &PlanningRequest,
        targets: &[TargetPlan],
        metadata: &mut RunMetadata,
    ) -> Result<(Vec<PairPlan>, ConstellationSummary), PlanningError> {
        let classifier = VisibilityClassifier::new(&config.visibility);
        let access = keychain.access();
        let pair_count = request.observer_ids.len() * targets.len();
        let mut pair_visibility = Vec::with_capacity(pair_count);
        let mut pairs = Vec::with_capacity(pair_count);

        for observer_id in &request.observer_ids {
            for target in targets {
                let (parsed, access_failed) = match access.access_windows(observer_id, &target.target_id) {
                    Ok(raw) => (AccessWindow::parse_all(&raw), false),
                    Err(e) => {
                        Self::log_access_failure(observer_id, &target.target_id, &e);
                        (ParsedWindows::default(), true)
                    }
                };
                let ParsedWindows { windows, skipped } = parsed;
                metadata.windows_parsed += windows.len();
                metadata.windows_skipped += skipped;
                metadata.access_failures += usize::from(access_failed);

                let tasks = target.tasks.iter().map(|e| e.task.clone()).collect::<Vec<_>>();
                let visibility = classifier.classify_pair(observer_id, &target.target_id, &tasks, &windows);
                let real = visibility
                    .records
                    .iter()
                    .filter(|r| r.is_visible())
                    .map(|r| (r.task().interval(), VisibleTask { record: r.clone(), position_sync: None }));
                let timeline = Timeline::fill_gaps(cycle.interval(), real)?;
                metadata.visible_tasks += visibility.summary.visible;

                pairs.push(PairPlan {
                    observer_id: observer_id.clone(),
                    target_id: target.target_id.clone(),
                    summary: visibility.summary,
                    windows_parsed: windows.len(),
                    windows_skipped: skipped,
                    access_failed,
                    records: Vec::new(),
                    timeline,
                });
                pair_visibility.push(visibility);
            }
        }
        metadata.pairs = pairs.len();
        let constellation = ConstellationSummary::from_pairs(&pair_visibility);
        for (pair, visibility) in pairs.iter_mut().zip(pair_visibility) {
            pair.records = visibility.records;
        }
        Ok((pairs, constellation))
    }

    fn log_access_failure(observer_id: &str, target_id: &str, e: &ProviderError) {
        warn!("Access windows for {observer_id} -> {target_id} unavailable, treating as none: {e:?}");
    }
}

impl Default for MetaTaskPlanner {
    fn default() -> Self { Self::new() }
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_ms(start: Instant) -> f64 { start.elapsed().as_secs_f64() * 1000.0 }
