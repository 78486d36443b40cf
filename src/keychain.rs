use crate::providers::{AccessProvider, TrajectoryProvider};
use crate::util::PlannerConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Struct bundling the collaborators of a planning run: the data providers of the geometry engine,
/// the run configuration and the cancellation token shared with the position synchronizer.
///
/// The position provider is not part of the keychain, it is owned by the position worker.
#[derive(Clone)]
pub struct Keychain {
    /// Source of target trajectories.
    trajectories: Arc<dyn TrajectoryProvider>,
    /// Source of observer/target access windows.
    access: Arc<dyn AccessProvider>,
    /// The validated configuration.
    config: Arc<PlannerConfig>,
    /// Cancels outstanding position sync batches.
    cancel: CancellationToken,
}

impl Keychain {
    /// Creates a new instance of `Keychain`.
    ///
    /// # Arguments
    /// - `trajectories`: The trajectory provider.
    /// - `access`: The access window provider.
    /// - `config`: The planner configuration, expected to be validated.
    pub fn new(
        trajectories: Arc<dyn TrajectoryProvider>,
        access: Arc<dyn AccessProvider>,
        config: PlannerConfig,
    ) -> Self {
        Self { trajectories, access, config: Arc::new(config), cancel: CancellationToken::new() }
    }

    /// Provides a cloned reference to the trajectory provider.
    pub fn trajectories(&self) -> Arc<dyn TrajectoryProvider> { Arc::clone(&self.trajectories) }

    /// Provides a cloned reference to the access provider.
    pub fn access(&self) -> Arc<dyn AccessProvider> { Arc::clone(&self.access) }

    /// Provides a cloned reference to the configuration.
    pub fn config(&self) -> Arc<PlannerConfig> { Arc::clone(&self.config) }

    /// Provides a clone of the run cancellation token.
    pub fn cancel_token(&self) -> CancellationToken { self.cancel.clone() }
}
