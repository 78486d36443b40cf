//! Interfaces to the external orbital-dynamics engine.
//!
//! The planner only consumes data through the traits defined here. Trajectory and access data are
//! read synchronously by the planning stages, while positions are requested through a single
//! owning worker (see [`crate::position_sync::PositionChannel`]), which is why
//! [`PositionProvider`] takes `&mut self`.

mod provider_types;
mod scenario_provider;


use std::time::Duration;

pub use provider_types::{
    Coordinate, PositionQuery, ProviderError, RawAccessWindow, TargetTrajectory, TrajectorySample,
};
pub use scenario_provider::{ScenarioData, ScenarioProvider};

/// Source of per-target trajectory samples.
pub trait TrajectoryProvider: Send + Sync {
    fn trajectory(&self, target_id: &str) -> Result<TargetTrajectory, ProviderError>;
}

/// Source of observer/target access windows.
pub trait AccessProvider: Send + Sync {
    fn access_windows(
        &self,
        observer_id: &str,
        target_id: &str,
    ) -> Result<Vec<RawAccessWindow>, ProviderError>;
}

/// Source of observer positions. Implementations may be thread-affine and blocking.
pub trait PositionProvider: Send + 'static {
    /// Returns the position of `query.observer_id` at `query.sample_time`.
    ///
    /// # Arguments
    /// - `query`: The observer and the requested instant.
    /// - `timeout`: The time budget the caller will wait for this answer.
    ///
    /// # Returns
    /// `Ok(None)` if the provider has no position for that instant.
    fn position_at(
        &mut self,
        query: &PositionQuery,
        timeout: Duration,
    ) -> Result<Option<Coordinate>, ProviderError>;
}
