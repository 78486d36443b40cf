//! Observer position sampling for visible tasks.
//!
//! The position provider is moved onto a single blocking worker ([`PositionChannel::spawn`]);
//! every sample request of a run is serialized through it.

mod provider_actor;
mod sampling;
mod statistics;
mod synchronizer;


pub use provider_actor::{PositionChannel, PositionWorker, ProviderStats, SampleOutcome};
pub use sampling::sample_times;
pub use statistics::{AxisRange, CoordinateFrame, PositionStatistics};
pub use synchronizer::{
    PositionSample, PositionSyncResult, PositionSynchronizer, SyncCounters, SyncJob, SyncReport,
};
