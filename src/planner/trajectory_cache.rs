use crate::providers::{ProviderError, TrajectoryProvider};
use crate::scheduling::ResolvedTrajectory;
use std::collections::HashMap;

/// Per-run cache of parsed trajectories keyed by target id. Cleared at the start of every run.
#[derive(Debug, Default)]
pub struct TrajectoryCache {
    entries: HashMap<String, ResolvedTrajectory>,
    hits: usize,
    misses: usize,
}

impl TrajectoryCache {
    pub fn new() -> Self { Self::default() }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Returns the cached trajectory of `target_id`, fetching and parsing it on a miss.
    pub fn get_or_fetch(
        &mut self,
        provider: &dyn TrajectoryProvider,
        target_id: &str,
    ) -> Result<&ResolvedTrajectory, ProviderError> {
        if self.entries.contains_key(target_id) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let raw = provider.trajectory(target_id)?;
            self.entries.insert(target_id.to_string(), ResolvedTrajectory::from_raw(&raw));
        }
        self.entries.get(target_id).ok_or_else(|| ProviderError::UnknownObject(target_id.to_string()))
    }

    pub fn get(&self, target_id: &str) -> Option<&ResolvedTrajectory> { self.entries.get(target_id) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn hits(&self) -> usize { self.hits }

    pub fn misses(&self) -> usize { self.misses }
}
