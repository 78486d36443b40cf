use crate::providers::{Coordinate, PositionProvider, PositionQuery, ProviderError};
use crate::util::PositionSyncConfig;
use crate::{event, log, warn};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type ProviderReply = Result<Option<Coordinate>, ProviderError>;

struct PositionRequest {
    query: PositionQuery,
    timeout: Duration,
    started: oneshot::Sender<()>,
    reply: oneshot::Sender<ProviderReply>,
}

/// Outcome of a single position request.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Position(Coordinate),
    /// The provider answered but had no position for that instant.
    Empty,
    Failed(ProviderError),
    TimedOut,
}

/// Counters kept by the provider worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProviderStats {
    pub requests: usize,
    pub successes: usize,
    pub empty: usize,
    pub failures: usize,
    /// Requests whose requester had already given up before dispatch.
    pub skipped_stale: usize,
    pub cache_hits: usize,
    pub total_call_secs: f64,
}

impl ProviderStats {
    /// Mean duration of the provider calls that were actually made.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_call_secs(&self) -> f64 {
        let calls = self.successes - self.cache_hits + self.empty + self.failures;
        if calls == 0 { 0.0 } else { self.total_call_secs / calls as f64 }
    }
}

/// Sending half of the position worker. All position requests of a run go through this handle,
/// the provider itself lives on the worker.
#[derive(Debug)]
pub struct PositionChannel {
    tx: mpsc::Sender<PositionRequest>,
    timeout: Duration,
    dispatch_limit: Duration,
}

/// The worker owning the position provider. Yields the provider back on shutdown.
pub struct PositionWorker {
    handle: JoinHandle<(Box<dyn PositionProvider>, ProviderStats)>,
}

impl std::fmt::Debug for PositionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionRequest").field("query", &self.query).finish_non_exhaustive()
    }
}

impl PositionChannel {
    /// Moves `provider` onto a dedicated blocking worker and returns the handle to talk to it.
    ///
    /// # Arguments
    /// - `provider`: The position provider, possibly thread-affine.
    /// - `config`: Supplies the per-sample timeout, queue depth and cache switch.
    ///
    /// # Returns
    /// The request channel and the worker to shut down after the run.
    pub fn spawn(provider: Box<dyn PositionProvider>, config: &PositionSyncConfig) -> (Self, PositionWorker) {
        let depth = config.batch_size.max(1);
        let (tx, rx) = mpsc::channel(depth);
        let use_cache = config.enable_cache;
        let handle = tokio::task::spawn_blocking(move || Self::worker_loop(provider, rx, use_cache));
        let timeout = config.provider_timeout();
        let queue_slots = u32::try_from(depth).unwrap_or(u32::MAX);
        (Self { tx, timeout, dispatch_limit: timeout.saturating_mul(queue_slots) }, PositionWorker { handle })
    }

    pub fn timeout(&self) -> Duration { self.timeout }

    /// Requests a single position.
    ///
    /// The timeout starts when the worker dispatches the request. Time spent waiting in the queue
    /// is bounded separately by the queue depth times the timeout.
    pub async fn request(&self, query: PositionQuery) -> SampleOutcome {
        let (started_tx, started_rx) = oneshot::channel();
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = PositionRequest { query, timeout: self.timeout, started: started_tx, reply: reply_tx };
        if self.tx.send(request).await.is_err() {
            return SampleOutcome::Failed(ProviderError::Disconnected);
        }
        match tokio::time::timeout(self.dispatch_limit, started_rx).await {
            Err(_) => return SampleOutcome::TimedOut,
            Ok(Err(_)) => return SampleOutcome::Failed(ProviderError::Disconnected),
            Ok(Ok(())) => (),
        }
        match tokio::time::timeout(self.timeout, reply_rx).await {
            Err(_) => SampleOutcome::TimedOut,
            Ok(Err(_)) => SampleOutcome::Failed(ProviderError::Disconnected),
            Ok(Ok(Ok(Some(pos)))) => SampleOutcome::Position(pos),
            Ok(Ok(Ok(None))) => SampleOutcome::Empty,
            Ok(Ok(Err(e))) => SampleOutcome::Failed(e),
        }
    }

    fn worker_loop(
        mut provider: Box<dyn PositionProvider>,
        mut rx: mpsc::Receiver<PositionRequest>,
        use_cache: bool,
    ) -> (Box<dyn PositionProvider>, ProviderStats) {
        let mut stats = ProviderStats::default();
        let mut cache: HashMap<(String, DateTime<Utc>), Coordinate> = HashMap::new();
        while let Some(req) = rx.blocking_recv() {
            stats.requests += 1;
            if req.reply.is_closed() || req.started.send(()).is_err() {
                stats.skipped_stale += 1;
                continue;
            }
            let key = (req.query.observer_id.clone(), req.query.sample_time);
            if let Some(pos) = cache.get(&key) {
                stats.cache_hits += 1;
                stats.successes += 1;
                // a closed reply only means the requester timed out
                let _ = req.reply.send(Ok(Some(*pos)));
                continue;
            }
            let call_start = Instant::now();
            let result = provider.position_at(&req.query, req.timeout);
            let elapsed = call_start.elapsed();
            stats.total_call_secs += elapsed.as_secs_f64();
            match &result {
                Ok(Some(pos)) => {
                    stats.successes += 1;
                    if use_cache {
                        cache.insert(key, *pos);
                    }
                }
                Ok(None) => stats.empty += 1,
                Err(e) => {
                    stats.failures += 1;
                    event!("Position call for {} failed: {e:?}", req.query.observer_id);
                }
            }
            if elapsed > req.timeout {
                warn!(
                    "Position call for {} at {} took {:.2}s, result discarded",
                    req.query.observer_id,
                    req.query.sample_time,
                    elapsed.as_secs_f64()
                );
            }
            let _ = req.reply.send(result);
        }
        log!(
            "Position worker stopped after {} requests ({} ok, {} failed, {} stale, {} cached)",
            stats.requests,
            stats.successes,
            stats.failures,
            stats.skipped_stale,
            stats.cache_hits
        );
        (provider, stats)
    }
}

impl PositionWorker {
    /// Closes the channel and waits for the worker to drain its queue.
    ///
    /// # Returns
    /// The provider and the worker statistics, or [`ProviderError::Disconnected`] if the worker panicked.
    pub async fn shutdown(
        self,
        channel: PositionChannel,
    ) -> Result<(Box<dyn PositionProvider>, ProviderStats), ProviderError> {
        drop(channel);
        self.handle.await.map_err(|_| ProviderError::Disconnected)
    }
}
