//! Bounded queue plus a fixed pool of workers applying score updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::join_all;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use crate::cache::RankCache;
use crate::constants::{MAX_SCORE, MIN_SCORE, is_valid_score};
use crate::store::ScoreStore;

/// A queued score change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub username: String,
    pub score: i32,
}

/// Outcome counters for dequeued updates.
#[derive(Debug, Default)]
pub struct PipelineStats {
    processed: AtomicU64,
    failed: AtomicU64,
    cache_failures: AtomicU64,
}

impl PipelineStats {
    /// Updates written to the store.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Acquire)
    }

    /// Updates dropped because the store write failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Acquire)
    }

    /// Store writes whose cache write-through failed.
    pub fn cache_failures(&self) -> u64 {
        self.cache_failures.load(Ordering::Acquire)
    }
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<UpdateRequest>>>;

/// Asynchronous score update pipeline.
///
/// [`queue_update`](Self::queue_update) never waits: a full queue is reported as
/// [`PipelineError::QueueFull`]. Workers write the store first and only then the cache.
pub struct UpdatePipeline<S: ScoreStore, C: RankCache> {
    sender: Mutex<Option<mpsc::Sender<UpdateRequest>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    store: S,
    config: PipelineConfig,
    stats: Arc<PipelineStats>,
    _cache: std::marker::PhantomData<fn() -> C>,
}

impl<S: ScoreStore, C: RankCache> std::fmt::Debug for UpdatePipeline<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePipeline")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<S, C> UpdatePipeline<S, C>
where
    S: ScoreStore + Clone + 'static,
    C: RankCache + Clone + 'static,
{
    /// Spawns `config.workers` workers on the current tokio runtime.
    pub fn start(config: PipelineConfig, store: S, cache: Option<C>) -> PipelineResult<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.capacity);
        let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));
        let stats = Arc::new(PipelineStats::default());

        let workers: Vec<JoinHandle<()>> = (0..config.workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&rx),
                    store.clone(),
                    cache.clone(),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(
            workers = config.workers,
            capacity = config.capacity,
            cache_enabled = cache.is_some(),
            "Update pipeline started"
        );

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            store,
            config,
            stats,
            _cache: std::marker::PhantomData,
        })
    }
}

impl<S: ScoreStore, C: RankCache> UpdatePipeline<S, C> {
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Updates waiting in the queue (not counting those already dequeued).
    pub fn pending(&self) -> usize {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.max_capacity() - tx.capacity(),
            None => 0,
        }
    }

    /// Enqueues an update without waiting.
    pub fn queue_update(&self, username: &str, score: i32) -> PipelineResult<()> {
        if !is_valid_score(score) {
            return Err(PipelineError::InvalidScore { score });
        }

        let guard = self.sender.lock();
        let tx = guard.as_ref().ok_or(PipelineError::Closed)?;
        let request = UpdateRequest {
            username: username.to_string(),
            score,
        };

        tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => PipelineError::QueueFull {
                capacity: self.config.capacity,
            },
            TrySendError::Closed(_) => PipelineError::Closed,
        })
    }

    /// Queues up to `count` updates for random existing users with random scores.
    ///
    /// Items rejected by a full queue are skipped. Returns how many were queued.
    #[instrument(skip(self))]
    pub async fn simulate_random_updates(&self, count: usize) -> PipelineResult<usize> {
        let usernames = self.store.random_usernames(count).await?;

        let updates: Vec<(String, i32)> = {
            let mut rng = rand::thread_rng();
            usernames
                .into_iter()
                .map(|name| (name, rng.gen_range(MIN_SCORE..=MAX_SCORE)))
                .collect()
        };

        let mut queued = 0;
        for (username, score) in updates {
            match self.queue_update(&username, score) {
                Ok(()) => queued += 1,
                Err(PipelineError::QueueFull { capacity }) => {
                    warn!(username = %username, capacity, "Queue full, skipping simulated update");
                }
                Err(e) => return Err(e),
            }
        }

        info!(requested = count, queued, "Simulated updates queued");
        Ok(queued)
    }

    /// Stops accepting updates, drains the queue and joins every worker.
    pub async fn shutdown(&self) {
        let sender = self.sender.lock().take();
        if sender.is_none() {
            debug!("Update pipeline already shut down");
            return;
        }
        drop(sender);

        let handles = std::mem::take(&mut *self.workers.lock());
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Update worker terminated abnormally");
            }
        }

        info!(
            processed = self.stats.processed(),
            failed = self.stats.failed(),
            cache_failures = self.stats.cache_failures(),
            "Update pipeline stopped"
        );
    }
}

async fn run_worker<S: ScoreStore, C: RankCache>(
    id: usize,
    rx: SharedReceiver,
    store: S,
    cache: Option<C>,
    stats: Arc<PipelineStats>,
) {
    debug!(worker = id, "Update worker started");
    loop {
        let next = rx.lock().await.recv().await;
        let Some(update) = next else {
            break;
        };
        apply_update(id, &store, cache.as_ref(), &stats, update).await;
    }
    debug!(worker = id, "Update worker stopped");
}

async fn apply_update<S: ScoreStore, C: RankCache>(
    worker: usize,
    store: &S,
    cache: Option<&C>,
    stats: &PipelineStats,
    update: UpdateRequest,
) {
    if let Err(e) = store.update_score(&update.username, update.score).await {
        stats.failed.fetch_add(1, Ordering::AcqRel);
        error!(
            worker,
            username = %update.username,
            score = update.score,
            error = %e,
            "Store update failed, dropping update"
        );
        return;
    }

    if let Some(cache) = cache
        && let Err(e) = cache.upsert(&update.username, update.score).await
    {
        stats.cache_failures.fetch_add(1, Ordering::AcqRel);
        warn!(
            worker,
            username = %update.username,
            error = %e,
            "Cache write-through failed, cache is stale until next sync"
        );
    }

    stats.processed.fetch_add(1, Ordering::AcqRel);
    debug!(worker, username = %update.username, score = update.score, "Update applied");
}
