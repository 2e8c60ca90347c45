//! Rebuilds the cache from the store.
//!
//! The store is read in full before the cache is touched, and the cache content is
//! replaced atomically, so a failed sync leaves the previous cache in place.

pub mod error;


use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

pub use error::{SyncError, SyncResult};

use crate::cache::{RankCache, WarmState};
use crate::constants::DEFAULT_SYNC_BATCH_SIZE;
use crate::store::ScoreStore;

/// Summary of a completed sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Members read from the store.
    pub loaded: u64,
    /// Cache cardinality after the replace.
    pub cached: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Copies every `(username, score)` from the store into the cache.
pub struct CacheSynchronizer<S: ScoreStore, C: RankCache> {
    store: S,
    cache: Option<C>,
    warm: WarmState,
    batch_size: usize,
    running: tokio::sync::Mutex<()>,
}

impl<S: ScoreStore, C: RankCache> std::fmt::Debug for CacheSynchronizer<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheSynchronizer")
            .field("cache_enabled", &self.cache.is_some())
            .field("batch_size", &self.batch_size)
            .field("warm", &self.warm.is_warm())
            .finish()
    }
}

impl<S: ScoreStore, C: RankCache> CacheSynchronizer<S, C> {
    pub fn new(store: S, cache: Option<C>, warm: WarmState) -> Self {
        Self {
            store,
            cache,
            warm,
            batch_size: DEFAULT_SYNC_BATCH_SIZE,
            running: tokio::sync::Mutex::new(()),
        }
    }

    /// Members written per cache round trip. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn warm_state(&self) -> &WarmState {
        &self.warm
    }

    /// Replaces the cache content with the store's current ranking.
    ///
    /// Concurrent calls run one after another.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> SyncResult<SyncReport> {
        let cache = self.cache.as_ref().ok_or(SyncError::CacheDisabled)?;
        let _running = self.running.lock().await;
        let started = Instant::now();

        let members = self.store.all_members().await?;
        let loaded = members.len() as u64;

        if members.is_empty() {
            cache.clear().await?;
        } else {
            cache.replace_all(&members, self.batch_size).await?;
        }
        let cached = cache.cardinality().await?;

        self.warm.mark_warm();
        let report = SyncReport {
            loaded,
            cached,
            elapsed: started.elapsed(),
        };
        info!(
            loaded = report.loaded,
            cached = report.cached,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Cache synchronized from store"
        );
        Ok(report)
    }
}

impl<S, C> CacheSynchronizer<S, C>
where
    S: ScoreStore + 'static,
    C: RankCache + 'static,
{
    /// Runs one sync in the background; failures are logged and leave the cache cold.
    pub fn spawn_initial(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.sync_all().await {
                error!(error = %e, "Initial cache sync failed, serving from store");
            }
        })
    }

    /// Re-syncs every `period` until the handle is aborted.
    pub fn start_periodic(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately; the initial sync covers it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = self.sync_all().await {
                    warn!(error = %e, "Periodic cache sync failed");
                }
            }
        })
    }
}
