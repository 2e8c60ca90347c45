//! Paginated leaderboard reads: cache first, store on any cache miss or failure.

use tracing::{debug, info, instrument, warn};

use super::error::{QueryError, QueryResult};
use super::types::{LeaderboardPage, PageSource};
use crate::cache::{CacheResult, RankCache, WarmState};
use crate::constants::is_valid_page_size;
use crate::ranking::{ScoredMember, rank_window, window_offset};
use crate::store::ScoreStore;

/// Serves leaderboard pages.
#[derive(Clone)]
pub struct LeaderboardService<S: ScoreStore, C: RankCache> {
    store: S,
    cache: Option<C>,
    warm: WarmState,
}

impl<S: ScoreStore, C: RankCache> std::fmt::Debug for LeaderboardService<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaderboardService")
            .field("cache_enabled", &self.cache.is_some())
            .field("cache_warm", &self.warm.is_warm())
            .finish()
    }
}

impl<S: ScoreStore, C: RankCache> LeaderboardService<S, C> {
    /// `cache = None` disables the cache path entirely.
    pub fn new(store: S, cache: Option<C>, warm: WarmState) -> Self {
        Self { store, cache, warm }
    }

    /// Returns page `page` (1-based) of `page_size` entries.
    #[instrument(skip(self))]
    pub async fn get_page(&self, page: u32, page_size: u32) -> QueryResult<LeaderboardPage> {
        if page < 1 {
            return Err(QueryError::Validation(format!(
                "page must be >= 1, got {}",
                page
            )));
        }
        if !is_valid_page_size(page_size) {
            return Err(QueryError::Validation(format!(
                "limit must be between 1 and 100, got {}",
                page_size
            )));
        }

        if let Some(cache) = self.readable_cache() {
            match self.page_from_cache(cache, page, page_size).await {
                Ok(Some(result)) => {
                    info!(page, page_size, total = result.total, "Leaderboard cache hit");
                    return Ok(result);
                }
                Ok(None) => debug!("Cache empty for requested window, falling back to store"),
                Err(e) => warn!(error = %e, "Cache read failed, falling back to store"),
            }
        }

        self.page_from_store(page, page_size).await
    }

    fn readable_cache(&self) -> Option<&C> {
        let cache = self.cache.as_ref()?;
        if !self.warm.is_warm() {
            debug!("Cache not warm yet, reading from store");
            return None;
        }
        Some(cache)
    }

    async fn page_from_cache(
        &self,
        cache: &C,
        page: u32,
        page_size: u32,
    ) -> CacheResult<Option<LeaderboardPage>> {
        let total = cache.cardinality().await?;
        if total == 0 {
            return Ok(None);
        }

        let offset = window_offset(page, page_size);
        let window = cache.range_by_rank(offset, page_size).await?;
        if window.is_empty() {
            return Ok(None);
        }

        Ok(Some(LeaderboardPage {
            entries: rank_window(window, offset),
            page,
            page_size,
            total,
            source: PageSource::Cache,
        }))
    }

    async fn page_from_store(&self, page: u32, page_size: u32) -> QueryResult<LeaderboardPage> {
        let offset = window_offset(page, page_size);
        let users = self.store.page_by_score(offset, page_size).await?;
        let entries = rank_window(users.into_iter().map(ScoredMember::from), offset);
        let total = self.store.count_all().await?;

        debug!(page, page_size, total, "Leaderboard served from store");
        Ok(LeaderboardPage {
            entries,
            page,
            page_size,
            total,
            source: PageSource::Store,
        })
    }
}
