//! User search and single-user rank lookup.
//!
//! Identity lookups always hit the store (the cache cannot prove a user exists).
//! Rank counting prefers the cache's "count with higher score" and falls back to
//! the store's equivalent count per user.

use tracing::{debug, instrument, warn};

use super::error::{QueryError, QueryResult};
use super::types::{SearchResults, UserRank};
use crate::cache::{RankCache, WarmState};
use crate::constants::is_valid_page_size;
use crate::ranking::{RankedEntry, rank_from_higher_count};
use crate::store::ScoreStore;

/// Serves search and rank lookups.
#[derive(Clone)]
pub struct UserService<S: ScoreStore, C: RankCache> {
    store: S,
    cache: Option<C>,
    warm: WarmState,
}

impl<S: ScoreStore, C: RankCache> std::fmt::Debug for UserService<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService")
            .field("cache_enabled", &self.cache.is_some())
            .field("cache_warm", &self.warm.is_warm())
            .finish()
    }
}

impl<S: ScoreStore, C: RankCache> UserService<S, C> {
    /// `cache = None` disables the cache path entirely.
    pub fn new(store: S, cache: Option<C>, warm: WarmState) -> Self {
        Self { store, cache, warm }
    }

    /// Case-insensitive substring search on username, highest score first.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: u32) -> QueryResult<SearchResults> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::Validation("query is required".to_string()));
        }
        if !is_valid_page_size(limit) {
            return Err(QueryError::Validation(format!(
                "limit must be between 1 and 100, got {}",
                limit
            )));
        }

        let matches = self.store.search(query, limit).await?;
        let mut users = Vec::with_capacity(matches.len());
        for user in matches {
            let rank = self.rank_for_score(user.score).await?;
            users.push(RankedEntry {
                rank,
                username: user.username,
                score: user.score,
            });
        }

        debug!(matches = users.len(), "Search complete");
        let count = users.len();
        Ok(SearchResults { users, count })
    }

    /// Current score and rank of `username`.
    #[instrument(skip(self))]
    pub async fn get_user_rank(&self, username: &str) -> QueryResult<UserRank> {
        if username.trim().is_empty() {
            return Err(QueryError::Validation("username is required".to_string()));
        }

        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| QueryError::NotFound {
                username: username.to_string(),
            })?;

        let rank = self.rank_for_score(user.score).await?;
        let same_score = self.store.count_equal(user.score).await?;

        Ok(UserRank {
            username: user.username,
            score: user.score,
            rank,
            shared_with: same_score.saturating_sub(1),
        })
    }

    /// Competition rank of `score`: users with a strictly higher score, plus one.
    pub async fn rank_for_score(&self, score: i32) -> QueryResult<u64> {
        if let Some(cache) = self.cache.as_ref()
            && self.warm.is_warm()
        {
            match cache.count_above(score).await {
                Ok(higher) => return Ok(rank_from_higher_count(higher)),
                Err(e) => warn!(error = %e, score, "Cache rank count failed, using store"),
            }
        }

        let higher = self.store.count_above(score).await?;
        Ok(rank_from_higher_count(higher))
    }
}
