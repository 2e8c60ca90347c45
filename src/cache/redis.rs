//! Redis sorted-set [`RankCache`].

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::{debug, warn};

use super::backend::RankCache;
use super::error::{CacheError, CacheResult};
use crate::ranking::ScoredMember;

fn command_error(command: &'static str, err: RedisError) -> CacheError {
    CacheError::CommandFailed {
        command,
        message: err.to_string(),
    }
}

/// Key the next full load is written to before being renamed over `key`.
pub(super) fn staging_key(key: &str) -> String {
    format!("{}:staging", key)
}

/// `ZCOUNT` lower bound matching scores strictly greater than `score`.
pub(super) fn exclusive_min(score: i32) -> String {
    format!("({}", score)
}

/// Inclusive `ZREVRANGE` bounds for a window; `None` when `limit` is zero.
pub(super) fn rank_bounds(offset: u64, limit: u32) -> Option<(isize, isize)> {
    if limit == 0 {
        return None;
    }
    let stop = offset.saturating_add(u64::from(limit) - 1);
    Some((offset as isize, stop as isize))
}

#[derive(Clone)]
/// Sorted set stored under a single Redis key.
pub struct RedisRankCache {
    conn: ConnectionManager,
    key: String,
    url: String,
}

impl std::fmt::Debug for RedisRankCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRankCache")
            .field("url", &self.url)
            .field("key", &self.key)
            .finish()
    }
}

impl RedisRankCache {
    /// Connects to `url` and uses `key` for the sorted set.
    pub async fn connect(url: &str, key: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| CacheError::Connection {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            conn,
            key: key.to_string(),
            url: url.to_string(),
        })
    }

    async fn write_staging(
        &self,
        staging: &str,
        members: &[ScoredMember],
        batch_size: usize,
    ) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(staging)
            .await
            .map_err(|e| command_error("DEL", e))?;

        for (index, batch) in members.chunks(batch_size.max(1)).enumerate() {
            let items: Vec<(i32, &str)> = batch
                .iter()
                .map(|m| (m.score, m.username.as_str()))
                .collect();
            let _: () = conn
                .zadd_multiple(staging, items.as_slice())
                .await
                .map_err(|e| command_error("ZADD", e))?;
            debug!(batch = index, size = items.len(), "Staged cache batch");
        }
        Ok(())
    }
}

impl RankCache for RedisRankCache {
    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("PING", e))?;
        Ok(())
    }

    async fn upsert(&self, member: &str, score: i32) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .zadd(&self.key, member, score)
            .await
            .map_err(|e| command_error("ZADD", e))?;
        Ok(())
    }

    async fn range_by_rank(&self, offset: u64, limit: u32) -> CacheResult<Vec<ScoredMember>> {
        let Some((start, stop)) = rank_bounds(offset, limit) else {
            return Ok(Vec::new());
        };
        let mut conn = self.conn.clone();
        let rows: Vec<(String, f64)> = conn
            .zrevrange_withscores(&self.key, start, stop)
            .await
            .map_err(|e| command_error("ZREVRANGE", e))?;

        Ok(rows
            .into_iter()
            .map(|(member, score)| ScoredMember::new(member, score.round() as i32))
            .collect())
    }

    async fn reverse_rank(&self, member: &str) -> CacheResult<Option<u64>> {
        let mut conn = self.conn.clone();
        conn.zrevrank(&self.key, member)
            .await
            .map_err(|e| command_error("ZREVRANK", e))
    }

    async fn count_above(&self, score: i32) -> CacheResult<u64> {
        let mut conn = self.conn.clone();
        conn.zcount(&self.key, exclusive_min(score), "+inf")
            .await
            .map_err(|e| command_error("ZCOUNT", e))
    }

    async fn cardinality(&self) -> CacheResult<u64> {
        let mut conn = self.conn.clone();
        conn.zcard(&self.key)
            .await
            .map_err(|e| command_error("ZCARD", e))
    }

    async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&self.key)
            .await
            .map_err(|e| command_error("DEL", e))?;
        Ok(())
    }

    async fn replace_all(&self, members: &[ScoredMember], batch_size: usize) -> CacheResult<()> {
        if members.is_empty() {
            return self.clear().await;
        }

        // Build under a staging key, then RENAME over the live key in one step.
        let staging = staging_key(&self.key);
        if let Err(e) = self.write_staging(&staging, members, batch_size).await {
            let mut conn = self.conn.clone();
            let cleanup: Result<(), RedisError> = conn.del(&staging).await;
            if let Err(cleanup_err) = cleanup {
                warn!(error = %cleanup_err, key = %staging, "Failed to drop staging key");
            }
            return Err(e);
        }

        let mut conn = self.conn.clone();
        let _: () = conn
            .rename(&staging, &self.key)
            .await
            .map_err(|e| command_error("RENAME", e))?;
        Ok(())
    }
}
