//! Postgres-backed [`ScoreStore`] using a `deadpool-postgres` pool.

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use super::backend::ScoreStore;
use super::error::{StoreError, StoreResult};
use super::model::UserRecord;
use crate::ranking::ScoredMember;

/// Idempotent schema bootstrap for the `users` table.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    rating INTEGER NOT NULL CHECK (rating >= 100 AND rating <= 5000),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_users_username ON users (username);
CREATE INDEX IF NOT EXISTS idx_users_rating ON users (rating DESC);
";

const USER_COLUMNS: &str = "id, username, rating, created_at, updated_at";

/// Score descending, ties by byte-wise descending username (Redis `ZREVRANGE` order).
const SCORE_ORDER: &str = "rating DESC, username COLLATE \"C\" DESC";

#[derive(Clone)]
/// Connection-pooled Postgres store.
pub struct PgScoreStore {
    pool: Pool,
}

impl std::fmt::Debug for PgScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgScoreStore")
            .field("pool_size", &self.pool.status().size)
            .finish()
    }
}

impl PgScoreStore {
    /// Wraps an existing pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a pool for `database_url` holding at most `max_size` connections.
    ///
    /// Connections are opened lazily; use [`ScoreStore::ping`] to verify reachability.
    pub fn connect(database_url: &str, max_size: usize) -> StoreResult<Self> {
        let mut cfg = Config::new();
        cfg.url = Some(database_url.to_string());
        cfg.pool = Some(PoolConfig::new(max_size));
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::Pool {
                message: format!("failed to create pool: {}", e),
            })?;

        Ok(Self::new(pool))
    }

    /// Creates the `users` table and its indexes if they are missing.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let client = self.conn().await?;
        client
            .batch_execute(SCHEMA_SQL)
            .await
            .map_err(|e| StoreError::query("ensure_schema", e))?;
        info!("Database schema ready");
        Ok(())
    }

    async fn conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| StoreError::Pool {
            message: e.to_string(),
        })
    }

    async fn count_where(
        &self,
        operation: &'static str,
        sql: &str,
        score: i32,
    ) -> StoreResult<u64> {
        let client = self.conn().await?;
        let row = client
            .query_one(sql, &[&score])
            .await
            .map_err(|e| StoreError::query(operation, e))?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }
}

fn user_from_row(row: &Row) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        score: row.get("rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_write_error(operation: &'static str, score: i32, err: tokio_postgres::Error) -> StoreError {
    if err.code() == Some(&SqlState::CHECK_VIOLATION) {
        StoreError::ScoreOutOfRange { score }
    } else {
        StoreError::query(operation, err)
    }
}

/// Escapes `LIKE` wildcards so the query matches literally.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl ScoreStore for PgScoreStore {
    async fn ping(&self) -> StoreResult<()> {
        let client = self.conn().await?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| StoreError::query("ping", e))?;
        Ok(())
    }

    async fn create_user(&self, username: &str, score: i32) -> StoreResult<UserRecord> {
        let client = self.conn().await?;
        let sql = format!(
            "INSERT INTO users (username, rating) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let row = client
            .query_one(sql.as_str(), &[&username, &score])
            .await
            .map_err(|e| map_write_error("create_user", score, e))?;
        Ok(user_from_row(&row))
    }

    async fn page_by_score(&self, offset: u64, limit: u32) -> StoreResult<Vec<UserRecord>> {
        let client = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM users ORDER BY {} LIMIT $1 OFFSET $2",
            USER_COLUMNS, SCORE_ORDER
        );
        let rows = client
            .query(sql.as_str(), &[&i64::from(limit), &(offset as i64)])
            .await
            .map_err(|e| StoreError::query("page_by_score", e))?;
        debug!(offset, limit, rows = rows.len(), "Store page read");
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn search(&self, query: &str, limit: u32) -> StoreResult<Vec<UserRecord>> {
        let client = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM users WHERE username ILIKE $1 \
             ORDER BY {} LIMIT $2",
            USER_COLUMNS, SCORE_ORDER
        );
        let pattern = format!("%{}%", escape_like(query));
        let rows = client
            .query(sql.as_str(), &[&pattern, &i64::from(limit)])
            .await
            .map_err(|e| StoreError::query("search", e))?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let client = self.conn().await?;
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = client
            .query_opt(sql.as_str(), &[&username])
            .await
            .map_err(|e| StoreError::query("find_by_username", e))?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn count_all(&self) -> StoreResult<u64> {
        let client = self.conn().await?;
        let row = client
            .query_one("SELECT COUNT(*) FROM users", &[])
            .await
            .map_err(|e| StoreError::query("count_all", e))?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }

    async fn count_above(&self, score: i32) -> StoreResult<u64> {
        self.count_where(
            "count_above",
            "SELECT COUNT(*) FROM users WHERE rating > $1",
            score,
        )
        .await
    }

    async fn count_equal(&self, score: i32) -> StoreResult<u64> {
        self.count_where(
            "count_equal",
            "SELECT COUNT(*) FROM users WHERE rating = $1",
            score,
        )
        .await
    }

    async fn update_score(&self, username: &str, score: i32) -> StoreResult<()> {
        let client = self.conn().await?;
        let updated = client
            .execute(
                "UPDATE users SET rating = $2, updated_at = NOW() WHERE username = $1",
                &[&username, &score],
            )
            .await
            .map_err(|e| map_write_error("update_score", score, e))?;

        if updated == 0 {
            return Err(StoreError::UserNotFound {
                username: username.to_string(),
            });
        }
        Ok(())
    }

    async fn all_members(&self) -> StoreResult<Vec<ScoredMember>> {
        let client = self.conn().await?;
        let sql = format!("SELECT username, rating FROM users ORDER BY {}", SCORE_ORDER);
        let rows = client
            .query(sql.as_str(), &[])
            .await
            .map_err(|e| StoreError::query("all_members", e))?;
        Ok(rows
            .iter()
            .map(|row| ScoredMember::new(row.get::<_, String>(0), row.get::<_, i32>(1)))
            .collect())
    }

    async fn random_usernames(&self, count: usize) -> StoreResult<Vec<String>> {
        let client = self.conn().await?;
        let rows = client
            .query(
                "SELECT username FROM users ORDER BY RANDOM() LIMIT $1",
                &[&(count as i64)],
            )
            .await
            .map_err(|e| StoreError::query("random_usernames", e))?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
