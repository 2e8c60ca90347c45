//! Rankboard library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Server configuration
//! - [`LeaderboardService`], [`UserService`] - Read paths (cache first, store fallback)
//! - [`UpdatePipeline`], [`PipelineConfig`] - Bounded asynchronous score updates
//! - [`CacheSynchronizer`] - Full cache rebuild from the store
//!
//! ## Adapters
//! - [`ScoreStore`], [`PgScoreStore`] - Durable store (Postgres)
//! - [`RankCache`], [`RedisRankCache`], [`InMemoryRankCache`], [`CacheBackend`] - Ordered-set cache
//! - [`WarmState`] - Whether the cache may serve reads yet
//!
//! ## Ranking
//! - [`rank_window`] - Competition ranks ("1224") over a score-ordered window
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod leaderboard;
pub mod pipeline;
pub mod ranking;
pub mod store;
pub mod sync;

pub use cache::{
    CacheBackend, CacheError, CacheKind, CacheResult, InMemoryRankCache, RANKBOARD_SOURCE_HEADER,
    RankCache, RedisRankCache, WarmState,
};
#[cfg(any(test, feature = "mock"))]
pub use cache::MockRankCache;

pub use config::{Config, ConfigError};

pub use leaderboard::{
    LeaderboardPage, LeaderboardService, PageSource, QueryError, QueryResult, SearchResults,
    UserRank, UserService,
};

pub use pipeline::{PipelineConfig, PipelineError, PipelineResult, PipelineStats, UpdatePipeline};

pub use ranking::{RankedEntry, ScoredMember, rank_from_higher_count, rank_window, window_offset};

pub use store::{PgScoreStore, SCHEMA_SQL, ScoreStore, StoreError, StoreResult, UserRecord};
#[cfg(any(test, feature = "mock"))]
pub use store::MockScoreStore;

pub use sync::{CacheSynchronizer, SyncError, SyncReport, SyncResult};
