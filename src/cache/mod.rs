//! Ordered-set cache: a derived `(username, score)` projection of the store.

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod redis;
pub mod select;
pub mod warm;


pub use backend::RankCache;
pub use error::{CacheError, CacheResult};
pub use memory::InMemoryRankCache;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRankCache;
pub use self::redis::RedisRankCache;
pub use select::{CacheBackend, CacheKind};
pub use warm::WarmState;

/// Header reporting which source answered a leaderboard read.
pub const RANKBOARD_SOURCE_HEADER: &str = "X-Rankboard-Source";
