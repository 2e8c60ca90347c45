//! Cache backend selection.
//!
//! The backend is chosen once at startup from configuration. "No cache" is
//! represented by the services holding `None`, not by a backend variant.

use super::backend::RankCache;
use super::error::CacheResult;
use super::memory::InMemoryRankCache;
use super::redis::RedisRankCache;
use crate::ranking::ScoredMember;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which cache to put in front of the store.
pub enum CacheKind {
    #[default]
    /// Redis sorted set.
    Redis,
    /// In-process ordered set (single instance only).
    Memory,
    /// No cache; every read goes to the store.
    None,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Redis => "redis",
            CacheKind::Memory => "memory",
            CacheKind::None => "none",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheKind::None)
    }
}

impl std::str::FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "mem" | "in-memory" => Ok(Self::Memory),
            "none" | "off" | "disabled" => Ok(Self::None),
            _ => Err(format!("Unknown cache backend: {}", s)),
        }
    }
}

impl std::fmt::Display for CacheKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
/// Concrete cache used by the server binary.
pub enum CacheBackend {
    Memory(InMemoryRankCache),
    Redis(RedisRankCache),
}

impl RankCache for CacheBackend {
    async fn ping(&self) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(c) => c.ping().await,
            CacheBackend::Redis(c) => c.ping().await,
        }
    }

    async fn upsert(&self, member: &str, score: i32) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(c) => c.upsert(member, score).await,
            CacheBackend::Redis(c) => c.upsert(member, score).await,
        }
    }

    async fn range_by_rank(&self, offset: u64, limit: u32) -> CacheResult<Vec<ScoredMember>> {
        match self {
            CacheBackend::Memory(c) => c.range_by_rank(offset, limit).await,
            CacheBackend::Redis(c) => c.range_by_rank(offset, limit).await,
        }
    }

    async fn reverse_rank(&self, member: &str) -> CacheResult<Option<u64>> {
        match self {
            CacheBackend::Memory(c) => c.reverse_rank(member).await,
            CacheBackend::Redis(c) => c.reverse_rank(member).await,
        }
    }

    async fn count_above(&self, score: i32) -> CacheResult<u64> {
        match self {
            CacheBackend::Memory(c) => c.count_above(score).await,
            CacheBackend::Redis(c) => c.count_above(score).await,
        }
    }

    async fn cardinality(&self) -> CacheResult<u64> {
        match self {
            CacheBackend::Memory(c) => c.cardinality().await,
            CacheBackend::Redis(c) => c.cardinality().await,
        }
    }

    async fn clear(&self) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(c) => c.clear().await,
            CacheBackend::Redis(c) => c.clear().await,
        }
    }

    async fn replace_all(&self, members: &[ScoredMember], batch_size: usize) -> CacheResult<()> {
        match self {
            CacheBackend::Memory(c) => c.replace_all(members, batch_size).await,
            CacheBackend::Redis(c) => c.replace_all(members, batch_size).await,
        }
    }
}
