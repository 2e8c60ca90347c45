use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::backend::RankCache;
use super::error::{CacheError, CacheResult};
use super::memory::InMemoryRankCache;
use crate::ranking::ScoredMember;

/// [`InMemoryRankCache`] wrapper that can simulate an outage and counts calls.
#[derive(Debug, Clone, Default)]
pub struct MockRankCache {
    inner: InMemoryRankCache,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockRankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache pre-populated with `(username, score)` pairs.
    pub fn with_members(members: &[(&str, i32)]) -> Self {
        let cache = Self::new();
        let members: Vec<ScoredMember> = members
            .iter()
            .map(|(name, score)| ScoredMember::new(*name, *score))
            .collect();
        cache.seed(&members);
        cache
    }

    /// Replaces the contents synchronously, bypassing failure injection.
    pub fn seed(&self, members: &[ScoredMember]) {
        self.inner.load(members);
    }

    /// Makes every operation fail with [`CacheError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Number of trait calls made so far (including failed ones).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn score_of(&self, member: &str) -> Option<i32> {
        self.inner.score_of(member)
    }

    fn enter(&self) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        if self.failing.load(Ordering::Acquire) {
            Err(CacheError::Unavailable)
        } else {
            Ok(())
        }
    }
}

impl RankCache for MockRankCache {
    async fn ping(&self) -> CacheResult<()> {
        self.enter()
    }

    async fn upsert(&self, member: &str, score: i32) -> CacheResult<()> {
        self.enter()?;
        self.inner.upsert(member, score).await
    }

    async fn range_by_rank(&self, offset: u64, limit: u32) -> CacheResult<Vec<ScoredMember>> {
        self.enter()?;
        self.inner.range_by_rank(offset, limit).await
    }

    async fn reverse_rank(&self, member: &str) -> CacheResult<Option<u64>> {
        self.enter()?;
        self.inner.reverse_rank(member).await
    }

    async fn count_above(&self, score: i32) -> CacheResult<u64> {
        self.enter()?;
        self.inner.count_above(score).await
    }

    async fn cardinality(&self) -> CacheResult<u64> {
        self.enter()?;
        self.inner.cardinality().await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.enter()?;
        self.inner.clear().await
    }

    async fn replace_all(&self, members: &[ScoredMember], batch_size: usize) -> CacheResult<()> {
        self.enter()?;
        self.inner.replace_all(members, batch_size).await
    }
}
