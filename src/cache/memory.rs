//! In-process ordered set.
//!
//! Members live in a `BTreeSet` keyed by `(Reverse(score), Reverse(username))`, so
//! iteration order is reverse-rank order with ties in descending username order,
//! the same order a Redis `ZREVRANGE` returns.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use super::backend::RankCache;
use super::error::CacheResult;
use crate::ranking::ScoredMember;

#[derive(Debug, Default)]
struct OrderedSet {
    scores: HashMap<String, i32>,
    order: BTreeSet<(Reverse<i32>, Reverse<String>)>,
}

impl OrderedSet {
    fn upsert(&mut self, member: &str, score: i32) {
        if let Some(previous) = self.scores.insert(member.to_string(), score) {
            self.order
                .remove(&(Reverse(previous), Reverse(member.to_string())));
        }
        self.order.insert((Reverse(score), Reverse(member.to_string())));
    }

    fn higher_than(&self, score: i32) -> usize {
        self.order
            .iter()
            .take_while(|(Reverse(s), _)| *s > score)
            .count()
    }

    fn reverse_rank(&self, member: &str) -> Option<usize> {
        let score = *self.scores.get(member)?;
        Some(
            self.order
                .range(..(Reverse(score), Reverse(member.to_string())))
                .count(),
        )
    }

    fn range(&self, offset: u64, limit: u32) -> Vec<ScoredMember> {
        self.order
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(Reverse(score), Reverse(member))| ScoredMember::new(member.clone(), *score))
            .collect()
    }

    fn len(&self) -> usize {
        self.scores.len()
    }

    fn from_members(members: &[ScoredMember], batch_size: usize) -> Self {
        let mut staged = Self::default();
        for batch in members.chunks(batch_size.max(1)) {
            for member in batch {
                staged.upsert(&member.username, member.score);
            }
        }
        staged
    }
}

/// Ordered-set cache held in process memory.
///
/// Cloning is cheap; clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRankCache {
    inner: Arc<RwLock<OrderedSet>>,
}

impl InMemoryRankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members (synchronous).
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the contents synchronously.
    pub fn load(&self, members: &[ScoredMember]) {
        let staged = OrderedSet::from_members(members, members.len());
        *self.inner.write() = staged;
    }

    /// Score of `member`, if present.
    pub fn score_of(&self, member: &str) -> Option<i32> {
        self.inner.read().scores.get(member).copied()
    }
}

impl RankCache for InMemoryRankCache {
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn upsert(&self, member: &str, score: i32) -> CacheResult<()> {
        self.inner.write().upsert(member, score);
        Ok(())
    }

    async fn range_by_rank(&self, offset: u64, limit: u32) -> CacheResult<Vec<ScoredMember>> {
        Ok(self.inner.read().range(offset, limit))
    }

    async fn reverse_rank(&self, member: &str) -> CacheResult<Option<u64>> {
        Ok(self.inner.read().reverse_rank(member).map(|r| r as u64))
    }

    async fn count_above(&self, score: i32) -> CacheResult<u64> {
        Ok(self.inner.read().higher_than(score) as u64)
    }

    async fn cardinality(&self) -> CacheResult<u64> {
        Ok(self.inner.read().len() as u64)
    }

    async fn clear(&self) -> CacheResult<()> {
        *self.inner.write() = OrderedSet::default();
        Ok(())
    }

    async fn replace_all(&self, members: &[ScoredMember], batch_size: usize) -> CacheResult<()> {
        let staged = OrderedSet::from_members(members, batch_size);
        *self.inner.write() = staged;
        Ok(())
    }
}
