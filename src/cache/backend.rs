use super::error::CacheResult;
use crate::ranking::ScoredMember;

/// Ordered-set cache of `(username, score)` members.
///
/// Implementations order members by score descending ("reverse rank"), so rank 0
/// is the highest score. The cache is a derived projection of the store and may be
/// stale or empty at any time.
pub trait RankCache: Send + Sync {
    /// Cheap liveness check.
    fn ping(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Sets `member`'s score, inserting it if missing.
    fn upsert(
        &self,
        member: &str,
        score: i32,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Reads `limit` members starting at zero-based reverse rank `offset`.
    fn range_by_rank(
        &self,
        offset: u64,
        limit: u32,
    ) -> impl std::future::Future<Output = CacheResult<Vec<ScoredMember>>> + Send;

    /// Zero-based reverse rank of `member`, or `None` if absent.
    fn reverse_rank(
        &self,
        member: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<u64>>> + Send;

    /// Number of members with a score strictly greater than `score`.
    fn count_above(&self, score: i32)
    -> impl std::future::Future<Output = CacheResult<u64>> + Send;

    /// Number of members.
    fn cardinality(&self) -> impl std::future::Future<Output = CacheResult<u64>> + Send;

    /// Removes every member.
    fn clear(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Replaces the whole set with `members`, written in chunks of `batch_size`.
    ///
    /// Readers observe either the old set or the new one, never a partial or empty
    /// set in between (unless `members` itself is empty).
    fn replace_all(
        &self,
        members: &[ScoredMember],
        batch_size: usize,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;
}
