use super::error::StoreResult;
use super::model::UserRecord;
use crate::ranking::ScoredMember;

/// Durable store interface used by the services.
///
/// The store is the single source of truth for scores. All ordered reads return
/// rows sorted by score descending, then username descending (byte-wise).
pub trait ScoreStore: Send + Sync {
    /// Cheap liveness check.
    fn ping(&self) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Inserts a new user.
    fn create_user(
        &self,
        username: &str,
        score: i32,
    ) -> impl std::future::Future<Output = StoreResult<UserRecord>> + Send;

    /// Reads `limit` users starting at zero-based position `offset`.
    fn page_by_score(
        &self,
        offset: u64,
        limit: u32,
    ) -> impl std::future::Future<Output = StoreResult<Vec<UserRecord>>> + Send;

    /// Case-insensitive substring match on username, capped at `limit`.
    fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> impl std::future::Future<Output = StoreResult<Vec<UserRecord>>> + Send;

    /// Point lookup by username.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = StoreResult<Option<UserRecord>>> + Send;

    /// Total number of users.
    fn count_all(&self) -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// Number of users with a score strictly greater than `score`.
    fn count_above(&self, score: i32)
    -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// Number of users with exactly `score`.
    fn count_equal(&self, score: i32)
    -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// Overwrites a user's score. Fails with `UserNotFound` if the user is absent.
    fn update_score(
        &self,
        username: &str,
        score: i32,
    ) -> impl std::future::Future<Output = StoreResult<()>> + Send;

    /// Every user's projection, sorted by score descending.
    fn all_members(&self) -> impl std::future::Future<Output = StoreResult<Vec<ScoredMember>>> + Send;

    /// Up to `count` usernames chosen at random.
    fn random_usernames(
        &self,
        count: usize,
    ) -> impl std::future::Future<Output = StoreResult<Vec<String>>> + Send;
}
