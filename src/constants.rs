//! Cross-cutting, shared constants.
//!
//! Score bounds mirror the `users.rating` CHECK constraint; keep them in sync with
//! [`crate::store::postgres::SCHEMA_SQL`].

/// Lowest score a user may hold (inclusive).
pub const MIN_SCORE: i32 = 100;
/// Highest score a user may hold (inclusive).
pub const MAX_SCORE: i32 = 5000;

/// Smallest accepted page size / search limit.
pub const MIN_PAGE_SIZE: u32 = 1;
/// Largest accepted page size / search limit.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Page size used when the caller does not pass one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Sorted-set key holding `(username, score)` members.
pub const LEADERBOARD_KEY: &str = "leaderboard:ratings";

/// Members written per cache call during a full resync.
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 1000;

/// Concurrent update workers.
pub const DEFAULT_UPDATE_WORKERS: usize = 5;
/// Pending updates accepted before `QueueFull`.
pub const DEFAULT_UPDATE_QUEUE_CAPACITY: usize = 100;

/// Upper bound for a single simulation request.
pub const MAX_SIMULATED_UPDATES: usize = 100;
/// Updates queued per simulation tick when not overridden.
pub const DEFAULT_SIMULATED_UPDATES: usize = 10;

/// Returns `true` if `score` is inside `MIN_SCORE..=MAX_SCORE`.
#[inline]
pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Returns `true` if `size` is inside `MIN_PAGE_SIZE..=MAX_PAGE_SIZE`.
#[inline]
pub fn is_valid_page_size(size: u32) -> bool {
    (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds_inclusive() {
        assert!(is_valid_score(MIN_SCORE));
        assert!(is_valid_score(MAX_SCORE));
        assert!(!is_valid_score(MIN_SCORE - 1));
        assert!(!is_valid_score(MAX_SCORE + 1));
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(!is_valid_page_size(0));
        assert!(is_valid_page_size(1));
        assert!(is_valid_page_size(DEFAULT_PAGE_SIZE));
        assert!(is_valid_page_size(100));
        assert!(!is_valid_page_size(101));
    }
}
