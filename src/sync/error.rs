use thiserror::Error;

use crate::cache::CacheError;
use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors from a cache rebuild.
pub enum SyncError {
    /// Reading the store failed; the cache was not touched.
    #[error("store read failed: {0}")]
    Store(#[from] StoreError),

    /// Writing the cache failed.
    #[error("cache write failed: {0}")]
    Cache(#[from] CacheError),

    /// No cache is configured.
    #[error("cache is disabled")]
    CacheDisabled,
}

/// Convenience result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
