use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors surfaced by the query services.
///
/// Cache failures never appear here: they trigger a store fallback instead.
pub enum QueryError {
    /// Caller supplied an invalid page, limit, query or username.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The username does not exist in the store.
    #[error("user not found: {username}")]
    NotFound {
        /// Requested username.
        username: String,
    },

    /// The store failed; there is no further fallback.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
