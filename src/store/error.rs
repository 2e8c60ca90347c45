use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the durable store.
pub enum StoreError {
    /// Could not obtain a connection from the pool.
    #[error("database pool error: {message}")]
    Pool {
        /// Error message.
        message: String,
    },

    /// A statement failed.
    #[error("database {operation} failed: {message}")]
    QueryFailed {
        /// Operation name (e.g. `"page_by_score"`).
        operation: &'static str,
        /// Error message.
        message: String,
    },

    /// No user with this username exists.
    #[error("user not found: {username}")]
    UserNotFound {
        /// Requested username.
        username: String,
    },

    /// Score violates the rating constraint.
    #[error("score {score} is outside the allowed range")]
    ScoreOutOfRange {
        /// Rejected score.
        score: i32,
    },

    /// Store is unreachable (used by test doubles to simulate an outage).
    #[error("database unavailable")]
    Unavailable,
}

impl StoreError {
    pub(crate) fn query(operation: &'static str, err: impl std::fmt::Display) -> Self {
        StoreError::QueryFailed {
            operation,
            message: err.to_string(),
        }
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
