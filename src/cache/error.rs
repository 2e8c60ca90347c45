use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by the ordered-set cache.
///
/// Query paths never surface these; any cache error means "fall back to the store".
pub enum CacheError {
    /// Could not connect to the cache server.
    #[error("failed to connect to cache at '{url}': {message}")]
    Connection {
        /// Endpoint URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// A cache command failed.
    #[error("cache command {command} failed: {message}")]
    CommandFailed {
        /// Command name (e.g. `"ZREVRANGE"`).
        command: &'static str,
        /// Error message.
        message: String,
    },

    /// Cache is unreachable (used by test doubles to simulate an outage).
    #[error("cache unavailable")]
    Unavailable,
}

/// Convenience result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
