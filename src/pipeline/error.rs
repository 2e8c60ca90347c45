use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors returned to callers of the update pipeline.
///
/// Failures of individual queued updates are never returned; they are logged by the
/// worker and counted in [`super::PipelineStats`].
pub enum PipelineError {
    /// The queue already holds `capacity` pending updates.
    #[error("update queue full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// The pipeline has been shut down.
    #[error("update pipeline closed")]
    Closed,

    /// Worker count or capacity was zero.
    #[error("invalid pipeline config: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// Score outside the accepted range; never enqueued.
    #[error("score {score} out of range")]
    InvalidScore {
        /// Rejected score.
        score: i32,
    },

    /// The store could not supply users for a simulated batch.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
