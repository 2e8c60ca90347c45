use super::error::{PipelineError, PipelineResult};
use crate::constants::{DEFAULT_UPDATE_QUEUE_CAPACITY, DEFAULT_UPDATE_WORKERS};

/// Sizing for [`super::UpdatePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Concurrent workers draining the queue.
    pub workers: usize,
    /// Maximum pending updates before `QueueFull`.
    pub capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_UPDATE_WORKERS,
            capacity: DEFAULT_UPDATE_QUEUE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn new(workers: usize, capacity: usize) -> Self {
        Self { workers, capacity }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "workers must be at least 1".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "queue capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
