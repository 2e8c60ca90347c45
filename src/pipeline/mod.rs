//! Asynchronous score updates behind a bounded queue.

pub mod config;
pub mod error;
pub mod worker;


pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use worker::{PipelineStats, UpdatePipeline, UpdateRequest};
