//! Durable store (Postgres): the authoritative source of user scores.

pub mod backend;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;
pub mod postgres;


pub use backend::ScoreStore;
pub use error::{StoreError, StoreResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockScoreStore;
pub use model::UserRecord;
pub use postgres::{PgScoreStore, SCHEMA_SQL};
