use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ranking::ScoredMember;

/// A user row as stored in the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for ScoredMember {
    fn from(record: UserRecord) -> Self {
        ScoredMember {
            username: record.username,
            score: record.score,
        }
    }
}
