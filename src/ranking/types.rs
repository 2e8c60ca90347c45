use serde::{Deserialize, Serialize};

/// An `(identity, score)` projection, as held by the cache and read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoredMember {
    /// Stable user handle.
    pub username: String,
    /// Current score.
    pub score: i32,
}

impl ScoredMember {
    pub fn new(username: impl Into<String>, score: i32) -> Self {
        Self {
            username: username.into(),
            score,
        }
    }
}

/// A ranked leaderboard row. Derived per query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based competition rank.
    pub rank: u64,
    pub username: String,
    pub score: i32,
}
