use serde::{Deserialize, Serialize};

use crate::ranking::RankedEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Which adapter answered a read.
pub enum PageSource {
    Cache,
    Store,
}

impl PageSource {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            PageSource::Cache => "cache",
            PageSource::Store => "store",
        }
    }
}

impl std::fmt::Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_header_value())
    }
}

/// One page of the leaderboard.
///
/// `total` always comes from the same source as `entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardPage {
    pub entries: Vec<RankedEntry>,
    pub page: u32,
    #[serde(rename = "limit")]
    pub page_size: u32,
    pub total: u64,
    #[serde(skip, default = "default_source")]
    pub source: PageSource,
}

fn default_source() -> PageSource {
    PageSource::Store
}

/// Search matches with their ranks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub users: Vec<RankedEntry>,
    pub count: usize,
}

/// Rank lookup for a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRank {
    pub username: String,
    pub score: i32,
    pub rank: u64,
    /// Other users holding the same score.
    pub shared_with: u64,
}
