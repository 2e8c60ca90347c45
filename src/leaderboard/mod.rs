//! Read-side services: leaderboard pages, user search and rank lookup.

pub mod error;
pub mod service;
pub mod types;
pub mod users;


pub use error::{QueryError, QueryResult};
pub use service::LeaderboardService;
pub use types::{LeaderboardPage, PageSource, SearchResults, UserRank};
pub use users::UserService;
