use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use tokio::sync::watch;

use super::backend::ScoreStore;
use super::error::{StoreError, StoreResult};
use super::model::UserRecord;
use crate::constants::is_valid_score;
use crate::ranking::ScoredMember;

/// In-memory [`ScoreStore`] for tests.
///
/// Supports simulating an outage ([`set_failing`](Self::set_failing)) and holding
/// score writes until released ([`hold_writes`](Self::hold_writes)).
#[derive(Clone)]
pub struct MockScoreStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    next_id: Arc<AtomicI64>,
    failing: Arc<AtomicBool>,
    write_gate: Arc<watch::Sender<bool>>,
    waiting_writes: Arc<AtomicUsize>,
    completed_writes: Arc<AtomicUsize>,
}

impl Default for MockScoreStore {
    fn default() -> Self {
        let (write_gate, _) = watch::channel(false);
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            failing: Arc::new(AtomicBool::new(false)),
            write_gate: Arc::new(write_gate),
            waiting_writes: Arc::new(AtomicUsize::new(0)),
            completed_writes: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl std::fmt::Debug for MockScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockScoreStore")
            .field("users", &self.len())
            .field("failing", &self.failing.load(Ordering::Relaxed))
            .finish()
    }
}

impl MockScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `(username, score)` pairs.
    pub fn with_users(users: &[(&str, i32)]) -> Self {
        let store = Self::new();
        for (username, score) in users {
            store.insert(username, *score);
        }
        store
    }

    /// Inserts or replaces a user without any checks.
    pub fn insert(&self, username: &str, score: i32) {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.users.write().insert(
            username.to_string(),
            UserRecord {
                id,
                username: username.to_string(),
                score,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub fn score_of(&self, username: &str) -> Option<i32> {
        self.users.read().get(username).map(|u| u.score)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Makes every operation fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Parks calls to `update_score` until [`release_writes`](Self::release_writes).
    pub fn hold_writes(&self) {
        self.write_gate.send_replace(true);
    }

    pub fn release_writes(&self) {
        self.write_gate.send_replace(false);
    }

    /// Number of `update_score` calls currently parked on the write gate.
    pub fn waiting_writes(&self) -> usize {
        self.waiting_writes.load(Ordering::Acquire)
    }

    /// Number of `update_score` calls that have finished (success or failure).
    pub fn completed_writes(&self) -> usize {
        self.completed_writes.load(Ordering::Acquire)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::Acquire) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn sorted_users(&self) -> Vec<UserRecord> {
        let mut users: Vec<UserRecord> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| b.username.cmp(&a.username)));
        users
    }

    fn apply_score(&self, username: &str, score: i32) -> StoreResult<()> {
        self.check_available()?;
        if !is_valid_score(score) {
            return Err(StoreError::ScoreOutOfRange { score });
        }
        let mut users = self.users.write();
        let user = users
            .get_mut(username)
            .ok_or_else(|| StoreError::UserNotFound {
                username: username.to_string(),
            })?;
        user.score = score;
        user.updated_at = Utc::now();
        Ok(())
    }
}

impl ScoreStore for MockScoreStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }

    async fn create_user(&self, username: &str, score: i32) -> StoreResult<UserRecord> {
        self.check_available()?;
        if !is_valid_score(score) {
            return Err(StoreError::ScoreOutOfRange { score });
        }
        if self.users.read().contains_key(username) {
            return Err(StoreError::QueryFailed {
                operation: "create_user",
                message: format!("duplicate username '{}'", username),
            });
        }
        self.insert(username, score);
        self.users
            .read()
            .get(username)
            .cloned()
            .ok_or(StoreError::Unavailable)
    }

    async fn page_by_score(&self, offset: u64, limit: u32) -> StoreResult<Vec<UserRecord>> {
        self.check_available()?;
        Ok(self
            .sorted_users()
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn search(&self, query: &str, limit: u32) -> StoreResult<Vec<UserRecord>> {
        self.check_available()?;
        let needle = query.to_lowercase();
        Ok(self
            .sorted_users()
            .into_iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .take(limit as usize)
            .collect())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        self.check_available()?;
        Ok(self.users.read().get(username).cloned())
    }

    async fn count_all(&self) -> StoreResult<u64> {
        self.check_available()?;
        Ok(self.users.read().len() as u64)
    }

    async fn count_above(&self, score: i32) -> StoreResult<u64> {
        self.check_available()?;
        Ok(self.users.read().values().filter(|u| u.score > score).count() as u64)
    }

    async fn count_equal(&self, score: i32) -> StoreResult<u64> {
        self.check_available()?;
        Ok(self.users.read().values().filter(|u| u.score == score).count() as u64)
    }

    async fn update_score(&self, username: &str, score: i32) -> StoreResult<()> {
        let mut gate = self.write_gate.subscribe();
        let held = *gate.borrow();
        if held {
            self.waiting_writes.fetch_add(1, Ordering::AcqRel);
            let _ = gate.wait_for(|held| !*held).await;
            self.waiting_writes.fetch_sub(1, Ordering::AcqRel);
        }

        let result = self.apply_score(username, score);
        self.completed_writes.fetch_add(1, Ordering::AcqRel);
        result
    }

    async fn all_members(&self) -> StoreResult<Vec<ScoredMember>> {
        self.check_available()?;
        Ok(self
            .sorted_users()
            .into_iter()
            .map(ScoredMember::from)
            .collect())
    }

    async fn random_usernames(&self, count: usize) -> StoreResult<Vec<String>> {
        self.check_available()?;
        let names: Vec<String> = self.users.read().keys().cloned().collect();
        let mut rng = rand::thread_rng();
        Ok(names
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect())
    }
}
