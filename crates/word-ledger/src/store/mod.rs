//! Storage of writing sessions and goals.
//!
//! [`SessionStore`] and [`GoalStore`] are the seams the autosaver and the
//! CLI talk to. [`MemoryStore`] backs tests; [`JsonFileStore`] keeps the
//! ledger in a single JSON file.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::records::{Goal, WritingSession};

#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// All of a user's sessions, newest date first.
    async fn get_all(&self, user_id: &str) -> Result<Vec<WritingSession>, StoreError>;

    async fn get_by_key(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WritingSession>, StoreError>;

    /// Create or overwrite the session for `(user_id, date)`.
    async fn upsert(
        &self,
        user_id: &str,
        date: NaiveDate,
        word_count: u64,
    ) -> Result<WritingSession, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait GoalStore: Send + Sync {
    /// All of a user's goals, latest start date first.
    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError>;

    async fn goal(&self, id: Uuid) -> Result<Option<Goal>, StoreError>;

    /// Insert, or replace the goal with the same id.
    async fn save_goal(&self, goal: Goal) -> Result<(), StoreError>;

    async fn delete_goal(&self, id: Uuid) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get_all(&self, user_id: &str) -> Result<Vec<WritingSession>, StoreError> {
        (**self).get_all(user_id).await
    }

    async fn get_by_key(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WritingSession>, StoreError> {
        (**self).get_by_key(user_id, date).await
    }

    async fn upsert(
        &self,
        user_id: &str,
        date: NaiveDate,
        word_count: u64,
    ) -> Result<WritingSession, StoreError> {
        (**self).upsert(user_id, date, word_count).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// Everything the ledger persists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default)]
    pub sessions: Vec<WritingSession>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl LedgerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sessions_for(&self, user_id: &str) -> Vec<WritingSession> {
        let mut sessions: Vec<_> = self
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.date.cmp(&a.date));
        sessions
    }

    pub fn session(&self, user_id: &str, date: NaiveDate) -> Option<&WritingSession> {
        self.sessions
            .iter()
            .find(|s| s.user_id == user_id && s.date == date)
    }

    /// Add or update the session for `(user_id, date)`.
    pub fn upsert_session(
        &mut self,
        user_id: &str,
        date: NaiveDate,
        word_count: u64,
    ) -> WritingSession {
        if let Some(existing) = self
            .sessions
            .iter_mut()
            .find(|s| s.user_id == user_id && s.date == date)
        {
            existing.word_count = word_count;
            existing.updated_at = Utc::now();
            existing.clone()
        } else {
            let session = WritingSession::new(user_id, date, word_count);
            self.sessions.push(session.clone());
            session
        }
    }

    /// Remove a session by id. Returns whether it existed.
    pub fn remove_session(&mut self, id: Uuid) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        self.sessions.len() != before
    }

    pub fn goals_for(&self, user_id: &str) -> Vec<Goal> {
        let mut goals: Vec<_> = self
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        goals
    }

    pub fn goal(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn upsert_goal(&mut self, goal: Goal) {
        if let Some(existing) = self.goals.iter_mut().find(|g| g.id == goal.id) {
            *existing = goal;
        } else {
            self.goals.push(goal);
        }
    }

    pub fn remove_goal(&mut self, id: Uuid) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| g.id != id);
        self.goals.len() != before
    }
}
