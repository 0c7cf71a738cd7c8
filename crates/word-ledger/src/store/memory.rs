//! In-memory store for tests and ephemeral sessions.

use std::sync::RwLock;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{GoalStore, LedgerData, SessionStore};
use crate::error::StoreError;
use crate::records::{Goal, WritingSession};

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<LedgerData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: LedgerData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn snapshot(&self) -> LedgerData {
        self.data.read().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemoryStore {
    async fn get_all(&self, user_id: &str) -> Result<Vec<WritingSession>, StoreError> {
        Ok(self.data.read().unwrap().sessions_for(user_id))
    }

    async fn get_by_key(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WritingSession>, StoreError> {
        Ok(self.data.read().unwrap().session(user_id, date).cloned())
    }

    async fn upsert(
        &self,
        user_id: &str,
        date: NaiveDate,
        word_count: u64,
    ) -> Result<WritingSession, StoreError> {
        Ok(self
            .data
            .write()
            .unwrap()
            .upsert_session(user_id, date, word_count))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if self.data.write().unwrap().remove_session(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("session {id}")))
        }
    }
}

#[async_trait::async_trait]
impl GoalStore for MemoryStore {
    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        Ok(self.data.read().unwrap().goals_for(user_id))
    }

    async fn goal(&self, id: Uuid) -> Result<Option<Goal>, StoreError> {
        Ok(self.data.read().unwrap().goal(id).cloned())
    }

    async fn save_goal(&self, goal: Goal) -> Result<(), StoreError> {
        self.data.write().unwrap().upsert_goal(goal);
        Ok(())
    }

    async fn delete_goal(&self, id: Uuid) -> Result<(), StoreError> {
        if self.data.write().unwrap().remove_goal(id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("goal {id}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        let store = MemoryStore::new();
        let date: NaiveDate = "2024-03-01".parse().unwrap();

        assert!(store.get_by_key("u", date).await.unwrap().is_none());
        store.upsert("u", date, 120).await.unwrap();
        let session = store.upsert("u", date, 180).await.unwrap();

        assert_eq!(
            store.get_by_key("u", date).await.unwrap().unwrap().word_count,
            180
        );
        assert_eq!(store.get_all("u").await.unwrap().len(), 1);
        assert!(store.get_all("someone-else").await.unwrap().is_empty());

        store.delete(session.id).await.unwrap();
        assert!(matches!(
            store.delete(session.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
