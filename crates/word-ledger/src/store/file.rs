//! JSON-file store.
//!
//! The whole ledger lives in one file (normally `ledger.json` in the data
//! directory). Every mutation rewrites it atomically: write to a temp file
//! in the same directory, then rename over the target.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{GoalStore, LedgerData, SessionStore};
use crate::error::StoreError;
use crate::records::{Goal, WritingSession};

pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<LedgerData>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file doesn't exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = Self::load(&path).await?;
        tracing::debug!(
            "Opened ledger at {} ({} sessions, {} goals)",
            path.display(),
            data.sessions.len(),
            data.goals.len()
        );

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Result<LedgerData, StoreError> {
        if !path.exists() {
            return Ok(LedgerData::new());
        }

        let contents = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn save(&self, data: &LedgerData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(data)?;
        atomic_write(&self.path, &contents).await?;
        Ok(())
    }

    /// Apply `change` to a copy of the ledger and keep it only once saved.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut LedgerData) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.data.lock().await;
        let mut next = guard.clone();
        let result = change(&mut next)?;
        self.save(&next).await?;
        *guard = next;
        Ok(result)
    }
}

async fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

    if let Err(e) = fs::write(&temp_path, content).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}

#[async_trait::async_trait]
impl SessionStore for JsonFileStore {
    async fn get_all(&self, user_id: &str) -> Result<Vec<WritingSession>, StoreError> {
        Ok(self.data.lock().await.sessions_for(user_id))
    }

    async fn get_by_key(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<WritingSession>, StoreError> {
        Ok(self.data.lock().await.session(user_id, date).cloned())
    }

    async fn upsert(
        &self,
        user_id: &str,
        date: NaiveDate,
        word_count: u64,
    ) -> Result<WritingSession, StoreError> {
        self.mutate(|data| Ok(data.upsert_session(user_id, date, word_count)))
            .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.mutate(|data| {
            if data.remove_session(id) {
                Ok(())
            } else {
                Err(StoreError::NotFound(format!("session {id}")))
            }
        })
        .await
    }
}

#[async_trait::async_trait]
impl GoalStore for JsonFileStore {
    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        Ok(self.data.lock().await.goals_for(user_id))
    }

    async fn goal(&self, id: Uuid) -> Result<Option<Goal>, StoreError> {
        Ok(self.data.lock().await.goal(id).cloned())
    }

    async fn save_goal(&self, goal: Goal) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.upsert_goal(goal);
            Ok(())
        })
        .await
    }

    async fn delete_goal(&self, id: Uuid) -> Result<(), StoreError> {
        self.mutate(|data| {
            if data.remove_goal(id) {
                Ok(())
            } else {
                Err(StoreError::NotFound(format!("goal {id}")))
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileStore::open(temp.path().join("ledger.json"))
            .await
            .unwrap();
        assert!(store.get_all("u").await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("ledger.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.upsert("u", date("2024-03-01"), 250).await.unwrap();
            store.upsert("u", date("2024-03-02"), 400).await.unwrap();
            let goal = Goal::new("u", date("2024-03-01"), date("2024-03-31"), 500).unwrap();
            store.save_goal(goal).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        let sessions = store.get_all("u").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, date("2024-03-02"));
        assert_eq!(store.goals("u").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.upsert("u", date("2024-03-01"), 1).await.unwrap();
        store.upsert("u", date("2024-03-01"), 2).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["ledger.json".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.upsert("u", date("2024-03-01"), 10).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let result = store.delete(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("ledger.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
