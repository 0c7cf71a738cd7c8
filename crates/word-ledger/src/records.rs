//! Persisted records: daily writing sessions and goals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// One user's word total for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingSession {
    pub id: Uuid,
    pub user_id: String,
    pub date: NaiveDate,
    pub word_count: u64,
    pub updated_at: DateTime<Utc>,
}

impl WritingSession {
    pub fn new(user_id: impl Into<String>, date: NaiveDate, word_count: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            date,
            word_count,
            updated_at: Utc::now(),
        }
    }
}

/// A daily word target over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_word_target: u64,
}

impl Goal {
    pub fn new(
        user_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        daily_word_target: u64,
    ) -> Result<Self> {
        if end_date < start_date {
            return Err(LedgerError::InvalidGoal(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }
        if daily_word_target == 0 {
            return Err(LedgerError::InvalidGoal(
                "daily word target must be positive".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            start_date,
            end_date,
            daily_word_target,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
