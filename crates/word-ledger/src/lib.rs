//! Daily word-delta accounting.
//!
//! Tracks how many words a writer has added today across one or more
//! documents, and persists that total with debounced, retried saves.
//!
//! - [`WordTally`]: the counters and their arithmetic
//! - [`SessionTracker`]: the save state machine over a tally
//! - [`AutoSaver`]: a tokio task driving a tracker from editor events
//! - [`SessionStore`] / [`GoalStore`]: persistence, in memory or as JSON
//! - [`writing_stats`], [`current_goal`], [`GoalProgress`]: derived views

pub mod autosave;
pub mod error;
pub mod records;
pub mod retry;
pub mod stats;
pub mod store;
pub mod tally;
pub mod tracker;

pub use autosave::{AutoSaver, DEFAULT_DEBOUNCE, EditorEvent};
pub use error::{LedgerError, Result, StoreError};
pub use records::{Goal, WritingSession};
pub use retry::{RetryDecision, RetryPolicy};
pub use stats::{
    DEFAULT_DAILY_TARGET, GoalProgress, GoalSummary, WritingStats, current_goal,
    sessions_in_range, writing_stats,
};
pub use store::{GoalStore, JsonFileStore, LedgerData, MemoryStore, SessionStore};
pub use tally::WordTally;
pub use tracker::{Phase, SaveRequest, SaveStatus, SaveTrigger, SessionTracker};
