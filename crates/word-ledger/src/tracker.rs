//! Session state machine for one writing surface.
//!
//! The tracker owns the [`WordTally`] and decides when a save should be
//! requested. It does no I/O; the [`AutoSaver`](crate::AutoSaver) drives it
//! and performs the actual writes.

use std::fmt;

use chrono::NaiveDate;
use doc_markup::count_markup_words;

use crate::retry::{RetryDecision, RetryPolicy};
use crate::tally::WordTally;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    DocumentSelected,
    ContentLoaded,
    Editing,
    Saving,
    Saved,
    SaveFailed,
    /// Retries exhausted. The next edit re-arms saving.
    GaveUp,
}

/// Save status as shown to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Saving,
    Unsaved,
    Failed,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Saving => "Saving…",
            SaveStatus::Unsaved => "Unsaved changes",
            SaveStatus::Failed => "Save failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    /// The debounce deadline after the last edit (or a retry deadline)
    Debounce,
    /// The writing surface went from visible to hidden
    Hidden,
    /// Flush before the calendar day rolls over
    DayEnd,
}

/// A snapshot of what to persist, taken when the save was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub user_id: String,
    pub date: NaiveDate,
    pub words: u64,
    /// The open document's count at request time, used to rebase on success
    pub live_at_request: u64,
}

#[derive(Debug, Clone)]
pub struct SessionTracker {
    user_id: Option<String>,
    date: NaiveDate,
    document_id: Option<String>,
    tally: WordTally,
    phase: Phase,
    attempts: u32,
    retry: RetryPolicy,
}

impl SessionTracker {
    pub fn new(user_id: Option<String>, date: NaiveDate, persisted_today: u64) -> Self {
        Self {
            user_id,
            date,
            document_id: None,
            tally: WordTally::new(persisted_today),
            phase: Phase::Idle,
            attempts: 0,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn select_document(&mut self, document_id: impl Into<String>) {
        self.document_id = Some(document_id.into());
        self.phase = Phase::DocumentSelected;
    }

    pub fn document_loaded(&mut self, markup: &str) {
        self.tally.load_document(count_markup_words(markup));
        self.phase = Phase::ContentLoaded;
    }

    pub fn edit(&mut self, markup: &str) {
        if self.phase == Phase::GaveUp {
            self.attempts = 0;
        }
        self.tally.set_live(count_markup_words(markup));
        if self.phase != Phase::Saving {
            self.phase = Phase::Editing;
        }
    }

    /// Decide whether a save should happen now, and if so move to `Saving`.
    pub fn begin_save(&mut self, trigger: SaveTrigger, visible: bool) -> Option<SaveRequest> {
        if self.phase == Phase::Saving {
            return None;
        }
        let user_id = self.user_id.clone()?;
        let words = self.tally.words_written_today();
        if words == 0 || words == self.tally.last_persisted {
            return None;
        }
        if trigger == SaveTrigger::Debounce && !visible {
            return None;
        }

        self.phase = Phase::Saving;
        Some(SaveRequest {
            user_id,
            date: self.date,
            words,
            live_at_request: self.tally.live,
        })
    }

    pub fn save_succeeded(&mut self, request: &SaveRequest) {
        if request.date == self.date {
            self.tally.rebase(request.words, request.live_at_request);
        }
        self.attempts = 0;
        self.phase = if self.tally.has_unsaved() {
            Phase::Editing
        } else {
            Phase::Saved
        };
    }

    /// Record a failed save. The tally is left as it was.
    pub fn save_failed(&mut self, _request: &SaveRequest) -> RetryDecision {
        self.attempts += 1;
        let decision = self.retry.decide(self.attempts);
        self.phase = match decision {
            RetryDecision::RetryAfter(_) => Phase::SaveFailed,
            RetryDecision::GiveUp => Phase::GaveUp,
        };
        decision
    }

    pub fn roll_over(&mut self, date: NaiveDate) {
        self.date = date;
        self.tally.roll_over();
        self.attempts = 0;
        if matches!(self.phase, Phase::SaveFailed | Phase::GaveUp | Phase::Editing) {
            self.phase = Phase::Saved;
        }
    }

    pub fn status(&self) -> SaveStatus {
        match self.phase {
            Phase::Saving => SaveStatus::Saving,
            Phase::SaveFailed | Phase::GaveUp => SaveStatus::Failed,
            Phase::Editing => SaveStatus::Unsaved,
            _ => SaveStatus::Saved,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tally(&self) -> &WordTally {
        &self.tally
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn words_written_today(&self) -> u64 {
        self.tally.words_written_today()
    }
}
