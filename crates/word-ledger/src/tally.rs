//! The four counters behind "words written today".

use serde::Serialize;

/// Word counts for one user and one calendar day.
///
/// - `session_start`: the day's total already accounted for
/// - `doc_start`: the open document's count when it was loaded or last saved
/// - `live`: the open document's current count
/// - `last_persisted`: the last total written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTally {
    pub session_start: u64,
    pub doc_start: u64,
    pub live: u64,
    pub last_persisted: u64,
}

impl WordTally {
    /// Start from the total already stored for today.
    pub fn new(persisted_today: u64) -> Self {
        Self {
            session_start: persisted_today,
            last_persisted: persisted_today,
            ..Self::default()
        }
    }

    /// Net new words in the open document. Deleting below the baseline
    /// counts as zero, never as negative.
    pub fn document_added(&self) -> u64 {
        self.live.saturating_sub(self.doc_start)
    }

    pub fn words_written_today(&self) -> u64 {
        self.session_start + self.document_added()
    }

    pub fn has_unsaved(&self) -> bool {
        self.words_written_today() != self.last_persisted
    }

    /// Switch to a newly loaded document of `words` words.
    ///
    /// Words added to the outgoing document are folded into the day's
    /// baseline first, so nothing is lost if they were not saved yet.
    pub fn load_document(&mut self, words: u64) {
        self.session_start = self.words_written_today();
        self.doc_start = words;
        self.live = words;
    }

    pub fn set_live(&mut self, words: u64) {
        self.live = words;
    }

    /// Rebase after `persisted` was stored, with `live_at_request` being the
    /// document count captured when the save was requested.
    pub fn rebase(&mut self, persisted: u64, live_at_request: u64) {
        self.last_persisted = persisted;
        self.session_start = persisted;
        self.doc_start = live_at_request;
    }

    /// Start a new day with the open document as the baseline.
    pub fn roll_over(&mut self) {
        self.session_start = 0;
        self.last_persisted = 0;
        self.doc_start = self.live;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_with_existing_total() {
        let mut tally = WordTally::new(300);
        tally.load_document(1000);
        assert_eq!(tally.words_written_today(), 300);

        tally.set_live(1150);
        assert_eq!(tally.words_written_today(), 450);
    }

    #[test]
    fn test_deleting_never_goes_negative() {
        let mut tally = WordTally::new(0);
        tally.load_document(1000);
        tally.set_live(900);
        assert_eq!(tally.document_added(), 0);
        assert_eq!(tally.words_written_today(), 0);
        assert!(!tally.has_unsaved());
    }

    #[test]
    fn test_rebase_uses_requested_live() {
        let mut tally = WordTally::new(0);
        tally.load_document(100);
        tally.set_live(150);

        tally.rebase(50, 150);
        // Typing continued while the save was in flight
        tally.set_live(160);
        assert_eq!(tally.words_written_today(), 60);
        assert_eq!(tally.last_persisted, 50);
    }

    #[test]
    fn test_document_switch_keeps_unsaved_words() {
        let mut tally = WordTally::new(0);
        tally.load_document(100);
        tally.set_live(130);

        tally.load_document(500);
        assert_eq!(tally.words_written_today(), 30);

        tally.set_live(510);
        assert_eq!(tally.words_written_today(), 40);
    }

    #[test]
    fn test_roll_over() {
        let mut tally = WordTally::new(0);
        tally.load_document(100);
        tally.set_live(180);
        tally.rebase(80, 180);

        tally.roll_over();
        assert_eq!(tally.words_written_today(), 0);
        tally.set_live(190);
        assert_eq!(tally.words_written_today(), 10);
    }
}
