//! Debounced autosave driver.
//!
//! One task owns the [`SessionTracker`] and reacts to [`EditorEvent`]s sent
//! over an unbounded channel. Saves are awaited inside the loop, so at most
//! one is ever in flight. A single deadline covers both the debounce after
//! an edit and the wait before a retry.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::retry::RetryDecision;
use crate::store::SessionStore;
use crate::tracker::{Phase, SaveStatus, SaveTrigger, SessionTracker};

/// Default quiet period after the last edit before saving.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    SelectDocument(String),
    /// Markup of the freshly loaded document
    DocumentLoaded(String),
    /// Markup after an edit
    Edit(String),
    /// Whether the writing surface is visible
    Visibility(bool),
    DayChanged(NaiveDate),
    /// The writing surface is going away. Nothing more is saved.
    Unmount,
}

pub struct AutoSaver {
    events: mpsc::UnboundedSender<EditorEvent>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<SessionTracker>,
}

impl AutoSaver {
    pub fn spawn(
        tracker: SessionTracker,
        store: Arc<dyn SessionStore>,
        debounce: Duration,
    ) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(tracker.status());

        let driver = Driver {
            tracker,
            store,
            debounce,
            status_tx,
            visible: true,
            deadline: None,
        };
        let task = tokio::spawn(driver.run(rx));

        Self {
            events,
            status,
            task,
        }
    }

    /// Queue an event. Returns false once the driver has stopped.
    pub fn send(&self, event: EditorEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Unmount and wait for the driver to stop, returning the final tracker.
    pub async fn shutdown(self) -> Result<SessionTracker, JoinError> {
        let _ = self.events.send(EditorEvent::Unmount);
        self.task.await
    }
}

struct Driver {
    tracker: SessionTracker,
    store: Arc<dyn SessionStore>,
    debounce: Duration,
    status_tx: watch::Sender<SaveStatus>,
    visible: bool,
    deadline: Option<Instant>,
}

impl Driver {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EditorEvent>) -> SessionTracker {
        loop {
            let deadline = self.deadline;
            let wait = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => future::pending::<()>().await,
                }
            };

            tokio::select! {
                event = rx.recv() => match event {
                    Some(EditorEvent::Unmount) | None => {
                        debug!("Autosave stopped");
                        break;
                    }
                    Some(event) => self.handle(event).await,
                },

                _ = wait => {
                    self.deadline = None;
                    self.save(SaveTrigger::Debounce).await;
                }
            }

            self.publish();
        }

        self.tracker
    }

    async fn handle(&mut self, event: EditorEvent) {
        match event {
            EditorEvent::SelectDocument(id) => {
                debug!("Selected document {}", id);
                self.tracker.select_document(id);
            }
            EditorEvent::DocumentLoaded(markup) => {
                self.tracker.document_loaded(&markup);
                debug!(
                    "Document loaded, {} words so far today",
                    self.tracker.words_written_today()
                );
            }
            EditorEvent::Edit(markup) => {
                self.tracker.edit(&markup);
                self.deadline = Some(Instant::now() + self.debounce);
            }
            EditorEvent::Visibility(visible) => {
                let was_visible = self.visible;
                self.visible = visible;
                if was_visible && !visible {
                    self.save(SaveTrigger::Hidden).await;
                } else if !was_visible && visible && self.deadline.is_none() {
                    // A save declined while hidden is picked up again
                    if matches!(self.tracker.phase(), Phase::SaveFailed | Phase::Editing) {
                        self.deadline = Some(Instant::now() + self.debounce);
                    }
                }
            }
            EditorEvent::DayChanged(date) => {
                self.save(SaveTrigger::DayEnd).await;
                info!("Starting new day {}", date);
                self.tracker.roll_over(date);
                self.deadline = None;
            }
            EditorEvent::Unmount => {}
        }
    }

    async fn save(&mut self, trigger: SaveTrigger) {
        let Some(request) = self.tracker.begin_save(trigger, self.visible) else {
            return;
        };
        self.publish();
        debug!("Saving {} words for {} ({:?})", request.words, request.date, trigger);

        match self
            .store
            .upsert(&request.user_id, request.date, request.words)
            .await
        {
            Ok(_) => {
                self.tracker.save_succeeded(&request);
                info!("Saved {} words for {}", request.words, request.date);
            }
            Err(e) => match self.tracker.save_failed(&request) {
                RetryDecision::RetryAfter(delay) => {
                    warn!("Failed to save word count: {}. Retrying in {:?}", e, delay);
                    self.deadline = Some(Instant::now() + delay);
                }
                RetryDecision::GiveUp => {
                    warn!("Failed to save word count: {}. Giving up until the next edit", e);
                    self.deadline = None;
                }
            },
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.tracker.status());
    }
}
