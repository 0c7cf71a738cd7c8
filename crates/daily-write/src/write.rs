//! `daily-write write`: edit a local Markdown file and count today's words.
//!
//! The file is the writing surface. Every change on disk becomes an edit
//! event for the autosaver; Ctrl+C hides the surface, waits for the
//! pending count to be flushed and, when the file is bound to a document,
//! pushes the final content back to it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use docs_gateway::{Credential, DocsApi, Gateway};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use word_ledger::{AutoSaver, EditorEvent, SessionStore, SessionTracker};

use crate::context::Context;

/// How often to check whether the calendar day has changed
const DAY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Watches a single file for changes.
struct FileSurface {
    path: PathBuf,
    /// Debouncer handle (must keep alive)
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    changes: mpsc::UnboundedReceiver<()>,
}

impl FileSurface {
    fn watch(path: &Path) -> Result<Self> {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .context("File has no parent directory")?;

        let (tx, changes) = mpsc::unbounded_channel();
        let target = path.clone();
        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    if events.iter().any(|event| event.path == target) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => error!("File watcher error: {}", e),
            },
        )?;

        // Editors often replace the file on save, so watch its directory
        debouncer
            .watcher()
            .watch(&parent, RecursiveMode::NonRecursive)?;

        Ok(Self {
            path,
            _debouncer: debouncer,
            changes,
        })
    }
}

pub async fn run(
    ctx: &Context,
    file: &Path,
    document_id: Option<&str>,
    tab_id: Option<&str>,
) -> Result<()> {
    let store = ctx.store().await?;
    let mut today = chrono::Local::now().date_naive();
    let persisted = match ctx.user_id() {
        Some(user) => store
            .get_by_key(user, today)
            .await?
            .map_or(0, |session| session.word_count),
        None => 0,
    };
    if ctx.user_id().is_none() {
        info!("No user configured; word counts will not be saved");
    }

    let binding = match document_id {
        Some(id) => Some(Binding {
            gateway: ctx.gateway()?,
            credential: ctx.credential()?,
            document_id: id,
            tab_id,
        }),
        None => None,
    };

    // Load the starting content, from the document if one is bound
    let mut content = match &binding {
        Some(binding) => {
            let markup = binding
                .gateway
                .fetch_as_markup(&binding.credential, binding.document_id, binding.tab_id)
                .await?;
            tokio::fs::write(file, &markup)
                .await
                .with_context(|| format!("Failed to write {:?}", file))?;
            markup
        }
        None => match tokio::fs::read_to_string(file).await {
            Ok(markup) => markup,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::write(file, "").await?;
                String::new()
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {:?}", file)),
        },
    };

    let tracker = SessionTracker::new(ctx.user_id().map(str::to_string), today, persisted)
        .with_retry_policy(ctx.settings.retry.policy());
    let saver = AutoSaver::spawn(tracker, store, ctx.settings.autosave.debounce());
    let mut status = saver.status();

    let surface_id = document_id
        .map(str::to_string)
        .unwrap_or_else(|| file.display().to_string());
    saver.send(EditorEvent::SelectDocument(surface_id));
    saver.send(EditorEvent::DocumentLoaded(content.clone()));

    let mut surface = FileSurface::watch(file)?;
    let mut day_check = tokio::time::interval(DAY_CHECK_INTERVAL);

    println!("Writing to {}. Press Ctrl+C to stop.", surface.path.display());

    loop {
        tokio::select! {
            Some(()) = surface.changes.recv() => {
                match tokio::fs::read_to_string(&surface.path).await {
                    Ok(markup) if markup != content => {
                        debug!("File changed ({} bytes)", markup.len());
                        content = markup;
                        saver.send(EditorEvent::Edit(content.clone()));
                    }
                    Ok(_) => {}
                    Err(e) => error!("Failed to read {:?}: {}", surface.path, e),
                }
            }

            _ = day_check.tick() => {
                let now = chrono::Local::now().date_naive();
                if now != today {
                    today = now;
                    saver.send(EditorEvent::DayChanged(today));
                }
            }

            Ok(()) = status.changed() => {
                let current = *status.borrow_and_update();
                println!("{}", current);
            }

            _ = signal::ctrl_c() => {
                info!("Stopping");
                break;
            }
        }
    }

    let tracker = finish(saver, &content, binding).await?;
    println!(
        "{} words written today ({})",
        tracker.words_written_today(),
        tracker.status()
    );
    Ok(())
}

/// The document a writing session pushes back to on exit.
struct Binding<'a, A> {
    gateway: Gateway<A>,
    credential: Credential,
    document_id: &'a str,
    tab_id: Option<&'a str>,
}

/// Hide the surface and wait for the ledger flush, then push the final
/// content. A failed push is reported and does not lose the saved count.
async fn finish<A: DocsApi>(
    saver: AutoSaver,
    content: &str,
    binding: Option<Binding<'_, A>>,
) -> Result<SessionTracker> {
    saver.send(EditorEvent::Visibility(false));
    let tracker = saver.shutdown().await?;

    if let Some(binding) = binding {
        match binding
            .gateway
            .replace_with_markup(
                &binding.credential,
                binding.document_id,
                content,
                binding.tab_id,
            )
            .await
        {
            Ok(outcome) => println!(
                "Pushed {} words to {}",
                outcome.word_count, binding.document_id
            ),
            Err(e) => error!(
                "Failed to push to {}: {}. Your text is still in the local file",
                binding.document_id, e
            ),
        }
    }

    Ok(tracker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use docs_gateway::InMemoryDocsApi;
    use word_ledger::{MemoryStore, SaveStatus};

    fn start(store: Arc<MemoryStore>, today: chrono::NaiveDate) -> AutoSaver {
        let tracker = SessionTracker::new(Some("writer".into()), today, 0);
        let saver = AutoSaver::spawn(tracker, store, Duration::from_secs(60));
        saver.send(EditorEvent::SelectDocument("doc".into()));
        saver.send(EditorEvent::DocumentLoaded("one two".into()));
        saver.send(EditorEvent::Edit("one two three four".into()));
        saver
    }

    #[tokio::test]
    async fn test_failed_push_keeps_flushed_count() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let store = Arc::new(MemoryStore::new());
        let api = InMemoryDocsApi::new();
        let document_id = api.add_document("Draft", "one two");
        api.set_unavailable(true);

        let saver = start(store.clone(), today);
        let binding = Binding {
            gateway: Gateway::new(api),
            credential: Credential::bearer("ya29.test"),
            document_id: &document_id,
            tab_id: None,
        };

        let tracker = finish(saver, "one two three four", Some(binding))
            .await
            .unwrap();

        assert_eq!(tracker.words_written_today(), 2);
        assert_eq!(tracker.status(), SaveStatus::Saved);
        let saved = store.get_by_key("writer", today).await.unwrap().unwrap();
        assert_eq!(saved.word_count, 2);
    }

    #[tokio::test]
    async fn test_push_after_flush() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let store = Arc::new(MemoryStore::new());
        let api = Arc::new(InMemoryDocsApi::new());
        let document_id = api.add_document("Draft", "one two");

        let saver = start(store.clone(), today);
        let binding = Binding {
            gateway: Gateway::new(api.clone()),
            credential: Credential::bearer("ya29.test"),
            document_id: &document_id,
            tab_id: None,
        };
        finish(saver, "one two *three* four", Some(binding))
            .await
            .unwrap();

        let markup = Gateway::new(api)
            .fetch_as_markup(&Credential::bearer("ya29.test"), &document_id, None)
            .await
            .unwrap();
        assert_eq!(markup, "one two *three* four");
        assert!(store.get_by_key("writer", today).await.unwrap().is_some());
    }
}
