//! A writing day end to end: autosave into a JSON ledger, then statistics.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;
use word_ledger::{
    AutoSaver, EditorEvent, Goal, GoalProgress, GoalStore, JsonFileStore, SaveStatus,
    SessionStore, SessionTracker, current_goal, writing_stats,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[tokio::test]
async fn test_day_of_writing_lands_in_ledger() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.json");
    let today = date("2024-03-05");

    let store = Arc::new(JsonFileStore::open(&path).await.unwrap());
    store.upsert("writer", date("2024-03-04"), 700).await.unwrap();
    store.upsert("writer", today, 100).await.unwrap();
    let goal = Goal::new("writer", date("2024-03-01"), date("2024-03-31"), 500).unwrap();
    store.save_goal(goal).await.unwrap();

    // Resume today from what is already stored
    let persisted = store
        .get_by_key("writer", today)
        .await
        .unwrap()
        .map_or(0, |s| s.word_count);
    let tracker = SessionTracker::new(Some("writer".into()), today, persisted);
    let saver = AutoSaver::spawn(tracker, store.clone(), Duration::from_millis(50));

    saver.send(EditorEvent::SelectDocument("novel".into()));
    saver.send(EditorEvent::DocumentLoaded("# Draft\n\nIt was night.".into()));
    saver.send(EditorEvent::Edit(
        "# Draft\n\nIt was night. The **rain** kept falling.".into(),
    ));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(*saver.status().borrow(), SaveStatus::Saved);

    // Switch documents with unsaved words, then hide the window
    saver.send(EditorEvent::Edit(
        "# Draft\n\nIt was night. The **rain** kept falling. Then silence.".into(),
    ));
    saver.send(EditorEvent::SelectDocument("journal".into()));
    saver.send(EditorEvent::DocumentLoaded("Dear diary".into()));
    saver.send(EditorEvent::Edit("Dear diary, today went well".into()));
    saver.send(EditorEvent::Visibility(false));
    let tracker = saver.shutdown().await.unwrap();
    assert_eq!(tracker.words_written_today(), 100 + 4 + 2 + 3);

    // A fresh handle sees the same data
    let reopened = JsonFileStore::open(&path).await.unwrap();
    let sessions = reopened.get_all("writer").await.unwrap();
    assert_eq!(sessions[0].date, today);
    assert_eq!(sessions[0].word_count, 109);

    let stats = writing_stats(&sessions, today);
    assert_eq!(stats.total_words, 809);
    assert_eq!(stats.current_streak, 2);

    let goals = reopened.goals("writer").await.unwrap();
    let progress = GoalProgress::for_day(current_goal(&goals, today), 109, today);
    assert_eq!(progress.target, 500);
    assert_eq!(progress.remaining, 391);
    assert_eq!(progress.days_left, 27);
}
