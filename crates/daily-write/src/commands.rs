//! One-shot subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use uuid::Uuid;
use word_ledger::{
    Goal, GoalProgress, GoalStore, GoalSummary, SessionStore, current_goal, sessions_in_range,
    writing_stats,
};

use crate::context::Context;
use crate::server::{self, AppState};

pub async fn list_documents(ctx: &Context) -> Result<()> {
    let documents = ctx
        .gateway()?
        .list_recent_documents(&ctx.credential()?)
        .await?;

    if documents.is_empty() {
        println!("No documents found");
    }
    for doc in documents {
        println!("{}  {}  {}", doc.modified_time, doc.id, doc.name);
    }
    Ok(())
}

pub async fn create_document(ctx: &Context, title: &str) -> Result<()> {
    let doc = ctx
        .gateway()?
        .create_document(&ctx.credential()?, title)
        .await?;
    println!("Created {} ({})", doc.name, doc.id);
    println!("{}", doc.web_view_link);
    Ok(())
}

pub async fn list_tabs(ctx: &Context, document_id: &str) -> Result<()> {
    let tabs = ctx
        .gateway()?
        .list_containers(&ctx.credential()?, document_id)
        .await?;

    for tab in tabs {
        println!("{}{}  {}", "  ".repeat(tab.nesting_depth), tab.id, tab.title);
    }
    Ok(())
}

pub async fn pull(
    ctx: &Context,
    document_id: &str,
    tab_id: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let markup = ctx
        .gateway()?
        .fetch_as_markup(&ctx.credential()?, document_id, tab_id)
        .await?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &markup)
                .await
                .with_context(|| format!("Failed to write {:?}", path))?;
            println!("Saved {} to {}", document_id, path.display());
        }
        None => println!("{}", markup),
    }
    Ok(())
}

pub async fn push(
    ctx: &Context,
    document_id: &str,
    file: &Path,
    tab_id: Option<&str>,
) -> Result<()> {
    let markup = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let outcome = ctx
        .gateway()?
        .replace_with_markup(&ctx.credential()?, document_id, &markup, tab_id)
        .await?;
    println!("Wrote {} words to {}", outcome.word_count, document_id);
    Ok(())
}

pub async fn stats(ctx: &Context) -> Result<()> {
    let user = ctx.require_user()?;
    let store = ctx.store().await?;
    let today = chrono::Local::now().date_naive();

    let sessions = store.get_all(user).await?;
    let goals = store.goals(user).await?;
    let stats = writing_stats(&sessions, today);
    let written = sessions
        .iter()
        .find(|s| s.date == today)
        .map_or(0, |s| s.word_count);
    let progress = GoalProgress::for_day(current_goal(&goals, today), written, today);

    println!("Today:          {} / {} words ({}%)", progress.written, progress.target, progress.percent);
    if progress.remaining > 0 {
        println!("Remaining:      {}", progress.remaining);
    }
    if progress.days_left > 0 {
        println!("Days left:      {}", progress.days_left);
    }
    println!("Total words:    {}", stats.total_words);
    println!("Days written:   {}", stats.total_days_written);
    println!("Average/day:    {}", stats.average_words_per_day);
    println!("Current streak: {} days", stats.current_streak);
    Ok(())
}

pub async fn history(ctx: &Context, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let user = ctx.require_user()?;
    let sessions = ctx.store().await?.get_all(user).await?;

    for session in sessions_in_range(&sessions, from, to) {
        println!("{}  {:>6}", session.date, session.word_count);
    }
    Ok(())
}

pub async fn list_goals(ctx: &Context) -> Result<()> {
    let user = ctx.require_user()?;
    let store = ctx.store().await?;
    let today = chrono::Local::now().date_naive();
    let sessions = store.get_all(user).await?;

    for goal in store.goals(user).await? {
        let summary = GoalSummary::for_goal(&goal, &sessions, today);
        println!(
            "{}  {} to {}  {}/day  {} / {} words ({}%){}",
            goal.id,
            goal.start_date,
            goal.end_date,
            goal.daily_word_target,
            summary.total_words,
            summary.target_total_words,
            summary.percent,
            if summary.is_completed { "  done" } else { "" }
        );
    }
    Ok(())
}

pub async fn add_goal(ctx: &Context, start: NaiveDate, end: NaiveDate, target: u64) -> Result<()> {
    let user = ctx.require_user()?;
    let goal = Goal::new(user, start, end, target)?;
    ctx.store().await?.save_goal(goal.clone()).await?;
    println!("Added goal {}", goal.id);
    Ok(())
}

pub async fn delete_goal(ctx: &Context, id: Uuid) -> Result<()> {
    ctx.store().await?.delete_goal(id).await?;
    println!("Deleted goal {}", id);
    Ok(())
}

pub async fn serve(ctx: &Context, bind: Option<&str>) -> Result<()> {
    let store = ctx.store().await?;
    let state = Arc::new(AppState {
        gateway: ctx.gateway()?,
        sessions: store.clone(),
        goals: store,
        user_id: ctx.user_id().map(str::to_string),
    });

    server::serve(state, bind.unwrap_or(&ctx.settings.server.bind)).await
}
