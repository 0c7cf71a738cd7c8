//! Writing statistics and goal progress derived from stored records.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::records::{Goal, WritingSession};

/// Daily target used when no goal covers the day.
pub const DEFAULT_DAILY_TARGET: u64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingStats {
    pub total_words: u64,
    /// Days with a positive word count
    pub total_days_written: u64,
    /// Rounded mean over the days written
    pub average_words_per_day: u64,
    /// Consecutive positive days ending today
    pub current_streak: u64,
}

pub fn writing_stats(sessions: &[WritingSession], today: NaiveDate) -> WritingStats {
    let total_words: u64 = sessions.iter().map(|s| s.word_count).sum();
    let total_days_written = sessions.iter().filter(|s| s.word_count > 0).count() as u64;
    let average_words_per_day = if total_days_written > 0 {
        (total_words as f64 / total_days_written as f64).round() as u64
    } else {
        0
    };

    let wrote_on = |date: NaiveDate| {
        sessions
            .iter()
            .any(|s| s.date == date && s.word_count > 0)
    };

    let mut current_streak = 0;
    let mut check = Some(today);
    while let Some(date) = check {
        if !wrote_on(date) {
            break;
        }
        current_streak += 1;
        check = date.checked_sub_days(Days::new(1));
    }

    WritingStats {
        total_words,
        total_days_written,
        average_words_per_day,
        current_streak,
    }
}

/// The goal covering `today`. With overlapping goals the one that started
/// most recently wins.
pub fn current_goal(goals: &[Goal], today: NaiveDate) -> Option<&Goal> {
    goals
        .iter()
        .filter(|g| g.contains(today))
        .max_by_key(|g| g.start_date)
}

/// Sessions dated within `from..=to`, oldest first.
pub fn sessions_in_range(
    sessions: &[WritingSession],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<WritingSession> {
    let mut in_range: Vec<_> = sessions
        .iter()
        .filter(|s| from <= s.date && s.date <= to)
        .cloned()
        .collect();
    in_range.sort_by(|a, b| a.date.cmp(&b.date));
    in_range
}

/// Today's progress against the current goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub target: u64,
    pub written: u64,
    pub remaining: u64,
    /// 0-100
    pub percent: u8,
    /// Days left in the goal, today included. Zero without a goal.
    pub days_left: u64,
}

impl GoalProgress {
    pub fn for_day(goal: Option<&Goal>, written: u64, today: NaiveDate) -> Self {
        let target = goal.map_or(DEFAULT_DAILY_TARGET, |g| g.daily_word_target);
        let days_left = goal.map_or(0, |g| {
            (g.end_date - today).num_days().saturating_add(1).max(0) as u64
        });

        Self {
            target,
            written,
            remaining: target.saturating_sub(written),
            percent: percent_of(written, target),
            days_left,
        }
    }
}

/// Totals for a goal's whole date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub total_days: u64,
    pub days_logged: u64,
    pub total_words: u64,
    pub target_total_words: u64,
    pub percent: u8,
    pub is_completed: bool,
    /// Mean over elapsed days, or over the whole range once it has ended
    pub average_words_per_day: u64,
}

impl GoalSummary {
    pub fn for_goal(goal: &Goal, sessions: &[WritingSession], today: NaiveDate) -> Self {
        let total_days = ((goal.end_date - goal.start_date).num_days() + 1) as u64;
        let in_goal = sessions_in_range(sessions, goal.start_date, goal.end_date);
        let days_logged = in_goal.len() as u64;
        let total_words: u64 = in_goal.iter().map(|s| s.word_count).sum();
        let target_total_words = total_days * goal.daily_word_target;
        let is_completed = goal.end_date < today;

        let elapsed_days = if is_completed {
            total_days
        } else {
            (today - goal.start_date).num_days().max(1) as u64
        };
        let average_words_per_day = if days_logged > 0 {
            (total_words as f64 / elapsed_days as f64).round() as u64
        } else {
            0
        };

        Self {
            total_days,
            days_logged,
            total_words,
            target_total_words,
            percent: percent_of(total_words, target_total_words),
            is_completed,
            average_words_per_day,
        }
    }
}

fn percent_of(part: u64, whole: u64) -> u8 {
    if whole == 0 {
        return 100;
    }
    ((part as f64 / whole as f64) * 100.0).min(100.0) as u8
}
