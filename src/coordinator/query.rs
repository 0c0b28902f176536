//! Board statistics and task search.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::BoardCoordinator;
use crate::error::{KanbanError, Result};
use crate::model::{Task, TaskStatus};
use crate::storage::KeyValueStore;

/// Days counted as "this week" from today, inclusive.
const WEEK_DAYS: u64 = 7;

// ============================================================================
// Statistics
// ============================================================================

/// Task counts for one board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStatistics {
    pub total: usize,
    pub completed: usize,
    /// Tasks in progress or under review.
    pub in_progress: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_this_week: usize,
    /// Completed share of all tasks, 0-100, rounded.
    pub progress: u32,
}

impl BoardStatistics {
    /// Tally `tasks` as of `now`.
    #[must_use]
    pub fn collect(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let mut stats = Self {
            total: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            if task.status == TaskStatus::Done {
                stats.completed += 1;
            }
            if task.status.is_active() {
                stats.in_progress += 1;
            }
            if TaskFilter::Overdue.matches_at(task, now) {
                stats.overdue += 1;
            }
            if task.due_date == Some(today) {
                stats.due_today += 1;
            }
            if TaskFilter::Week.matches_at(task, now) {
                stats.due_this_week += 1;
            }
        }

        if stats.total > 0 {
            stats.progress = (stats.completed as f64 * 100.0 / stats.total as f64).round() as u32;
        }
        stats
    }
}

// ============================================================================
// Search
// ============================================================================

/// Due-date filter applied on top of a text query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    /// Due today.
    Today,
    /// Due between today and seven days from now.
    Week,
    /// Due before today and not done.
    Overdue,
}

impl TaskFilter {
    #[must_use]
    pub fn matches_at(&self, task: &Task, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        match (self, task.due_date) {
            (TaskFilter::All, _) => true,
            (_, None) => false,
            (TaskFilter::Today, Some(due)) => due == today,
            (TaskFilter::Week, Some(due)) => due >= today && due <= week_end(today),
            (TaskFilter::Overdue, Some(due)) => due < today && task.status != TaskStatus::Done,
        }
    }
}

fn week_end(today: NaiveDate) -> NaiveDate {
    today.checked_add_days(Days::new(WEEK_DAYS)).unwrap_or(NaiveDate::MAX)
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFilter::All => write!(f, "all"),
            TaskFilter::Today => write!(f, "today"),
            TaskFilter::Week => write!(f, "week"),
            TaskFilter::Overdue => write!(f, "overdue"),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = KanbanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "today" => Ok(TaskFilter::Today),
            "week" => Ok(TaskFilter::Week),
            "overdue" => Ok(TaskFilter::Overdue),
            other => Err(KanbanError::validation(
                "filter",
                format!("'{}' is not one of all, today, week, overdue", other),
            )),
        }
    }
}

/// Text and due-date search over tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to one board, in column order. `None` searches every task.
    pub board_id: Option<String>,
    /// Case-insensitive substring of title, description or a tag.
    pub text: String,
    pub filter: TaskFilter,
}

impl TaskQuery {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn on_board(mut self, board_id: impl Into<String>) -> Self {
        self.board_id = Some(board_id.into());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn matches_at(&self, task: &Task, now: DateTime<Utc>) -> bool {
        self.matches_text(task) && self.filter.matches_at(task, now)
    }

    fn matches_text(&self, task: &Task) -> bool {
        let needle = self.text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle)
            || task.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

impl<S: KeyValueStore> BoardCoordinator<S> {
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such board.
    pub fn statistics(&self, board_id: &str) -> Result<BoardStatistics> {
        self.statistics_at(board_id, Utc::now())
    }

    /// Statistics for the tasks a board lists, as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such board.
    pub fn statistics_at(&self, board_id: &str, now: DateTime<Utc>) -> Result<BoardStatistics> {
        Ok(BoardStatistics::collect(&self.board_tasks(board_id)?, now))
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if the query names an unknown board.
    pub fn search(&self, query: &TaskQuery) -> Result<Vec<Task>> {
        self.search_at(query, Utc::now())
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if the query names an unknown board.
    pub fn search_at(&self, query: &TaskQuery, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let tasks = match &query.board_id {
            Some(board_id) => self.board_tasks(board_id)?,
            None => self.gateway.list_tasks(),
        };
        Ok(tasks
            .into_iter()
            .filter(|t| query.matches_at(t, now))
            .collect())
    }
}
