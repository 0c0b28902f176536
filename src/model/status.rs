//! Task priority and workflow status.
//!
//! - [`Priority`] - fixed three-level enum, parsed strictly
//! - [`TaskStatus`] - workflow position, derived from column titles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KanbanError;

// ============================================================================
// Priority
// ============================================================================

/// Task priority. Serialized as `"Low"`, `"Medium"`, `"High"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = KanbanError;

    /// Exact, case-sensitive match against the stored spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                KanbanError::validation(
                    "priority",
                    format!("'{}' is not one of Low, Medium, High", s),
                )
            })
    }
}

// ============================================================================
// Task Status
// ============================================================================

/// Workflow status of a task.
///
/// Serialized as `"todo"`, `"inprogress"`, `"review"`, `"done"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "inprogress"),
            TaskStatus::Review => write!(f, "review"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

impl TaskStatus {
    /// Infer the status implied by a column title.
    ///
    /// Case-insensitive substring match, first hit wins:
    ///
    /// 1. `done` / `complete` -> [`TaskStatus::Done`]
    /// 2. `review` / `testing` -> [`TaskStatus::Review`]
    /// 3. `progress` / `doing` -> [`TaskStatus::InProgress`]
    /// 4. anything else -> [`TaskStatus::Todo`]
    ///
    /// # Example
    ///
    /// ```
    /// use kanban::model::TaskStatus;
    ///
    /// assert_eq!(TaskStatus::from_column_title("Code Review"), TaskStatus::Review);
    /// assert_eq!(TaskStatus::from_column_title("Done In Progress"), TaskStatus::Done);
    /// assert_eq!(TaskStatus::from_column_title("Backlog"), TaskStatus::Todo);
    /// ```
    #[must_use]
    pub fn from_column_title(title: &str) -> Self {
        let title = title.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| title.contains(n));

        if has(&["done", "complete"]) {
            TaskStatus::Done
        } else if has(&["review", "testing"]) {
            TaskStatus::Review
        } else if has(&["progress", "doing"]) {
            TaskStatus::InProgress
        } else {
            TaskStatus::Todo
        }
    }

    /// Counted as "in progress" by board statistics.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("Low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert!("high".parse::<Priority>().is_err());
        assert!("Urgent".parse::<Priority>().unwrap_err().is_validation());
    }

    #[test]
    fn test_priority_serde() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"High\"");
        let p: Priority = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"inprogress\""
        );
        let s: TaskStatus = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(s, TaskStatus::Review);
        assert_eq!(TaskStatus::Done.to_string(), "done");
    }

    #[test]
    fn test_status_from_column_title() {
        assert_eq!(
            TaskStatus::from_column_title("Code Review"),
            TaskStatus::Review
        );
        assert_eq!(
            TaskStatus::from_column_title("In Progress"),
            TaskStatus::InProgress
        );
        assert_eq!(TaskStatus::from_column_title("Done ✅"), TaskStatus::Done);
        assert_eq!(TaskStatus::from_column_title("Backlog"), TaskStatus::Todo);
        assert_eq!(
            TaskStatus::from_column_title("Done In Progress"),
            TaskStatus::Done
        );
    }

    #[test]
    fn test_status_from_column_title_keywords() {
        assert_eq!(TaskStatus::from_column_title("COMPLETED"), TaskStatus::Done);
        assert_eq!(TaskStatus::from_column_title("QA testing"), TaskStatus::Review);
        assert_eq!(TaskStatus::from_column_title("Doing"), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_column_title("To Do"), TaskStatus::Todo);
        assert_eq!(TaskStatus::from_column_title(""), TaskStatus::Todo);
        // review outranks progress
        assert_eq!(
            TaskStatus::from_column_title("Review in progress"),
            TaskStatus::Review
        );
    }

    #[test]
    fn test_status_is_active() {
        assert!(!TaskStatus::Todo.is_active());
        assert!(TaskStatus::InProgress.is_active());
        assert!(TaskStatus::Review.is_active());
        assert!(!TaskStatus::Done.is_active());
    }
}
