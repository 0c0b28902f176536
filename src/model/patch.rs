//! Typed partial updates for boards and tasks.
//!
//! A patch names every editable field explicitly; `None` leaves the stored
//! value alone. Identity fields (`id`, `boardId`, `createdAt`) and
//! `completedAt` have no patch field and cannot be changed this way.

use chrono::{NaiveDate, Utc};

use super::board::Board;
use super::status::{Priority, TaskStatus};
use super::task::{dedup_tags, Task};

// ============================================================================
// Board Patch
// ============================================================================

/// Editable board metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl BoardPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.color.is_none()
    }

    /// Apply the patch and stamp `updatedAt`, even when the patch is empty.
    pub fn apply_to(&self, board: &mut Board) {
        if let Some(title) = &self.title {
            board.title = title.clone();
        }
        if let Some(description) = &self.description {
            board.description = description.clone();
        }
        if let Some(color) = &self.color {
            board.color = color.clone();
        }
        board.updated_at = Utc::now();
    }
}

// ============================================================================
// Task Patch
// ============================================================================

/// Editable task fields.
///
/// `due_date` is doubly optional: `Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub column_id: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub estimated_time: Option<f64>,
    pub actual_time: Option<f64>,
    pub dependencies: Option<Vec<String>>,
}

impl TaskPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch carrying the two fields a move rewrites.
    #[must_use]
    pub fn placement(column_id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            column_id: Some(column_id.into()),
            status: Some(status),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_due_date(mut self, due: Option<NaiveDate>) -> Self {
        self.due_date = Some(due);
        self
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_estimated_time(mut self, hours: f64) -> Self {
        self.estimated_time = Some(hours);
        self
    }

    #[must_use]
    pub fn with_actual_time(mut self, hours: f64) -> Self {
        self.actual_time = Some(hours);
        self
    }

    #[must_use]
    pub fn with_dependencies<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.dependencies = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch and stamp `updatedAt`, even when the patch is empty.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(column_id) = &self.column_id {
            task.column_id = column_id.clone();
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(tags) = &self.tags {
            task.tags = dedup_tags(tags.clone());
        }
        if let Some(hours) = self.estimated_time {
            task.estimated_time = hours;
        }
        if let Some(hours) = self.actual_time {
            task.actual_time = hours;
        }
        if let Some(deps) = &self.dependencies {
            task.dependencies = deps.clone();
        }
        task.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTask;

    #[test]
    fn test_board_patch_touches_only_named_fields() {
        let mut board = Board::new("Home").with_description("chores");
        let id = board.id.clone();
        let created = board.created_at;

        BoardPatch::new().with_title("House").apply_to(&mut board);

        assert_eq!(board.title, "House");
        assert_eq!(board.description, "chores");
        assert_eq!(board.id, id);
        assert_eq!(board.created_at, created);
        assert!(board.updated_at >= created);
    }

    #[test]
    fn test_empty_patches() {
        assert!(BoardPatch::new().is_empty());
        assert!(TaskPatch::new().is_empty());
        assert!(!TaskPatch::new().with_due_date(None).is_empty());
    }

    #[test]
    fn test_task_patch_fields() {
        let mut task = Task::new(
            "board-1",
            "col-1",
            NewTask::new("Write docs").with_due_date(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()),
        );
        let before = task.updated_at;

        TaskPatch::new()
            .with_priority(Priority::High)
            .with_tags(["a", "b", "a"])
            .with_estimated_time(2.5)
            .with_due_date(None)
            .apply_to(&mut task);

        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tags, vec!["a", "b"]);
        assert_eq!(task.estimated_time, 2.5);
        assert!(task.due_date.is_none());
        assert_eq!(task.title, "Write docs");
        assert_eq!(task.board_id, "board-1");
        assert!(task.updated_at >= before);
    }

    #[test]
    fn test_placement_patch() {
        let mut task = Task::new("board-1", "col-1", NewTask::new("t"));
        TaskPatch::placement("col-2", TaskStatus::Review).apply_to(&mut task);
        assert_eq!(task.column_id, "col-2");
        assert_eq!(task.status, TaskStatus::Review);
        assert!(task.completed_at.is_none());
    }
}
