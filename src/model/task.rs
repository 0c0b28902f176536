//! Task entity.
//!
//! A task is a self-contained record: it owns its subtasks, tags, comments
//! and attachments and knows how to mutate them. It does NOT know which
//! column holds it beyond the denormalized `column_id`; board membership is
//! the authority and the coordinator keeps the two in step.
//!
//! Every mutating method refreshes `updated_at`.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ids::generate_id;
use super::status::{Priority, TaskStatus};
use crate::error::Result;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

fn default_title() -> String {
    "Untitled Task".to_string()
}

// ============================================================================
// Owned records
// ============================================================================

/// Checklist item inside a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Free-text note attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Link or file reference attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub title: String,
    pub added_at: DateTime<Utc>,
}

// ============================================================================
// New Task input
// ============================================================================

/// Caller-supplied fields for a task about to be created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

// ============================================================================
// Task
// ============================================================================

/// A unit of work living in exactly one column of one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub board_id: String,
    #[serde(default)]
    pub column_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub estimated_time: f64,
    #[serde(default)]
    pub actual_time: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    /// IDs of tasks this one waits on
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub ai_generated: bool,
    /// Opaque, never interpreted
    #[serde(default)]
    pub ai_suggestions: Vec<serde_json::Value>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task assigned to `column_id` of `board_id`.
    ///
    /// An empty title becomes `"Untitled Task"`. Duplicate tags are dropped,
    /// keeping first occurrences.
    #[must_use]
    pub fn new(board_id: &str, column_id: &str, input: NewTask) -> Self {
        let now = Utc::now();
        let title = if input.title.trim().is_empty() {
            default_title()
        } else {
            input.title
        };

        let mut task = Self {
            id: generate_id("task"),
            board_id: board_id.to_string(),
            column_id: column_id.to_string(),
            title,
            description: input.description,
            priority: input.priority,
            status: TaskStatus::Todo,
            due_date: input.due_date,
            estimated_time: 0.0,
            actual_time: 0.0,
            tags: Vec::new(),
            subtasks: Vec::new(),
            dependencies: Vec::new(),
            attachments: Vec::new(),
            ai_generated: false,
            ai_suggestions: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        task.tags = dedup_tags(input.tags);
        task
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ------------------------------------------------------------------------
    // Subtasks
    // ------------------------------------------------------------------------

    /// Append an incomplete subtask and return it.
    pub fn add_subtask(&mut self, title: impl Into<String>) -> &Subtask {
        self.subtasks.push(Subtask {
            id: generate_id("subtask"),
            title: title.into(),
            completed: false,
        });
        self.touch();
        &self.subtasks[self.subtasks.len() - 1]
    }

    /// Flip a subtask's completion. Returns `false` if no such subtask.
    pub fn toggle_subtask(&mut self, subtask_id: &str) -> bool {
        let Some(subtask) = self.subtasks.iter_mut().find(|s| s.id == subtask_id) else {
            return false;
        };
        subtask.completed = !subtask.completed;
        self.touch();
        true
    }

    /// Remove a subtask. Returns whether one was removed.
    pub fn delete_subtask(&mut self, subtask_id: &str) -> bool {
        let before = self.subtasks.len();
        self.subtasks.retain(|s| s.id != subtask_id);
        self.touch();
        self.subtasks.len() != before
    }

    /// Percentage of completed subtasks, rounded; 0 without subtasks.
    #[must_use]
    pub fn subtask_progress(&self) -> u32 {
        if self.subtasks.is_empty() {
            return 0;
        }
        let completed = self.subtasks.iter().filter(|s| s.completed).count();
        (completed as f64 / self.subtasks.len() as f64 * 100.0).round() as u32
    }

    // ------------------------------------------------------------------------
    // Tags
    // ------------------------------------------------------------------------

    /// Add a tag unless already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
            self.touch();
        }
    }

    /// Remove a tag if present.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Attachments & comments
    // ------------------------------------------------------------------------

    /// Attach a link. The title falls back to the URL.
    pub fn add_attachment(
        &mut self,
        kind: impl Into<String>,
        url: impl Into<String>,
        title: Option<String>,
    ) -> &Attachment {
        let url = url.into();
        let title = title.filter(|t| !t.is_empty()).unwrap_or_else(|| url.clone());
        self.attachments.push(Attachment {
            id: generate_id("attach"),
            kind: kind.into(),
            url,
            title,
            added_at: Utc::now(),
        });
        self.touch();
        &self.attachments[self.attachments.len() - 1]
    }

    /// Remove an attachment by ID. Returns whether one was removed.
    pub fn remove_attachment(&mut self, attachment_id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != attachment_id);
        self.touch();
        self.attachments.len() != before
    }

    /// Append a comment and return it.
    pub fn add_comment(&mut self, text: impl Into<String>) -> &Comment {
        self.comments.push(Comment {
            id: generate_id("comment"),
            text: text.into(),
            created_at: Utc::now(),
        });
        self.touch();
        &self.comments[self.comments.len() - 1]
    }

    /// Delete a comment by ID. Returns whether one was removed.
    pub fn delete_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        self.touch();
        self.comments.len() != before
    }

    /// Store an opaque suggestion payload.
    pub fn add_ai_suggestion(&mut self, suggestion: serde_json::Value) {
        self.ai_suggestions.push(suggestion);
        self.touch();
    }

    pub fn clear_ai_suggestions(&mut self) {
        self.ai_suggestions.clear();
        self.touch();
    }

    // ------------------------------------------------------------------------
    // Completion & priority
    // ------------------------------------------------------------------------

    /// The only way `completed_at` gets set.
    pub fn mark_complete(&mut self) {
        let now = Utc::now();
        self.status = TaskStatus::Done;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_incomplete(&mut self) {
        self.status = TaskStatus::Todo;
        self.completed_at = None;
        self.touch();
    }

    /// Set priority from its string form.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `value` is `Low`, `Medium` or `High`.
    pub fn set_priority(&mut self, value: &str) -> Result<()> {
        self.priority = value.parse()?;
        self.touch();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Due date
    // ------------------------------------------------------------------------

    /// Due date as an instant (midnight UTC).
    #[must_use]
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        let naive = self.due_date?.and_hms_opt(0, 0, 0)?;
        Some(Utc.from_utc_datetime(&naive))
    }

    #[must_use]
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    /// Due instant is before `now` and the task is not done.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        if self.status == TaskStatus::Done {
            return false;
        }
        self.due_instant().is_some_and(|due| due < now)
    }

    #[must_use]
    pub fn days_until_due(&self) -> Option<i64> {
        self.days_until_due_at(Utc::now())
    }

    /// Whole days until due, rounded up. Negative once past due.
    #[must_use]
    pub fn days_until_due_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let due = self.due_instant()?;
        let millis = (due - now).num_milliseconds() as f64;
        Some((millis / MILLIS_PER_DAY).ceil() as i64)
    }
}

/// Drop duplicate tags, keeping the first occurrence of each.
pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
