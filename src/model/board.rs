//! Board entity.
//!
//! A board owns an ordered list of columns and each column owns an ordered
//! list of task IDs. Task content lives elsewhere; this module only does
//! column lifecycle and membership bookkeeping.
//!
//! # Invariants
//!
//! - column IDs are unique within a board
//! - a task ID appears in at most one column
//! - column and task order are preserved across every mutation
//!
//! ```text
//! Board
//!   └── columns: Vec<Column>
//!         ├── Column { id, title, color, task_ids: [t1, t2] }
//!         └── Column { id, title, color, task_ids: [t3] }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::generate_id;
use super::status::TaskStatus;
use crate::config::{default_columns, ColumnTemplate, DEFAULT_BOARD_COLOR, DEFAULT_COLUMN_COLOR};
use crate::error::{KanbanError, Result};

fn default_title() -> String {
    "Untitled Board".to_string()
}

fn default_board_color() -> String {
    DEFAULT_BOARD_COLOR.to_string()
}

fn default_board_columns() -> Vec<Column> {
    default_columns().iter().map(Column::from_template).collect()
}

fn default_column_color() -> String {
    DEFAULT_COLUMN_COLOR.to_string()
}

// ============================================================================
// Column
// ============================================================================

/// Named, ordered bucket of task references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_column_color")]
    pub color: String,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

impl Column {
    /// Create an empty column with a fresh ID.
    #[must_use]
    pub fn new(title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: generate_id("col"),
            title: title.into(),
            color: color.into(),
            task_ids: Vec::new(),
        }
    }

    fn from_template(template: &ColumnTemplate) -> Self {
        Self::new(template.title.clone(), template.color.clone())
    }

    /// Status a task placed in this column takes on.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_column_title(&self.title)
    }

    #[must_use]
    pub fn contains(&self, task_id: &str) -> bool {
        self.task_ids.iter().any(|id| id == task_id)
    }

    fn remove(&mut self, task_id: &str) -> bool {
        let before = self.task_ids.len();
        self.task_ids.retain(|id| id != task_id);
        self.task_ids.len() != before
    }
}

/// Editable column fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPatch {
    pub title: Option<String>,
    pub color: Option<String>,
}

impl ColumnPatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

// ============================================================================
// Board Templates
// ============================================================================

/// Predefined board presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardTemplate {
    Personal,
    Work,
    Learning,
    SideProject,
}

impl BoardTemplate {
    pub const ALL: [BoardTemplate; 4] = [
        BoardTemplate::Personal,
        BoardTemplate::Work,
        BoardTemplate::Learning,
        BoardTemplate::SideProject,
    ];

    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            BoardTemplate::Personal => "PERSONAL",
            BoardTemplate::Work => "WORK",
            BoardTemplate::Learning => "LEARNING",
            BoardTemplate::SideProject => "SIDE_PROJECT",
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            BoardTemplate::Personal => "Personal Projects",
            BoardTemplate::Work => "Work Tasks",
            BoardTemplate::Learning => "Learning Goals",
            BoardTemplate::SideProject => "Side Project",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            BoardTemplate::Personal => "Track your personal tasks and side projects",
            BoardTemplate::Work => "Manage your professional workload",
            BoardTemplate::Learning => "Track courses, tutorials, and skills",
            BoardTemplate::SideProject => "Build something awesome",
        }
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            BoardTemplate::Personal => "#3b82f6",
            BoardTemplate::Work => "#10b981",
            BoardTemplate::Learning => "#f59e0b",
            BoardTemplate::SideProject => "#ef4444",
        }
    }
}

impl fmt::Display for BoardTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BoardTemplate {
    type Err = KanbanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BoardTemplate::ALL
            .into_iter()
            .find(|t| t.key() == s)
            .ok_or_else(|| KanbanError::validation("template", format!("Template {} not found", s)))
    }
}

// ============================================================================
// Board
// ============================================================================

/// Top-level container of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_board_color")]
    pub color: String,
    #[serde(default = "default_board_columns")]
    pub columns: Vec<Column>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Board {
    /// Create a board with the stock four columns.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_columns(title, &default_columns())
    }

    /// Create a board whose columns follow `templates`, each with a fresh ID.
    #[must_use]
    pub fn with_columns(title: impl Into<String>, templates: &[ColumnTemplate]) -> Self {
        let now = Utc::now();
        let title = title.into();
        Self {
            id: generate_id("board"),
            title: if title.trim().is_empty() {
                default_title()
            } else {
                title
            },
            description: String::new(),
            color: default_board_color(),
            columns: templates.iter().map(Column::from_template).collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a board from a preset.
    #[must_use]
    pub fn from_template(template: BoardTemplate, columns: &[ColumnTemplate]) -> Self {
        Self::with_columns(template.name(), columns)
            .with_description(template.description())
            .with_color(template.color())
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Copy title, description, color and column shape under fresh IDs.
    ///
    /// Task membership is not copied: the copy starts with empty columns.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id("board"),
            title: format!("{} (Copy)", self.title),
            description: self.description.clone(),
            color: self.color.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.title.clone(), c.color.clone()))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // ------------------------------------------------------------------------
    // Column lifecycle
    // ------------------------------------------------------------------------

    /// Append an empty column.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the board already has `max_columns`.
    pub fn add_column(
        &mut self,
        title: impl Into<String>,
        color: Option<&str>,
        max_columns: usize,
    ) -> Result<&Column> {
        if self.columns.len() >= max_columns {
            return Err(KanbanError::validation(
                "columns",
                format!("Maximum {} columns allowed", max_columns),
            ));
        }
        self.columns.push(Column::new(
            title,
            color.unwrap_or(DEFAULT_COLUMN_COLOR),
        ));
        self.touch();
        Ok(&self.columns[self.columns.len() - 1])
    }

    /// Edit a column's title or color. `false` if no such column.
    pub fn update_column(&mut self, column_id: &str, patch: &ColumnPatch) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        if let Some(title) = &patch.title {
            column.title = title.clone();
        }
        if let Some(color) = &patch.color {
            column.color = color.clone();
        }
        self.touch();
        true
    }

    /// Remove a column, handing back the task IDs it held.
    ///
    /// Returns `None` if there is no such column.
    pub fn delete_column(&mut self, column_id: &str) -> Option<Vec<String>> {
        let index = self.columns.iter().position(|c| c.id == column_id)?;
        let column = self.columns.remove(index);
        self.touch();
        Some(column.task_ids)
    }

    #[must_use]
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    fn column_mut(&mut self, column_id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == column_id)
    }

    /// Status implied by a column's title, `None` if no such column.
    #[must_use]
    pub fn status_for_column(&self, column_id: &str) -> Option<TaskStatus> {
        self.column(column_id).map(Column::status)
    }

    // ------------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------------

    /// The column currently holding `task_id`.
    #[must_use]
    pub fn column_of(&self, task_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.contains(task_id))
    }

    /// Append a task ID to a column. No-op if already there.
    ///
    /// Returns `false` only if the column does not exist.
    pub fn add_task_to_column(&mut self, column_id: &str, task_id: &str) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        if !column.contains(task_id) {
            column.task_ids.push(task_id.to_string());
            self.touch();
        }
        true
    }

    /// Remove a task ID from a column. Absent IDs are tolerated.
    ///
    /// Returns `false` only if the column does not exist.
    pub fn remove_task_from_column(&mut self, column_id: &str, task_id: &str) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        column.remove(task_id);
        self.touch();
        true
    }

    /// Relocate a task into `to_column_id`, at `index` (clamped) or appended.
    ///
    /// The ID is removed from `from_column_id` and from any other column
    /// that still lists it. The destination is checked first, so when it
    /// does not exist the board is left unchanged and `false` is returned.
    pub fn move_task(
        &mut self,
        task_id: &str,
        from_column_id: &str,
        to_column_id: &str,
        index: Option<usize>,
    ) -> bool {
        if self.column(to_column_id).is_none() {
            return false;
        }

        if let Some(source) = self.column_mut(from_column_id) {
            source.remove(task_id);
        }
        for column in &mut self.columns {
            column.remove(task_id);
        }

        let Some(dest) = self.column_mut(to_column_id) else {
            return false;
        };
        let at = index.map_or(dest.task_ids.len(), |i| i.min(dest.task_ids.len()));
        dest.task_ids.insert(at, task_id.to_string());
        self.touch();
        true
    }

    /// Move a task to `new_index` (clamped) within its column.
    ///
    /// Returns `false` if the column does not exist or does not hold the task.
    pub fn reorder_task(&mut self, column_id: &str, task_id: &str, new_index: usize) -> bool {
        let Some(column) = self.column_mut(column_id) else {
            return false;
        };
        let Some(old_index) = column.task_ids.iter().position(|id| id == task_id) else {
            return false;
        };
        let id = column.task_ids.remove(old_index);
        let at = new_index.min(column.task_ids.len());
        column.task_ids.insert(at, id);
        self.touch();
        true
    }

    /// Number of task references across all columns.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.task_ids.len()).sum()
    }

    /// Every referenced task ID, in column then position order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .flat_map(|c| c.task_ids.iter().map(String::as_str))
    }
}
