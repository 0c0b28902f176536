//! Configuration for the kanban core.
//!
//! Limits, storage key namespace and the default column layout live here.
//! A project may override any of them with a `kanban.json` file; missing
//! fields fall back to the built-in defaults.

use crate::error::{KanbanError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted data format version, written once on first run.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Default storage key namespace.
pub const DEFAULT_STORAGE_PREFIX: &str = "kanban";

/// Color given to columns created without an explicit color.
pub const DEFAULT_COLUMN_COLOR: &str = "#6b7280";

/// Color given to boards created without an explicit color.
pub const DEFAULT_BOARD_COLOR: &str = "#3b82f6";

/// Name of the optional configuration file inside a project directory.
pub const CONFIG_FILE: &str = "kanban.json";

/// Title and color of a column created alongside a new board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTemplate {
    pub title: String,
    #[serde(default = "default_column_color")]
    pub color: String,
}

impl ColumnTemplate {
    /// Create a column template.
    pub fn new(title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: color.into(),
        }
    }
}

fn default_column_color() -> String {
    DEFAULT_COLUMN_COLOR.to_string()
}

/// Columns every new board starts with.
pub fn default_columns() -> Vec<ColumnTemplate> {
    vec![
        ColumnTemplate::new("To Do", "#6b7280"),
        ColumnTemplate::new("In Progress", "#3b82f6"),
        ColumnTemplate::new("Review", "#f59e0b"),
        ColumnTemplate::new("Done", "#10b981"),
    ]
}

/// Hard limits enforced by the board entity and the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    #[serde(default = "default_max_boards")]
    pub max_boards: usize,
    #[serde(default = "default_max_columns")]
    pub max_columns_per_board: usize,
    #[serde(default = "default_max_tasks")]
    pub max_tasks_per_board: usize,
}

fn default_max_boards() -> usize {
    50
}

fn default_max_columns() -> usize {
    10
}

fn default_max_tasks() -> usize {
    500
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_boards: default_max_boards(),
            max_columns_per_board: default_max_columns(),
            max_tasks_per_board: default_max_tasks(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanbanConfig {
    /// Prefix for every storage key (`<prefix>_boards`, ...)
    #[serde(default = "default_prefix")]
    pub storage_prefix: String,
    /// Format version written to the version marker
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default = "default_columns")]
    pub default_columns: Vec<ColumnTemplate>,
}

fn default_prefix() -> String {
    DEFAULT_STORAGE_PREFIX.to_string()
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            storage_prefix: default_prefix(),
            version: default_version(),
            limits: Limits::default(),
            default_columns: default_columns(),
        }
    }
}

impl KanbanConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from `<project_dir>/kanban.json`.
    ///
    /// Returns the defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Config`] when the file exists but cannot be
    /// read or parsed.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = Self::config_path(project_dir);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            KanbanError::config_with_path(format!("Failed to read config: {}", e), path.clone())
        })?;

        let config: KanbanConfig = serde_json::from_str(&content).map_err(|e| {
            KanbanError::config_with_path(format!("Failed to parse config: {}", e), path.clone())
        })?;

        config.validate().map_err(|e| match e {
            KanbanError::Config { message, .. } => KanbanError::config_with_path(message, path),
            other => other,
        })?;

        Ok(config)
    }

    /// Get the config file path for a project.
    pub fn config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    /// Check the configuration for values the core cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.storage_prefix.trim().is_empty() {
            return Err(KanbanError::config("storagePrefix must not be empty"));
        }
        if self.limits.max_boards == 0 {
            return Err(KanbanError::config("limits.maxBoards must be at least 1"));
        }
        if self.default_columns.len() > self.limits.max_columns_per_board {
            return Err(KanbanError::config(format!(
                "{} default columns exceed limits.maxColumnsPerBoard ({})",
                self.default_columns.len(),
                self.limits.max_columns_per_board
            )));
        }
        Ok(())
    }

    /// Set the storage key prefix.
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Set the maximum number of boards.
    #[must_use]
    pub fn with_max_boards(mut self, max: usize) -> Self {
        self.limits.max_boards = max;
        self
    }

    /// Set the maximum number of columns per board.
    #[must_use]
    pub fn with_max_columns(mut self, max: usize) -> Self {
        self.limits.max_columns_per_board = max;
        self
    }

    /// Set the maximum number of tasks per board.
    #[must_use]
    pub fn with_max_tasks(mut self, max: usize) -> Self {
        self.limits.max_tasks_per_board = max;
        self
    }

    /// Replace the default column layout.
    #[must_use]
    pub fn with_default_columns(mut self, columns: Vec<ColumnTemplate>) -> Self {
        self.default_columns = columns;
        self
    }
}
