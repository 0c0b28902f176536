//! Kanban - board, column and task core with key-value persistence
//!
//! Boards hold ordered columns, columns hold ordered task IDs, and tasks
//! carry the work itself. Everything is persisted as JSON collections in a
//! string key-value store.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`config`] - Limits, storage namespace and default column layout
//! - [`coordinator`] - Cross-entity operations, repair, statistics, search
//! - [`error`] - Custom error types and handling
//! - [`gateway`] - Typed persistence over a key-value store, export/import
//! - [`model`] - Board, column and task entities with typed patches
//! - [`settings`] - Persisted user preferences
//! - [`storage`] - Key-value store contract with memory and file backends
//! - [`testing`] - Testing infrastructure (failing store, assertions)
//!
//! # Example
//!
//! ```rust
//! use kanban::{BoardCoordinator, KanbanConfig, MemoryStore, NewTask, TaskStatus};
//!
//! let config = KanbanConfig::default();
//! let mut kanban = BoardCoordinator::open(MemoryStore::new(), &config)?;
//!
//! let board = kanban.create_board("Launch", "Ship the beta")?;
//! let todo = &board.columns[0];
//! let done = &board.columns[3];
//!
//! let task = kanban.create_task(&board.id, &todo.id, NewTask::new("Write changelog"))?;
//! let task = kanban.move_task(&task.id, &done.id, None)?;
//! assert_eq!(task.status, TaskStatus::Done);
//!
//! let stats = kanban.statistics(&board.id)?;
//! assert_eq!(stats.progress, 100);
//! # Ok::<(), kanban::KanbanError>(())
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod model;
pub mod settings;
pub mod storage;
pub mod testing;

// Re-export commonly used types
pub use error::{IntoKanbanError, KanbanError, Result};

pub use config::{ColumnTemplate, KanbanConfig, Limits};

pub use coordinator::{BoardCoordinator, BoardStatistics, RepairReport, TaskFilter, TaskQuery};

pub use gateway::{ExportDocument, PersistenceGateway, StorageInfo};

pub use model::{
    Board, BoardPatch, BoardTemplate, Column, ColumnPatch, NewTask, Priority, Task, TaskPatch,
    TaskStatus,
};

pub use settings::{Settings, SettingsPatch};

pub use storage::{FileStore, KeyValueStore, MemoryStore};
