//! Cross-entity operations on boards and tasks.
//!
//! A task's column is recorded twice: as its ID in a column's `taskIds` and
//! as the task's own `columnId`/`status`. The coordinator keeps the two in
//! step, always writing the board first. If a run stops between the two
//! writes, board membership is the fact and [`BoardCoordinator::repair`]
//! brings the tasks back in line.
//!
//! ```text
//! move_task(t, dest)
//!   1. status = status_for_column(dest)
//!   2. board.move_task(..)  -> put_board     (membership durable)
//!   3. update_task(columnId, status)         (denormalized copy)
//! ```

mod query;
mod repair;

pub use query::{BoardStatistics, TaskFilter, TaskQuery};
pub use repair::RepairReport;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::config::{ColumnTemplate, KanbanConfig, Limits};
use crate::error::{KanbanError, Result};
use crate::gateway::PersistenceGateway;
use crate::model::{
    Board, BoardPatch, BoardTemplate, Column, ColumnPatch, NewTask, Task, TaskPatch,
};
use crate::storage::KeyValueStore;

/// Sequences entity mutations with persistence.
#[derive(Debug)]
pub struct BoardCoordinator<S: KeyValueStore> {
    gateway: PersistenceGateway<S>,
    limits: Limits,
    default_columns: Vec<ColumnTemplate>,
}

impl<S: KeyValueStore> BoardCoordinator<S> {
    pub fn new(gateway: PersistenceGateway<S>, config: &KanbanConfig) -> Self {
        Self {
            gateway,
            limits: config.limits,
            default_columns: config.default_columns.clone(),
        }
    }

    /// Open a gateway over `store` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if first-run initialization fails.
    pub fn open(store: S, config: &KanbanConfig) -> Result<Self> {
        Ok(Self::new(PersistenceGateway::open(store, config)?, config))
    }

    /// Returns the persistence gateway.
    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    /// Returns the persistence gateway mutably. Writes made through it
    /// bypass the cross-entity bookkeeping done here.
    pub fn gateway_mut(&mut self) -> &mut PersistenceGateway<S> {
        &mut self.gateway
    }

    /// Consume the coordinator and return its gateway.
    pub fn into_gateway(self) -> PersistenceGateway<S> {
        self.gateway
    }

    /// Returns the limits enforced on creation.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    // ========================================================================
    // Boards
    // ========================================================================

    /// All stored boards.
    pub fn boards(&self) -> Vec<Board> {
        self.gateway.list_boards()
    }

    /// Load a board by ID.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such board.
    pub fn board(&self, board_id: &str) -> Result<Board> {
        self.gateway
            .get_board(board_id)
            .ok_or_else(|| KanbanError::not_found("Board", board_id))
    }

    /// Create a board with the configured default columns.
    ///
    /// # Errors
    ///
    /// Returns a validation error once the board limit is reached, or a
    /// storage error if the board cannot be written.
    pub fn create_board(&mut self, title: &str, description: &str) -> Result<Board> {
        let board = Board::with_columns(title, &self.default_columns).with_description(description);
        self.insert_board(board)
    }

    /// Create a board from a preset.
    ///
    /// # Errors
    ///
    /// Same as [`BoardCoordinator::create_board`].
    pub fn create_board_from_template(&mut self, template: BoardTemplate) -> Result<Board> {
        let board = Board::from_template(template, &self.default_columns);
        self.insert_board(board)
    }

    fn insert_board(&mut self, board: Board) -> Result<Board> {
        let count = self.gateway.list_boards().len();
        if count >= self.limits.max_boards {
            return Err(KanbanError::validation(
                "boards",
                format!("Maximum {} boards allowed", self.limits.max_boards),
            ));
        }
        self.gateway.put_board(&board)?;
        info!(board_id = %board.id, title = %board.title, "created board");
        Ok(board)
    }

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such board.
    pub fn update_board(&mut self, board_id: &str, patch: &BoardPatch) -> Result<Board> {
        if !self.gateway.update_board(board_id, patch)? {
            return Err(KanbanError::not_found("Board", board_id));
        }
        self.board(board_id)
    }

    /// Delete a board and every task it owns.
    ///
    /// Owned tasks are those listed in its columns plus any task whose
    /// `boardId` still points at it.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::LastBoard`] when it is the only board left.
    pub fn delete_board(&mut self, board_id: &str) -> Result<()> {
        let boards = self.gateway.list_boards();
        let Some(board) = boards.iter().find(|b| b.id == board_id) else {
            return Err(KanbanError::not_found("Board", board_id));
        };
        if boards.len() <= 1 {
            return Err(KanbanError::LastBoard);
        }

        let mut doomed: HashSet<String> = board.task_ids().map(str::to_string).collect();
        doomed.extend(self.gateway.tasks_by_board(board_id).into_iter().map(|t| t.id));
        let doomed: Vec<String> = doomed.into_iter().collect();

        let removed = self.gateway.delete_tasks(&doomed)?;
        self.gateway.delete_board(board_id)?;
        info!(board_id, tasks = removed, "deleted board");
        Ok(())
    }

    /// Copy a board's metadata and column layout. Tasks are not copied.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown board, or a validation
    /// error once the board limit is reached.
    pub fn duplicate_board(&mut self, board_id: &str) -> Result<Board> {
        let copy = self.board(board_id)?.duplicate();
        self.insert_board(copy)
    }

    // ========================================================================
    // Columns
    // ========================================================================

    /// # Errors
    ///
    /// Returns a validation error once the column limit is reached.
    pub fn add_column(
        &mut self,
        board_id: &str,
        title: &str,
        color: Option<&str>,
    ) -> Result<Column> {
        let mut board = self.board(board_id)?;
        let column = board
            .add_column(title, color, self.limits.max_columns_per_board)?
            .clone();
        self.gateway.put_board(&board)?;
        debug!(board_id, column_id = %column.id, "added column");
        Ok(column)
    }

    /// Edit a column. A title change re-derives the status of its tasks.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown board or column.
    pub fn update_column(
        &mut self,
        board_id: &str,
        column_id: &str,
        patch: &ColumnPatch,
    ) -> Result<Column> {
        let mut board = self.board(board_id)?;
        if !board.update_column(column_id, patch) {
            return Err(KanbanError::not_found("Column", column_id));
        }
        self.gateway.put_board(&board)?;

        let column = board
            .column(column_id)
            .cloned()
            .ok_or_else(|| KanbanError::not_found("Column", column_id))?;

        if patch.title.is_some() {
            let status = column.status();
            let restated: Vec<Task> = self
                .resolve(&column.task_ids)
                .into_iter()
                .filter(|t| t.status != status)
                .map(|mut t| {
                    t.status = status;
                    t.touch();
                    t
                })
                .collect();
            self.gateway.put_tasks(&restated)?;
        }
        Ok(column)
    }

    /// Remove a column and delete the tasks it held. Returns how many tasks
    /// were deleted.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown board or column.
    pub fn delete_column(&mut self, board_id: &str, column_id: &str) -> Result<usize> {
        let mut board = self.board(board_id)?;
        let Some(task_ids) = board.delete_column(column_id) else {
            return Err(KanbanError::not_found("Column", column_id));
        };
        self.gateway.put_board(&board)?;
        let removed = self.gateway.delete_tasks(&task_ids)?;
        info!(board_id, column_id, tasks = removed, "deleted column");
        Ok(removed)
    }

    /// Tasks of a column in column order. IDs with no stored task are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown board or column.
    pub fn column_tasks(&self, board_id: &str, column_id: &str) -> Result<Vec<Task>> {
        let board = self.board(board_id)?;
        let column = board
            .column(column_id)
            .ok_or_else(|| KanbanError::not_found("Column", column_id))?;
        Ok(self.resolve(&column.task_ids))
    }

    /// Every task on a board, column by column.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such board.
    pub fn board_tasks(&self, board_id: &str) -> Result<Vec<Task>> {
        let board = self.board(board_id)?;
        let ids: Vec<&str> = board.task_ids().collect();
        Ok(self.resolve(&ids))
    }

    fn resolve<T: AsRef<str>>(&self, ids: &[T]) -> Vec<Task> {
        let mut by_id: HashMap<String, Task> = self
            .gateway
            .list_tasks()
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        ids.iter()
            .filter_map(|id| by_id.remove(id.as_ref()))
            .collect()
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such task.
    pub fn task(&self, task_id: &str) -> Result<Task> {
        self.gateway
            .get_task(task_id)
            .ok_or_else(|| KanbanError::not_found("Task", task_id))
    }

    /// Create a task at the end of a column.
    ///
    /// The task is written before the board. If the board write fails the
    /// task is left orphaned until [`BoardCoordinator::repair`] adopts it.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown board or column, a
    /// validation error once the board's task limit is reached, or a storage
    /// error from either write.
    pub fn create_task(&mut self, board_id: &str, column_id: &str, input: NewTask) -> Result<Task> {
        let mut board = self.board(board_id)?;
        let status = board
            .status_for_column(column_id)
            .ok_or_else(|| KanbanError::not_found("Column", column_id))?;
        if board.task_count() >= self.limits.max_tasks_per_board {
            return Err(KanbanError::validation(
                "tasks",
                format!(
                    "Maximum {} tasks per board allowed",
                    self.limits.max_tasks_per_board
                ),
            ));
        }

        let mut task = Task::new(board_id, column_id, input);
        task.status = status;
        self.gateway.put_task(&task)?;

        board.add_task_to_column(column_id, &task.id);
        self.gateway.put_board(&board)?;

        debug!(board_id, column_id, task_id = %task.id, "created task");
        Ok(task)
    }

    /// Edit task content.
    ///
    /// A `column_id` in the patch is carried out as a move to that column.
    /// `status` is always derived from the column and is ignored here.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such task.
    pub fn update_task(&mut self, task_id: &str, patch: &TaskPatch) -> Result<Task> {
        if let Some(column_id) = &patch.column_id {
            self.move_task(task_id, column_id, None)?;
        }

        let content = TaskPatch {
            column_id: None,
            status: None,
            ..patch.clone()
        };
        if !self.gateway.update_task(task_id, &content)? {
            return Err(KanbanError::not_found("Task", task_id));
        }
        self.task(task_id)
    }

    /// Store a task changed through its own methods (subtasks, comments,
    /// attachments). Only tasks that already exist can be saved.
    ///
    /// Placement and identity come from the stored record: `boardId`,
    /// `columnId`, `status` and `createdAt` are never taken from `task`.
    /// Use [`move_task`](Self::move_task) to change columns.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if the task was never stored.
    pub fn save_task(&mut self, task: &Task) -> Result<()> {
        let stored = self
            .gateway
            .get_task(&task.id)
            .ok_or_else(|| KanbanError::not_found("Task", &task.id))?;

        let mut merged = task.clone();
        merged.board_id = stored.board_id;
        merged.column_id = stored.column_id;
        merged.status = stored.status;
        merged.created_at = stored.created_at;
        self.gateway.put_task(&merged)
    }

    /// Move a task into another column, at `index` (clamped) or appended.
    ///
    /// Moving a task to the column it is already in changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown task, board or
    /// destination column, or a storage error from either write.
    pub fn move_task(
        &mut self,
        task_id: &str,
        to_column_id: &str,
        index: Option<usize>,
    ) -> Result<Task> {
        let task = self.task(task_id)?;
        let mut board = self.board(&task.board_id)?;
        let status = board
            .status_for_column(to_column_id)
            .ok_or_else(|| KanbanError::not_found("Column", to_column_id))?;

        let from_column_id = board
            .column_of(task_id)
            .map_or_else(|| task.column_id.clone(), |c| c.id.clone());
        if from_column_id == to_column_id && board.column_of(task_id).is_some() {
            return Ok(task);
        }

        board.move_task(task_id, &from_column_id, to_column_id, index);
        self.gateway.put_board(&board)?;

        self.gateway
            .update_task(task_id, &TaskPatch::placement(to_column_id, status))?;
        debug!(
            task_id,
            from = %from_column_id,
            to = to_column_id,
            status = %status,
            "moved task"
        );
        self.task(task_id)
    }

    /// Reposition a task within its current column.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] for an unknown task or board, or if
    /// no column of the board lists the task.
    pub fn reorder_task(&mut self, task_id: &str, new_index: usize) -> Result<()> {
        let task = self.task(task_id)?;
        let mut board = self.board(&task.board_id)?;
        let column_id = board
            .column_of(task_id)
            .map(|c| c.id.clone())
            .ok_or_else(|| KanbanError::not_found("Task", task_id))?;

        board.reorder_task(&column_id, task_id, new_index);
        self.gateway.put_board(&board)
    }

    /// Remove a task from its board, then delete the record.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::NotFound`] if there is no such task.
    pub fn delete_task(&mut self, task_id: &str) -> Result<()> {
        let task = self.task(task_id)?;

        if let Ok(mut board) = self.board(&task.board_id) {
            let holders: Vec<String> = board
                .columns
                .iter()
                .filter(|c| c.contains(task_id))
                .map(|c| c.id.clone())
                .collect();
            if !holders.is_empty() {
                for column_id in &holders {
                    board.remove_task_from_column(column_id, task_id);
                }
                self.gateway.put_board(&board)?;
            }
        }

        self.gateway.delete_task(task_id)?;
        debug!(task_id, board_id = %task.board_id, "deleted task");
        Ok(())
    }
}
