//! Custom assertions for board and task consistency.

use std::collections::HashMap;

use crate::model::{Board, Task};

/// Assert that no task ID appears more than once across the board's columns.
///
/// # Panics
///
/// Panics naming every ID listed more than once.
///
/// # Example
///
/// ```rust
/// use kanban::model::Board;
/// use kanban::testing::assert_membership_exclusive;
///
/// assert_membership_exclusive(&Board::new("Home"));
/// ```
pub fn assert_membership_exclusive(board: &Board) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in board.task_ids() {
        *counts.entry(id).or_insert(0) += 1;
    }
    let mut repeated: Vec<&str> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, _)| id)
        .collect();
    repeated.sort_unstable();
    assert!(
        repeated.is_empty(),
        "Expected each task in at most one column of board '{}', but these repeat: {:?}",
        board.title,
        repeated
    );
}

/// Assert that `column_id` is the one column listing `task_id`.
///
/// # Panics
///
/// Panics if the task is elsewhere, nowhere, or in several columns.
pub fn assert_task_in_column(board: &Board, task_id: &str, column_id: &str) {
    let holders: Vec<&str> = board
        .columns
        .iter()
        .filter(|c| c.contains(task_id))
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(
        holders,
        vec![column_id],
        "Expected task {} only in column {}",
        task_id,
        column_id
    );
}

/// Assert that every listed task exists and agrees with its column.
///
/// # Panics
///
/// Panics on a dangling ID, or on a task whose `columnId` or `status`
/// differs from the column listing it.
pub fn assert_board_consistent(board: &Board, tasks: &[Task]) {
    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    for column in &board.columns {
        for task_id in &column.task_ids {
            let task = by_id.get(task_id.as_str()).unwrap_or_else(|| {
                panic!(
                    "Column '{}' lists task {} which does not exist",
                    column.title, task_id
                )
            });
            assert_eq!(
                task.column_id, column.id,
                "Task {} is listed in column '{}' but points at {}",
                task_id, column.title, task.column_id
            );
            assert_eq!(
                task.status,
                column.status(),
                "Task {} has status {} in column '{}'",
                task_id,
                task.status,
                column.title
            );
        }
    }
}

/// Assert that no task still names `board_id`.
///
/// # Panics
///
/// Panics listing the surviving task IDs.
pub fn assert_no_tasks_for_board(tasks: &[Task], board_id: &str) {
    let survivors: Vec<&str> = tasks
        .iter()
        .filter(|t| t.board_id == board_id)
        .map(|t| t.id.as_str())
        .collect();
    assert!(
        survivors.is_empty(),
        "Expected no tasks for board {}, but found {:?}",
        board_id,
        survivors
    );
}
