//! Reconciling task back-references with board membership.
//!
//! Membership wins. For one board the pass:
//!
//! 1. drops column entries naming no stored task, and repeated entries
//!    after the first
//! 2. appends orphaned tasks of the board (listed in no column) to the
//!    column their `columnId` names, when that column exists
//! 3. rewrites `columnId` and `status` of every listed task that disagrees
//!    with the column holding it

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{info, warn};

use super::BoardCoordinator;
use crate::error::Result;
use crate::model::Task;
use crate::storage::KeyValueStore;

/// What a repair pass changed on one board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub board_id: String,
    /// Column entries with no stored task behind them.
    pub dangling_removed: Vec<String>,
    /// Task IDs listed more than once; later entries were dropped.
    pub duplicates_removed: Vec<String>,
    /// Orphaned tasks put back into the column they name.
    pub orphans_adopted: Vec<String>,
    /// Orphaned tasks whose column no longer exists. Left untouched.
    pub orphans_unplaced: Vec<String>,
    /// Tasks whose `columnId` or `status` was rewritten.
    pub tasks_rewritten: Vec<String>,
}

impl RepairReport {
    /// `true` when the board and its tasks already agreed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dangling_removed.is_empty()
            && self.duplicates_removed.is_empty()
            && self.orphans_adopted.is_empty()
            && self.tasks_rewritten.is_empty()
    }
}

impl<S: KeyValueStore> BoardCoordinator<S> {
    /// Reconcile one board with the stored tasks.
    ///
    /// The board is written before the tasks, and nothing is written when the
    /// two already agree.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KanbanError::NotFound`] for an unknown board, or a
    /// storage error from either write.
    pub fn repair(&mut self, board_id: &str) -> Result<RepairReport> {
        let mut board = self.board(board_id)?;
        let mut tasks: HashMap<String, Task> = self
            .gateway
            .list_tasks()
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut report = RepairReport {
            board_id: board_id.to_string(),
            ..Default::default()
        };

        // 1. membership cleanup
        let mut seen: HashSet<String> = HashSet::new();
        for column in &mut board.columns {
            column.task_ids.retain(|id| {
                if !tasks.contains_key(id) {
                    report.dangling_removed.push(id.clone());
                    false
                } else if !seen.insert(id.clone()) {
                    report.duplicates_removed.push(id.clone());
                    false
                } else {
                    true
                }
            });
        }

        // 2. adopt orphans, oldest first
        let mut orphans: Vec<&Task> = tasks
            .values()
            .filter(|t| t.board_id == board_id && !seen.contains(&t.id))
            .collect();
        orphans.sort_by_key(|t| t.created_at);
        let orphans: Vec<(String, String)> = orphans
            .into_iter()
            .map(|t| (t.id.clone(), t.column_id.clone()))
            .collect();

        for (task_id, column_id) in orphans {
            if board.column(&column_id).is_some() {
                board.add_task_to_column(&column_id, &task_id);
                report.orphans_adopted.push(task_id);
            } else {
                report.orphans_unplaced.push(task_id);
            }
        }

        // 3. back-references follow membership
        let mut rewritten: Vec<Task> = Vec::new();
        for column in &board.columns {
            let status = column.status();
            for task_id in &column.task_ids {
                let Some(task) = tasks.get_mut(task_id) else {
                    continue;
                };
                if task.column_id != column.id || task.status != status {
                    task.column_id = column.id.clone();
                    task.status = status;
                    task.touch();
                    report.tasks_rewritten.push(task_id.clone());
                    rewritten.push(task.clone());
                }
            }
        }

        let membership_changed = !report.dangling_removed.is_empty()
            || !report.duplicates_removed.is_empty()
            || !report.orphans_adopted.is_empty();
        if membership_changed {
            self.gateway.put_board(&board)?;
        }
        self.gateway.put_tasks(&rewritten)?;

        if !report.orphans_unplaced.is_empty() {
            warn!(
                board_id,
                count = report.orphans_unplaced.len(),
                "orphaned tasks name a missing column"
            );
        }
        if !report.is_clean() {
            info!(
                board_id,
                dangling = report.dangling_removed.len(),
                duplicates = report.duplicates_removed.len(),
                adopted = report.orphans_adopted.len(),
                rewritten = report.tasks_rewritten.len(),
                "repaired board"
            );
        }
        Ok(report)
    }

    /// Repair every board.
    ///
    /// # Errors
    ///
    /// Stops at the first storage error.
    pub fn repair_all(&mut self) -> Result<Vec<RepairReport>> {
        let ids: Vec<String> = self.boards().into_iter().map(|b| b.id).collect();
        ids.iter().map(|id| self.repair(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KanbanConfig;
    use crate::model::{NewTask, TaskStatus};
    use crate::storage::MemoryStore;

    fn setup() -> (BoardCoordinator<MemoryStore>, String, Vec<String>) {
        let mut c = BoardCoordinator::open(MemoryStore::new(), &KanbanConfig::default()).unwrap();
        let board = c.create_board("A", "").unwrap();
        let cols = board.columns.iter().map(|c| c.id.clone()).collect();
        (c, board.id, cols)
    }

    #[test]
    fn test_clean_board_is_untouched() {
        let (mut c, board_id, cols) = setup();
        c.create_task(&board_id, &cols[0], NewTask::new("t")).unwrap();
        let before = c.gateway().store().clone();

        let report = c.repair(&board_id).unwrap();
        assert!(report.is_clean());
        assert_eq!(
            c.gateway().store().get("kanban_boards").unwrap(),
            before.get("kanban_boards").unwrap()
        );
    }

    #[test]
    fn test_drops_dangling_and_duplicate_ids() {
        let (mut c, board_id, cols) = setup();
        let task = c.create_task(&board_id, &cols[0], NewTask::new("t")).unwrap();

        let mut board = c.board(&board_id).unwrap();
        board.columns[0].task_ids.push("task-ghost".into());
        board.columns[2].task_ids.push(task.id.clone());
        c.gateway_mut().put_board(&board).unwrap();

        let report = c.repair(&board_id).unwrap();
        assert_eq!(report.dangling_removed, vec!["task-ghost"]);
        assert_eq!(report.duplicates_removed, vec![task.id.clone()]);

        let board = c.board(&board_id).unwrap();
        assert_eq!(board.columns[0].task_ids, vec![task.id]);
        assert!(board.columns[2].task_ids.is_empty());
    }

    #[test]
    fn test_rewrites_stale_back_reference() {
        let (mut c, board_id, cols) = setup();
        let task = c.create_task(&board_id, &cols[0], NewTask::new("t")).unwrap();

        let mut board = c.board(&board_id).unwrap();
        board.move_task(&task.id, &cols[0], &cols[3], None);
        c.gateway_mut().put_board(&board).unwrap();

        let report = c.repair(&board_id).unwrap();
        assert_eq!(report.tasks_rewritten, vec![task.id.clone()]);
        let healed = c.task(&task.id).unwrap();
        assert_eq!(healed.column_id, cols[3]);
        assert_eq!(healed.status, TaskStatus::Done);
    }

    #[test]
    fn test_adopts_orphans() {
        let (mut c, board_id, cols) = setup();
        let orphan = Task::new(&board_id, &cols[1], NewTask::new("lost"));
        let homeless = Task::new(&board_id, "col-deleted", NewTask::new("homeless"));
        c.gateway_mut().put_task(&orphan).unwrap();
        c.gateway_mut().put_task(&homeless).unwrap();

        let report = c.repair(&board_id).unwrap();
        assert_eq!(report.orphans_adopted, vec![orphan.id.clone()]);
        assert_eq!(report.orphans_unplaced, vec![homeless.id.clone()]);

        let board = c.board(&board_id).unwrap();
        assert_eq!(board.columns[1].task_ids, vec![orphan.id.clone()]);
        assert_eq!(c.task(&orphan.id).unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn test_repair_all() {
        let (mut c, _, _) = setup();
        c.create_board("B", "").unwrap();
        let reports = c.repair_all().unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(RepairReport::is_clean));
    }
}
