//! Persistence gateway for boards, tasks and settings.
//!
//! Boards and tasks are each stored as one JSON array under a single key.
//! Every write re-serializes the whole collection, so the collection is the
//! unit of atomicity and the last writer wins.
//!
//! Reads never fail. A store error, unparseable JSON or a non-array value
//! degrades to an empty collection, and individually malformed records in an
//! otherwise valid array are skipped. Both cases log a warning. Writes do
//! fail, with [`KanbanError::Storage`], so callers can see when a
//! multi-record operation stopped halfway.

mod export;

pub use export::{format_bytes, CollectionUsage, ExportDocument, StorageInfo};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::KanbanConfig;
use crate::error::{KanbanError, Result};
use crate::model::{Board, BoardPatch, Task, TaskPatch};
use crate::settings::{Settings, SettingsPatch};
use crate::storage::{KeyValueStore, StorageKeys};

/// Typed access to the persisted kanban collections.
#[derive(Debug)]
pub struct PersistenceGateway<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
    version: String,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    /// Wrap `store` without touching it.
    pub fn new(store: S, config: &KanbanConfig) -> Self {
        Self {
            store,
            keys: StorageKeys::with_prefix(&config.storage_prefix),
            version: config.version.clone(),
        }
    }

    /// Wrap `store` and initialize it on first run.
    ///
    /// Default settings are written when none are stored, and the format
    /// version marker is written once and never overwritten afterwards.
    ///
    /// # Errors
    ///
    /// Returns a storage error if either initial write fails.
    pub fn open(store: S, config: &KanbanConfig) -> Result<Self> {
        let mut gateway = Self::new(store, config);
        gateway.initialize()?;
        Ok(gateway)
    }

    fn initialize(&mut self) -> Result<()> {
        let StorageKeys {
            boards,
            settings,
            version,
            ..
        } = self.keys.clone();

        // boards stored without columns get defaults on read; persist them
        // once so their column IDs stay stable
        if self.has_boards_without_columns(&boards) {
            let listed: Vec<Board> = self.read_collection(&boards);
            info!(key = %boards, "filling in missing board columns");
            self.write_collection(&boards, &listed)?;
        }

        if self.raw(&settings).is_none() {
            self.write_json(&settings, &Settings::default())?;
        }
        if self.raw(&version).is_none() {
            info!(version = %self.version, "initializing kanban storage");
            let marker = self.version.clone();
            self.write_json(&version, &marker)?;
        }
        Ok(())
    }

    /// Returns the storage keys this gateway reads and writes.
    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume the gateway and return its store.
    pub fn into_inner(self) -> S {
        self.store
    }

    /// Stored format version marker, if any.
    pub fn version(&self) -> Option<String> {
        let raw = self.raw(&self.keys.version)?;
        serde_json::from_str(&raw).ok()
    }

    // ========================================================================
    // Boards
    // ========================================================================

    /// All boards in stored order.
    pub fn list_boards(&self) -> Vec<Board> {
        self.read_collection(&self.keys.boards)
    }

    pub fn get_board(&self, board_id: &str) -> Option<Board> {
        self.list_boards().into_iter().find(|b| b.id == board_id)
    }

    /// Replace the board with the same ID in place, or append it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn put_board(&mut self, board: &Board) -> Result<()> {
        let mut boards = self.list_boards();
        upsert(&mut boards, board.clone(), |b| b.id == board.id);
        self.save_boards(&boards)
    }

    /// Apply `patch` to a stored board. `Ok(false)` if there is no such board.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn update_board(&mut self, board_id: &str, patch: &BoardPatch) -> Result<bool> {
        let mut boards = self.list_boards();
        let Some(board) = boards.iter_mut().find(|b| b.id == board_id) else {
            return Ok(false);
        };
        patch.apply_to(board);
        self.save_boards(&boards)?;
        Ok(true)
    }

    /// Remove a board record. Its tasks are left alone.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn delete_board(&mut self, board_id: &str) -> Result<bool> {
        let mut boards = self.list_boards();
        let before = boards.len();
        boards.retain(|b| b.id != board_id);
        if boards.len() == before {
            return Ok(false);
        }
        self.save_boards(&boards)?;
        Ok(true)
    }

    fn save_boards(&mut self, boards: &[Board]) -> Result<()> {
        let key = self.keys.boards.clone();
        self.write_collection(&key, boards)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// All tasks in stored order.
    pub fn list_tasks(&self) -> Vec<Task> {
        self.read_collection(&self.keys.tasks)
    }

    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.list_tasks().into_iter().find(|t| t.id == task_id)
    }

    /// Replace the task with the same ID in place, or append it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn put_task(&mut self, task: &Task) -> Result<()> {
        let mut tasks = self.list_tasks();
        upsert(&mut tasks, task.clone(), |t| t.id == task.id);
        self.save_tasks(&tasks)
    }

    /// Upsert several tasks in one write.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn put_tasks(&mut self, changed: &[Task]) -> Result<()> {
        if changed.is_empty() {
            return Ok(());
        }
        let mut tasks = self.list_tasks();
        for task in changed {
            upsert(&mut tasks, task.clone(), |t| t.id == task.id);
        }
        self.save_tasks(&tasks)
    }

    /// Apply `patch` to a stored task. `Ok(false)` if there is no such task.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn update_task(&mut self, task_id: &str, patch: &TaskPatch) -> Result<bool> {
        let mut tasks = self.list_tasks();
        let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else {
            return Ok(false);
        };
        patch.apply_to(task);
        self.save_tasks(&tasks)?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool> {
        Ok(self.delete_tasks(&[task_id])? > 0)
    }

    /// Remove every listed task in one write. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn delete_tasks<T: AsRef<str>>(&mut self, task_ids: &[T]) -> Result<usize> {
        self.delete_tasks_where(|t| task_ids.iter().any(|id| id.as_ref() == t.id))
    }

    /// Tasks whose `boardId` is `board_id`, in stored order.
    pub fn tasks_by_board(&self, board_id: &str) -> Vec<Task> {
        self.list_tasks()
            .into_iter()
            .filter(|t| t.board_id == board_id)
            .collect()
    }

    /// Tasks whose `columnId` is `column_id`, in stored order.
    pub fn tasks_by_column(&self, column_id: &str) -> Vec<Task> {
        self.list_tasks()
            .into_iter()
            .filter(|t| t.column_id == column_id)
            .collect()
    }

    /// Remove every task whose `boardId` is `board_id`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written.
    pub fn delete_tasks_by_board(&mut self, board_id: &str) -> Result<usize> {
        self.delete_tasks_where(|t| t.board_id == board_id)
    }

    fn delete_tasks_where<F>(&mut self, doomed: F) -> Result<usize>
    where
        F: Fn(&Task) -> bool,
    {
        let mut tasks = self.list_tasks();
        let before = tasks.len();
        tasks.retain(|t| !doomed(t));
        let removed = before - tasks.len();
        if removed > 0 {
            self.save_tasks(&tasks)?;
        }
        Ok(removed)
    }

    fn save_tasks(&mut self, tasks: &[Task]) -> Result<()> {
        let key = self.keys.tasks.clone();
        self.write_collection(&key, tasks)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Stored settings, or the defaults when absent or unreadable.
    pub fn get_settings(&self) -> Settings {
        let key = &self.keys.settings;
        let Some(raw) = self.raw(key) else {
            return Settings::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key = %key, error = %e, "settings unreadable, using defaults");
            Settings::default()
        })
    }

    /// Merge `patch` into the stored settings and return the result.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the settings cannot be written.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<Settings> {
        let mut settings = self.get_settings();
        patch.apply_to(&mut settings);
        self.save_settings(&settings)?;
        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns a storage error if the settings cannot be written.
    pub fn reset_settings(&mut self) -> Result<()> {
        self.save_settings(&Settings::default())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<()> {
        let key = self.keys.settings.clone();
        let mut settings = settings.clone();
        settings.normalize();
        self.write_json(&key, &settings)
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    fn raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating as empty");
                None
            }
        }
    }

    fn has_boards_without_columns(&self, key: &str) -> bool {
        let Some(raw) = self.raw(key) else {
            return false;
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items
                .iter()
                .any(|b| b.is_object() && b.get("columns").is_none()),
            _ => false,
        }
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.raw(key) else {
            return Vec::new();
        };

        let items = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(key, "stored value is not an array, treating as empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(key, error = %e, "stored value is not JSON, treating as empty");
                return Vec::new();
            }
        };

        items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(key, index, error = %e, "skipping malformed record");
                    None
                }
            })
            .collect()
    }

    fn write_collection<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<()> {
        self.write_json(key, items)?;
        debug!(key, records = items.len(), "saved collection");
        Ok(())
    }

    fn write_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).map_err(|e| match e {
            KanbanError::Storage { .. } => e,
            other => KanbanError::storage(key, other.to_string()),
        })
    }
}

/// Replace the first element matching `same` or push `item`.
fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTask, Priority};
    use crate::storage::MemoryStore;

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::open(MemoryStore::new(), &KanbanConfig::default()).unwrap()
    }

    #[test]
    fn test_open_writes_defaults_once() {
        let gw = gateway();
        assert_eq!(gw.version().as_deref(), Some("1.0.0"));
        assert_eq!(gw.get_settings(), Settings::default());

        let mut store = gw.into_inner();
        store.set("kanban_version", "\"0.9.0\"").unwrap();
        store.set("kanban_settings", "{\"darkMode\":false}").unwrap();

        let gw = PersistenceGateway::open(store, &KanbanConfig::default()).unwrap();
        assert_eq!(gw.version().as_deref(), Some("0.9.0"));
        assert!(!gw.get_settings().dark_mode);
    }

    #[test]
    fn test_custom_prefix() {
        let config = KanbanConfig::default().with_storage_prefix("nexora");
        let mut gw = PersistenceGateway::open(MemoryStore::new(), &config).unwrap();
        gw.put_board(&Board::new("A")).unwrap();
        assert!(gw.store().get("nexora_boards").unwrap().is_some());
        assert!(gw.store().get("kanban_boards").unwrap().is_none());
    }

    #[test]
    fn test_put_board_replaces_in_place() {
        let mut gw = gateway();
        let a = Board::new("A");
        let mut b = Board::new("B");
        gw.put_board(&a).unwrap();
        gw.put_board(&b).unwrap();

        b.title = "B2".into();
        gw.put_board(&b).unwrap();

        let titles: Vec<String> = gw.list_boards().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["A", "B2"]);
    }

    #[test]
    fn test_update_board_missing_creates_nothing() {
        let mut gw = gateway();
        let updated = gw
            .update_board("board-missing", &BoardPatch::new().with_title("x"))
            .unwrap();
        assert!(!updated);
        assert!(gw.list_boards().is_empty());
    }

    #[test]
    fn test_update_board_stamps_updated_at() {
        let mut gw = gateway();
        let board = Board::new("A");
        gw.put_board(&board).unwrap();

        assert!(gw.update_board(&board.id, &BoardPatch::new()).unwrap());
        let stored = gw.get_board(&board.id).unwrap();
        assert_eq!(stored.title, "A");
        assert!(stored.updated_at >= board.updated_at);
        assert_eq!(stored.created_at, board.created_at);
    }

    #[test]
    fn test_delete_board() {
        let mut gw = gateway();
        let board = Board::new("A");
        gw.put_board(&board).unwrap();
        assert!(gw.delete_board(&board.id).unwrap());
        assert!(!gw.delete_board(&board.id).unwrap());
        assert!(gw.get_board(&board.id).is_none());
    }

    #[test]
    fn test_task_queries() {
        let mut gw = gateway();
        let t1 = Task::new("b1", "c1", NewTask::new("one"));
        let t2 = Task::new("b1", "c2", NewTask::new("two"));
        let t3 = Task::new("b2", "c3", NewTask::new("three"));
        for t in [&t1, &t2, &t3] {
            gw.put_task(t).unwrap();
        }

        assert_eq!(gw.tasks_by_board("b1").len(), 2);
        assert_eq!(gw.tasks_by_column("c2")[0].id, t2.id);

        assert_eq!(gw.delete_tasks_by_board("b1").unwrap(), 2);
        assert_eq!(gw.list_tasks(), vec![t3.clone()]);
        assert_eq!(gw.delete_tasks(&[t3.id.as_str(), "task-missing"]).unwrap(), 1);
        assert!(gw.list_tasks().is_empty());
    }

    #[test]
    fn test_update_task() {
        let mut gw = gateway();
        let task = Task::new("b1", "c1", NewTask::new("one"));
        gw.put_task(&task).unwrap();

        let patch = TaskPatch::new().with_priority(Priority::High);
        assert!(gw.update_task(&task.id, &patch).unwrap());
        assert!(!gw.update_task("task-missing", &patch).unwrap());

        let stored = gw.get_task(&task.id).unwrap();
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.board_id, "b1");
        assert_eq!(gw.list_tasks().len(), 1);
    }

    #[test]
    fn test_corrupt_collection_reads_empty() {
        let mut store = MemoryStore::new();
        store.set("kanban_boards", "{not json").unwrap();
        store.set("kanban_tasks", "{\"a\":1}").unwrap();
        let gw = PersistenceGateway::open(store, &KanbanConfig::default()).unwrap();

        assert!(gw.list_boards().is_empty());
        assert!(gw.list_tasks().is_empty());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let good = Board::new("Good");
        let raw = format!("[{}, 42, {{\"title\":\"no id\"}}]", serde_json::to_string(&good).unwrap());
        let store = MemoryStore::new().with_entry("kanban_boards", &raw);
        let gw = PersistenceGateway::open(store, &KanbanConfig::default()).unwrap();

        assert_eq!(gw.list_boards(), vec![good]);
    }

    #[test]
    fn test_corrupt_settings_fall_back_to_defaults() {
        let store = MemoryStore::new().with_entry("kanban_settings", "nope");
        let gw = PersistenceGateway::open(store, &KanbanConfig::default()).unwrap();
        assert_eq!(gw.get_settings(), Settings::default());
    }

    #[test]
    fn test_update_and_reset_settings() {
        let mut gw = gateway();
        let s = gw
            .update_settings(&SettingsPatch::new().with_dark_mode(false))
            .unwrap();
        assert!(!s.dark_mode);
        assert!(!gw.get_settings().dark_mode);

        gw.reset_settings().unwrap();
        assert!(gw.get_settings().dark_mode);
    }

    #[test]
    fn test_settings_extra_cannot_shadow_typed_keys() {
        let mut gw = gateway();
        gw.update_settings(&SettingsPatch::new().with_language("de"))
            .unwrap();
        gw.update_settings(&SettingsPatch::new().with_extra("darkMode", serde_json::json!(false)))
            .unwrap();

        let raw = gw.store().get("kanban_settings").unwrap().unwrap();
        assert_eq!(raw.matches("\"darkMode\"").count(), 1);

        let s = gw.get_settings();
        assert_eq!(s.language, "de");
        assert!(!s.dark_mode);
    }

    #[test]
    fn test_open_persists_columns_for_boards_stored_without_them() {
        let store = MemoryStore::new().with_entry(
            "kanban_boards",
            r#"[{"id": "board-1", "title": "Legacy"}]"#,
        );
        let gw = PersistenceGateway::open(store, &KanbanConfig::default()).unwrap();

        let first = gw.get_board("board-1").unwrap();
        assert_eq!(first.columns.len(), 4);
        assert_eq!(gw.get_board("board-1").unwrap(), first);
    }
}
