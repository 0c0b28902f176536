//! Whole-store export, import, backup and usage reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::PersistenceGateway;
use crate::error::Result;
use crate::model::{Board, Task};
use crate::settings::Settings;
use crate::storage::KeyValueStore;

/// Snapshot of every collection.
///
/// Any field may be missing on import; only the collections present are
/// written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportDocument {
    pub boards: Option<Vec<Board>>,
    pub tasks: Option<Vec<Task>>,
    pub settings: Option<Settings>,
    pub version: Option<String>,
    pub exported_at: Option<DateTime<Utc>>,
}

/// Size of one stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionUsage {
    pub key: String,
    pub records: usize,
    pub bytes: usize,
}

impl CollectionUsage {
    #[must_use]
    pub fn size(&self) -> String {
        format_bytes(self.bytes)
    }
}

/// Storage usage across all collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageInfo {
    pub collections: Vec<CollectionUsage>,
    pub total_bytes: usize,
}

impl StorageInfo {
    #[must_use]
    pub fn total_size(&self) -> String {
        format_bytes(self.total_bytes)
    }

    /// Usage for one collection key.
    #[must_use]
    pub fn collection(&self, key: &str) -> Option<&CollectionUsage> {
        self.collections.iter().find(|c| c.key == key)
    }
}

/// Human-readable byte count, base 1024, at most two decimals.
///
/// ```
/// use kanban::gateway::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// assert_eq!(format_bytes(1024 * 1024), "1 MB");
/// ```
#[must_use]
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    /// Snapshot every collection plus the version marker.
    pub fn export_data(&self) -> ExportDocument {
        ExportDocument {
            boards: Some(self.list_boards()),
            tasks: Some(self.list_tasks()),
            settings: Some(self.get_settings()),
            version: Some(self.version().unwrap_or_else(|| self.version.clone())),
            exported_at: Some(Utc::now()),
        }
    }

    /// Overwrite each collection present in `doc`. The version marker is kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a collection cannot be written. Collections
    /// written before the failure stay written.
    pub fn import_data(&mut self, doc: &ExportDocument) -> Result<()> {
        if let Some(boards) = &doc.boards {
            self.save_boards(boards)?;
        }
        if let Some(tasks) = &doc.tasks {
            self.save_tasks(tasks)?;
        }
        if let Some(settings) = &doc.settings {
            self.save_settings(settings)?;
        }
        info!(
            boards = doc.boards.as_ref().map_or(0, Vec::len),
            tasks = doc.tasks.as_ref().map_or(0, Vec::len),
            "imported data"
        );
        Ok(())
    }

    /// Pretty-printed export.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if serialization fails.
    pub fn create_backup(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_data())?)
    }

    /// Parse a backup and import it. Nothing is written if parsing fails.
    ///
    /// # Errors
    ///
    /// Returns a JSON error for an unparseable backup, or a storage error if
    /// a collection cannot be written.
    pub fn restore_backup(&mut self, backup: &str) -> Result<()> {
        let doc: ExportDocument = serde_json::from_str(backup)?;
        self.import_data(&doc)
    }

    /// Remove every key, the version marker included.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a key cannot be removed.
    pub fn clear_all(&mut self) -> Result<()> {
        let keys = self.keys.clone();
        for key in keys.collections().into_iter().chain([keys.version.as_str()]) {
            self.store.remove(key)?;
        }
        info!("cleared all kanban storage");
        Ok(())
    }

    /// Record counts and raw byte sizes of each collection.
    pub fn storage_info(&self) -> StorageInfo {
        let counts = [
            self.list_boards().len(),
            self.list_tasks().len(),
            usize::from(self.raw(&self.keys.settings).is_some()),
        ];

        let collections: Vec<CollectionUsage> = self
            .keys
            .collections()
            .into_iter()
            .zip(counts)
            .map(|(key, records)| CollectionUsage {
                key: key.to_string(),
                records,
                bytes: self.raw(key).map_or(0, |raw| raw.len()),
            })
            .collect();

        let total_bytes = collections.iter().map(|c| c.bytes).sum();
        StorageInfo {
            collections,
            total_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KanbanConfig;
    use crate::model::NewTask;
    use crate::storage::MemoryStore;

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::open(MemoryStore::new(), &KanbanConfig::default()).unwrap()
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(500), "500 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1100), "1.07 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_export_contains_everything() {
        let mut gw = gateway();
        let board = Board::new("A");
        gw.put_board(&board).unwrap();
        gw.put_task(&Task::new(&board.id, &board.columns[0].id, NewTask::new("t")))
            .unwrap();

        let doc = gw.export_data();
        assert_eq!(doc.boards.unwrap().len(), 1);
        assert_eq!(doc.tasks.unwrap().len(), 1);
        assert!(doc.settings.is_some());
        assert_eq!(doc.version.as_deref(), Some("1.0.0"));
        assert!(doc.exported_at.is_some());
    }

    #[test]
    fn test_backup_is_pretty_and_camel_case() {
        let gw = gateway();
        let backup = gw.create_backup().unwrap();
        assert!(backup.contains('\n'));
        assert!(backup.contains("\"exportedAt\""));
    }

    #[test]
    fn test_partial_import_keeps_other_collections() {
        let mut gw = gateway();
        gw.put_board(&Board::new("Keep me")).unwrap();
        gw.put_task(&Task::new("b", "c", NewTask::new("old"))).unwrap();

        gw.restore_backup(r#"{"tasks": []}"#).unwrap();

        assert_eq!(gw.list_boards().len(), 1);
        assert!(gw.list_tasks().is_empty());
    }

    #[test]
    fn test_restore_garbage_leaves_store_untouched() {
        let mut gw = gateway();
        gw.put_board(&Board::new("A")).unwrap();
        let before = gw.store().clone();

        let err = gw.restore_backup("definitely not json").unwrap_err();
        assert!(matches!(err, crate::KanbanError::Json(_)));
        assert_eq!(gw.store().get("kanban_boards").unwrap(), before.get("kanban_boards").unwrap());
    }

    #[test]
    fn test_clear_all_removes_version() {
        let mut gw = gateway();
        gw.put_board(&Board::new("A")).unwrap();
        gw.clear_all().unwrap();
        assert!(gw.store().is_empty());
        assert!(gw.version().is_none());
        assert!(gw.list_boards().is_empty());
    }

    #[test]
    fn test_storage_info() {
        let mut gw = gateway();
        gw.put_board(&Board::new("A")).unwrap();
        gw.put_board(&Board::new("B")).unwrap();

        let info = gw.storage_info();
        let boards = info.collection("kanban_boards").unwrap();
        assert_eq!(boards.records, 2);
        assert!(boards.bytes > 0);
        assert_eq!(info.collection("kanban_tasks").unwrap().records, 0);
        assert_eq!(info.collection("kanban_settings").unwrap().records, 1);
        assert_eq!(
            info.total_bytes,
            info.collections.iter().map(|c| c.bytes).sum::<usize>()
        );
        assert!(info.total_size().ends_with("KB") || info.total_size().ends_with("Bytes"));
    }
}
