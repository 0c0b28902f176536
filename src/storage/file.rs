//! Directory-backed key-value store with atomic writes.
//!
//! Each key lives in `<dir>/<key>.json`. Writes go to a temporary sibling
//! which is synced and renamed over the target while holding an exclusive
//! lock on `<dir>/.lock`, so a reader never sees a half-written value.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::KeyValueStore;
use crate::error::{IntoKanbanError, KanbanError, Result};

/// Extension of value files.
const VALUE_SUFFIX: &str = ".json";

/// Temporary file suffix for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Lock file name.
const LOCK_FILE: &str = ".lock";

/// Store keeping one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Create a store in the platform data directory (`<data_dir>/kanban`).
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the platform has no data directory.
    pub fn open_default() -> Result<Self> {
        Self::default_dir()
            .map(Self::new)
            .ok_or_else(|| KanbanError::config("No platform data directory available"))
    }

    /// Default store location, if the platform defines one.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("kanban"))
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{VALUE_SUFFIX}"))
    }

    fn tmp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{VALUE_SUFFIX}{TMP_SUFFIX}"))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    fn check_key(key: &str) -> Result<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if valid {
            Ok(())
        } else {
            Err(KanbanError::storage(key, "key is not a valid file name"))
        }
    }

    fn lock_exclusive(&self, key: &str) -> Result<File> {
        fs::create_dir_all(&self.dir).into_kanban_storage(key)?;
        let lock_file = File::create(self.lock_path()).into_kanban_storage(key)?;
        FileExt::lock_exclusive(&lock_file)
            .map_err(|e| KanbanError::storage(key, format!("Failed to acquire lock: {e}")))?;
        Ok(lock_file)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::check_key(key)?;

        let lock_path = self.lock_path();
        let _guard = if lock_path.exists() {
            let lock_file = File::open(&lock_path).into_kanban_storage(key)?;
            FileExt::lock_shared(&lock_file)
                .map_err(|e| KanbanError::storage(key, format!("Failed to acquire lock: {e}")))?;
            Some(lock_file)
        } else {
            None
        };

        match fs::read_to_string(self.value_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KanbanError::storage(key, e.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        Self::check_key(key)?;
        let _guard = self.lock_exclusive(key)?;

        let tmp_path = self.tmp_path(key);
        let mut tmp_file = File::create(&tmp_path).into_kanban_storage(key)?;
        tmp_file.write_all(value.as_bytes()).into_kanban_storage(key)?;
        tmp_file.sync_all().into_kanban_storage(key)?;

        fs::rename(&tmp_path, self.value_path(key)).into_kanban_storage(key)?;
        debug!(key, bytes = value.len(), "wrote value file");

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        if !self.dir.exists() {
            return Ok(());
        }
        let _guard = self.lock_exclusive(key)?;

        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KanbanError::storage(key, e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileStore::new(temp_dir.path().join("data"));
        (store, temp_dir)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (store, _temp) = test_store();
        assert!(store.get("kanban_boards").unwrap().is_none());
    }

    #[test]
    fn test_set_creates_directory_and_file() {
        let (mut store, _temp) = test_store();
        store.set("kanban_boards", "[]").unwrap();

        assert!(store.value_path("kanban_boards").exists());
        assert_eq!(store.get("kanban_boards").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_set_leaves_no_tmp_file() {
        let (mut store, _temp) = test_store();
        store.set("kanban_tasks", "[1]").unwrap();
        store.set("kanban_tasks", "[1,2]").unwrap();

        assert!(!store.tmp_path("kanban_tasks").exists());
        assert_eq!(store.get("kanban_tasks").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_remove() {
        let (mut store, _temp) = test_store();
        store.set("kanban_version", "\"1.0.0\"").unwrap();
        store.remove("kanban_version").unwrap();
        assert!(store.get("kanban_version").unwrap().is_none());

        // removing again is fine
        store.remove("kanban_version").unwrap();
    }

    #[test]
    fn test_remove_before_any_write() {
        let (mut store, _temp) = test_store();
        assert!(store.remove("kanban_boards").is_ok());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (mut store, _temp) = test_store();
        assert!(store.set("../escape", "x").is_err());
        assert!(store.set("", "x").is_err());
        assert!(store.get(".lock").is_err());
    }

    #[test]
    fn test_values_survive_new_instance() {
        let (mut store, temp) = test_store();
        store.set("kanban_settings", "{\"darkMode\":false}").unwrap();

        let reopened = FileStore::new(temp.path().join("data"));
        assert_eq!(
            reopened.get("kanban_settings").unwrap().as_deref(),
            Some("{\"darkMode\":false}")
        );
    }
}
