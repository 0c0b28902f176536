//! Key-value storage contract.
//!
//! The persistence gateway only needs three operations on string keys holding
//! JSON text. Anything that can provide them can back a board store:
//!
//! - [`MemoryStore`] - `HashMap` backed, used by tests and short-lived sessions
//! - [`FileStore`] - one JSON file per key in a directory, atomic replace
//!
//! ```text
//! PersistenceGateway<S: KeyValueStore>
//!   ├── <prefix>_boards    -> [Board, ...]
//!   ├── <prefix>_tasks     -> [Task, ...]
//!   ├── <prefix>_settings  -> {darkMode, language, ...}
//!   └── <prefix>_version   -> "1.0.0"
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// String-keyed blob storage.
///
/// Every write replaces the whole value stored under a key. There is no
/// compare-and-swap: two writers racing on one key lose an update.
pub trait KeyValueStore {
    /// Read the value stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KanbanError::Storage`] when the medium fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KanbanError::Storage`] when the medium fails.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::KanbanError::Storage`] when the medium fails.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Fully qualified storage keys for one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub boards: String,
    pub tasks: String,
    pub settings: String,
    pub version: String,
}

impl StorageKeys {
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            boards: format!("{prefix}_boards"),
            tasks: format!("{prefix}_tasks"),
            settings: format!("{prefix}_settings"),
            version: format!("{prefix}_version"),
        }
    }

    /// The three collection keys, in the order they are exported.
    pub fn collections(&self) -> [&str; 3] {
        [&self.boards, &self.tasks, &self.settings]
    }
}
