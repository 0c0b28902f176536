//! Mock key-value store with failure injection.
//!
//! [`MockStore`] behaves like [`crate::storage::MemoryStore`] until told to
//! fail. Failures can target one key, every read of a key, or every write
//! after a given number of successful ones, which is how tests stop a
//! multi-write operation halfway.

use anyhow::anyhow;
use std::collections::{HashMap, HashSet};

use crate::error::{IntoKanbanError, Result};
use crate::storage::KeyValueStore;

/// In-memory store whose reads and writes can be made to fail.
///
/// # Example
///
/// ```rust
/// use kanban::storage::KeyValueStore;
/// use kanban::testing::MockStore;
///
/// let mut store = MockStore::new().failing_writes_to("kanban_boards");
/// assert!(store.set("kanban_tasks", "[]").is_ok());
/// assert!(store.set("kanban_boards", "[]").unwrap_err().is_storage());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    entries: HashMap<String, String>,
    failing_writes: HashSet<String>,
    failing_reads: HashSet<String>,
    writes_allowed: Option<usize>,
    write_log: Vec<String>,
}

impl MockStore {
    /// Create a new empty store that never fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a single key.
    #[must_use]
    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Make every write to `key` fail.
    #[must_use]
    pub fn failing_writes_to(mut self, key: &str) -> Self {
        self.fail_writes_to(key);
        self
    }

    /// Make every read of `key` fail.
    #[must_use]
    pub fn failing_reads_from(mut self, key: &str) -> Self {
        self.failing_reads.insert(key.to_string());
        self
    }

    /// Allow `count` more successful writes, then fail all later ones.
    #[must_use]
    pub fn failing_after(mut self, count: usize) -> Self {
        self.allow_writes(count);
        self
    }

    /// Start failing writes to `key` on an existing store.
    pub fn fail_writes_to(&mut self, key: &str) {
        self.failing_writes.insert(key.to_string());
    }

    /// Allow `count` more successful writes from now on.
    pub fn allow_writes(&mut self, count: usize) {
        self.writes_allowed = Some(count);
    }

    /// Clear every injected failure.
    pub fn heal(&mut self) {
        self.failing_writes.clear();
        self.failing_reads.clear();
        self.writes_allowed = None;
    }

    /// Keys of successful writes and removals, oldest first.
    #[must_use]
    pub fn write_log(&self) -> &[String] {
        &self.write_log
    }

    /// Raw stored value, bypassing injected read failures.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn check_write(&mut self, key: &str) -> Result<()> {
        if self.failing_writes.contains(key) {
            return Err(anyhow!("injected write failure")).into_kanban_storage(key);
        }
        match self.writes_allowed {
            Some(0) => Err(anyhow!("write budget exhausted")).into_kanban_storage(key),
            Some(n) => {
                self.writes_allowed = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl KeyValueStore for MockStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if self.failing_reads.contains(key) {
            return Err(anyhow!("injected read failure")).into_kanban_storage(key);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_write(key)?;
        self.entries.insert(key.to_string(), value.to_string());
        self.write_log.push(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.entries.remove(key);
        self.write_log.push(key.to_string());
        Ok(())
    }
}
