//! In-memory key-value store.

use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::Result;

/// `HashMap`-backed store. Contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create a new empty store.
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

    /// Number of keys currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());

        store.set("a", "[1,2]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[1,2]"));

        store.set("a", "[]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[]"));

        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let mut store = MemoryStore::new();
        assert!(store.remove("missing").is_ok());
    }

    #[test]
    fn test_with_entry() {
        let store = MemoryStore::new().with_entry("k", "v");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
