//! In-memory store backend.

use super::KeyValueStore;
use orderdesk_core::StoreError;
use std::collections::HashMap;
use std::sync::RwLock;

/// Non-durable backend for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("k", "v1").expect("set should succeed");
        store.set("k", "v2").expect("set should succeed");
        assert_eq!(store.get("k").expect("get should succeed").as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);

        store.delete("k").expect("delete should succeed");
        store.delete("k").expect("second delete should succeed");
        assert!(!store.contains_key("k"));
        assert_eq!(store.get("k").expect("get should succeed"), None);
    }
}
