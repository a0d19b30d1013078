//! In-process key-value store
//!
//! Used by tests and as the fallback when no device storage is available.

use std::collections::HashMap;

use super::{KeyValueStore, StorageError};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    /// Maximum total bytes across all values (None = unlimited)
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes pushing the total size past `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Number of successful `set` calls
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let total = self.used_bytes_without(key) + key.len() + value.len();
            if total > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let mut store = MemoryStore::with_quota(10);
        store.set("k", "12345678").unwrap();
        // Replacing the same key must not count the old value
        store.set("k", "87654321").unwrap();
        assert!(store.set("k", "1234567890").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("87654321"));
        assert_eq!(store.writes(), 2);
    }
}
