//! Save/load of the character collection
//!
//! The whole collection lives in one JSON blob under a single key:
//! - Every write replaces the blob entirely
//! - Missing blob loads as an empty collection
//! - Corrupt blob is logged and also loads as empty

pub mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub mod file;

#[cfg(target_arch = "wasm32")]
pub mod local;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use thiserror::Error;

use crate::character::Character;

/// Errors from the underlying key-value store or the blob codec
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to read '{key}': {reason}")]
    Read { key: String, reason: String },
    #[error("Failed to write '{key}': {reason}")]
    Write { key: String, reason: String },
    #[error("Storage quota exceeded writing '{key}' ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },
    #[error("Failed to encode collection: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to decode collection: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Synchronous string key-value store (LocalStorage semantics)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key` in full
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Reads and writes the character collection under one fixed key
#[derive(Debug)]
pub struct CharacterStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> CharacterStore<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the collection, falling back to empty on any failure
    pub fn load(&self) -> Vec<Character> {
        match self.try_load() {
            Ok(characters) => {
                log::info!("Loaded {} characters", characters.len());
                characters
            }
            Err(e) => {
                log::error!("Load error, starting with an empty collection: {e}");
                Vec::new()
            }
        }
    }

    /// Load the collection, surfacing read and decode errors
    pub fn try_load(&self) -> Result<Vec<Character>, StorageError> {
        match self.store.get(&self.key)? {
            Some(json) => serde_json::from_str(&json).map_err(StorageError::Decode),
            None => Ok(Vec::new()),
        }
    }

    /// Serialize the full collection and replace the stored blob
    pub fn save(&mut self, characters: &[Character]) -> Result<(), StorageError> {
        let json = serde_json::to_string(characters).map_err(StorageError::Encode)?;
        self.store.set(&self.key, &json)?;
        log::info!("Characters saved ({} entries)", characters.len());
        Ok(())
    }

    /// Drop the stored blob entirely
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.store.remove(&self.key)?;
        log::info!("Saved characters cleared");
        Ok(())
    }
}
