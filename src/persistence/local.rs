//! Browser LocalStorage back-end (wasm32 only)

use super::{KeyValueStore, StorageError};

/// Handle to `window.localStorage`
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| StorageError::Unavailable("localStorage".into()))?;
        Ok(Self { storage })
    }
}

fn js_reason(value: wasm_bindgen::JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.storage.get_item(key) {
            Ok(value) => Ok(value),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                reason: js_reason(e),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Browsers signal a full store by throwing QuotaExceededError
        self.storage.set_item(key, value).map_err(|e| {
            let reason = js_reason(e);
            if reason.contains("Quota") {
                StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                }
            } else {
                StorageError::Write {
                    key: key.to_string(),
                    reason,
                }
            }
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match self.storage.remove_item(key) {
            Ok(()) => Ok(()),
            Err(e) => Err(StorageError::Write {
                key: key.to_string(),
                reason: js_reason(e),
            }),
        }
    }
}
