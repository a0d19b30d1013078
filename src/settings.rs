//! Vault settings and prompt texts
//!
//! Read from an optional JSON file on native builds; the browser build uses
//! the defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::STORAGE_KEY;

/// Vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Key the collection blob is stored under
    pub storage_key: String,
    /// Directory for the native file store
    pub data_dir: PathBuf,

    // === Prompts ===
    /// Asked before deleting a character
    pub confirm_delete: String,
    /// Asked before leaving the sheet without saving
    pub confirm_discard: String,
    /// Shown when saving a character with no name
    pub missing_name_message: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            data_dir: PathBuf::from(".character-vault"),

            confirm_delete: "Delete this character?".to_string(),
            confirm_discard: "Unsaved changes will be lost. Return to the list?".to_string(),
            missing_name_message: "A name is required!".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::error!("Invalid settings file {}: {e}", path.display()),
            },
            Err(e) => log::warn!("Cannot read settings file {}: {e}", path.display()),
        }

        log::info!("Using default settings");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "storage_key": "custom" }"#).unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.storage_key, "custom");
        assert_eq!(settings.data_dir, Settings::default().data_dir);
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let missing = dir.path().join("missing.json");
        assert_eq!(Settings::load_from(&missing), Settings::default());
    }
}
