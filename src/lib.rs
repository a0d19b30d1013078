//! Character Vault - a local-first character sheet keeper
//!
//! Core modules:
//! - `character`: Character records and their eight property slots
//! - `controller`: Committed collection, view state and edit session
//! - `persistence`: Whole-collection save/load over a key-value store
//! - `platform`: Browser/native platform abstraction (prompts, time, images)
//! - `settings`: Storage location and prompt texts

pub mod character;
pub mod controller;
pub mod persistence;
pub mod platform;
pub mod settings;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use character::{BasicField, Character, CharacterId, Property, PropertyEdit, PropertyField};
pub use controller::{Controller, EditError, ListEntry, SaveError, ViewMode, ViewState};
pub use persistence::{CharacterStore, KeyValueStore, StorageError};
pub use settings::Settings;

/// Vault constants
pub mod consts {
    /// Storage key for the character collection blob
    pub const STORAGE_KEY: &str = "pw_characters_v1";
    /// Number of property slots on every character
    pub const PROPERTY_SLOTS: usize = 8;
}
