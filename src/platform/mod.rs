//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (record ids)
//! - Confirmation and alert prompts
//! - Image file encoding (native; the browser encodes via FileReader)

pub mod image;

#[cfg(target_arch = "wasm32")]
pub mod browser;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserPrompter;

pub use image::{ImageError, encode_image_bytes, mime_for_path};

#[cfg(not(target_arch = "wasm32"))]
pub use image::encode_image_file;

/// Blocking yes/no and acknowledge dialogs
pub trait Prompter {
    /// Ask a yes/no question; `true` means the user agreed
    fn confirm(&self, message: &str) -> bool;

    /// Show a message that only needs acknowledging
    fn alert(&self, message: &str);
}

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
