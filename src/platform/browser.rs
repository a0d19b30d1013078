//! `window.confirm` / `window.alert` prompts (wasm32 only)

use super::Prompter;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPrompter;

impl Prompter for BrowserPrompter {
    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}
