//! Browser bindings
//!
//! Exposes the controller to the page script. Renders are driven from JS by
//! reading the JSON snapshots after each call.

use wasm_bindgen::prelude::*;

use crate::character::{BasicField, CharacterId, PropertyEdit};
use crate::controller::Controller;
use crate::persistence::{CharacterStore, LocalStorage, MemoryStore};
use crate::platform::BrowserPrompter;
use crate::settings::Settings;

enum Backend {
    Local(Controller<LocalStorage, BrowserPrompter>),
    // Private browsing can deny LocalStorage; keep working in memory
    Memory(Controller<MemoryStore, BrowserPrompter>),
}

macro_rules! with_controller {
    ($self:expr, $c:ident => $body:expr) => {
        match &mut $self.backend {
            Backend::Local($c) => $body,
            Backend::Memory($c) => $body,
        }
    };
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Pending image request handed to JS while a FileReader runs
#[wasm_bindgen]
pub struct ImageRequest {
    ticket: crate::controller::ImageTicket,
}

#[wasm_bindgen]
pub struct CharacterVault {
    backend: Backend,
}

#[wasm_bindgen]
impl CharacterVault {
    #[wasm_bindgen(constructor)]
    pub fn new() -> CharacterVault {
        let settings = Settings::default();
        let backend = match LocalStorage::open() {
            Ok(storage) => Backend::Local(Controller::new(
                CharacterStore::new(storage, settings.storage_key.clone()),
                BrowserPrompter,
                &settings,
            )),
            Err(e) => {
                log::error!("{e}; characters will not persist");
                Backend::Memory(Controller::new(
                    CharacterStore::new(MemoryStore::new(), settings.storage_key.clone()),
                    BrowserPrompter,
                    &settings,
                ))
            }
        };
        CharacterVault { backend }
    }

    /// "list" or "sheet"
    #[wasm_bindgen(js_name = viewMode)]
    pub fn view_mode(&mut self) -> String {
        with_controller!(self, c => c.view_mode().as_str().to_string())
    }

    /// JSON array of the committed characters
    #[wasm_bindgen(js_name = charactersJson)]
    pub fn characters_json(&mut self) -> String {
        let json = with_controller!(self, c => serde_json::to_string(c.characters()));
        json.unwrap_or_else(|_| "[]".to_string())
    }

    /// JSON of the open session, or `null`
    #[wasm_bindgen(js_name = sessionJson)]
    pub fn session_json(&mut self) -> String {
        let json = with_controller!(self, c => serde_json::to_string(&c.session()));
        json.unwrap_or_else(|_| "null".to_string())
    }

    #[wasm_bindgen(js_name = startCreate)]
    pub fn start_create(&mut self) -> Option<String> {
        with_controller!(self, c => c.start_create().map(|id| id.to_string()))
    }

    #[wasm_bindgen(js_name = startEdit)]
    pub fn start_edit(&mut self, id: &str) -> bool {
        with_controller!(self, c => c.start_edit(&CharacterId::new(id)))
    }

    #[wasm_bindgen(js_name = updateBasic)]
    pub fn update_basic(&mut self, field: &str, value: &str) -> Result<(), JsValue> {
        let field: BasicField = field.parse().map_err(js_error)?;
        let result = with_controller!(self, c => c.update_field(field, value));
        result.map_err(js_error)
    }

    /// `value` is the input text, or "true"/"false" for `broken`
    #[wasm_bindgen(js_name = updateProperty)]
    pub fn update_property(
        &mut self,
        index: usize,
        field: &str,
        value: &str,
    ) -> Result<(), JsValue> {
        let edit = PropertyEdit::parse(field, value).map_err(js_error)?;
        let result = with_controller!(self, c => c.update_property(index, edit));
        result.map_err(js_error)
    }

    /// Returns false when the save was rejected (the user has been alerted)
    pub fn save(&mut self) -> bool {
        with_controller!(self, c => c.save().is_ok())
    }

    #[wasm_bindgen(js_name = cancelEdit)]
    pub fn cancel_edit(&mut self) -> bool {
        with_controller!(self, c => c.cancel_edit())
    }

    #[wasm_bindgen(js_name = deleteCharacter)]
    pub fn delete_character(&mut self, id: &str) -> bool {
        with_controller!(self, c => c.delete_character(&CharacterId::new(id)))
    }

    /// Call before starting a FileReader; pass the result to `completeImage`
    #[wasm_bindgen(js_name = beginImage)]
    pub fn begin_image(&mut self) -> Option<ImageRequest> {
        with_controller!(self, c => c.begin_image().map(|ticket| ImageRequest { ticket }))
    }

    #[wasm_bindgen(js_name = completeImage)]
    pub fn complete_image(&mut self, request: ImageRequest, data_url: Option<String>) -> bool {
        with_controller!(self, c => c.complete_image(request.ticket, data_url))
    }

    #[wasm_bindgen(js_name = clearImage)]
    pub fn clear_image(&mut self) -> bool {
        with_controller!(self, c => c.clear_image().is_ok())
    }

    #[wasm_bindgen(js_name = isSynced)]
    pub fn is_synced(&mut self) -> bool {
        with_controller!(self, c => c.is_synced())
    }
}

impl Default for CharacterVault {
    fn default() -> Self {
        Self::new()
    }
}
