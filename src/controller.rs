//! Collection and edit-session controller
//!
//! Owns the committed collection and the view state. The view is either the
//! list or a sheet holding the session copy being edited; a sheet without a
//! session cannot be expressed. Every change to the committed collection is
//! flushed through the persistence adapter straight away.

use thiserror::Error;

use crate::character::{BasicField, Character, CharacterId, PropertyEdit};
use crate::consts::PROPERTY_SLOTS;
use crate::persistence::{CharacterStore, KeyValueStore};
use crate::platform::{self, Prompter};
use crate::settings::Settings;

/// Error when editing the session copy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("No character is open for editing")]
    NoSession,
    #[error("Property index {0} out of range (0..{max})", max = PROPERTY_SLOTS)]
    PropertyIndex(usize),
}

/// Error when committing the session copy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("No character is open for editing")]
    NoSession,
    #[error("Character name is required")]
    MissingName,
}

/// The in-progress, uncommitted copy of a character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    character: Character,
    /// Bumped every time a new session opens
    generation: u64,
}

impl Session {
    pub fn character(&self) -> &Character {
        &self.character
    }
}

/// Which screen is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    List,
    Sheet(Session),
}

/// Discriminant of [`ViewState`] for front-ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Sheet,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Sheet => "sheet",
        }
    }
}

/// Pending image result bound to the session that asked for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTicket {
    generation: u64,
}

/// One row of the character list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: CharacterId,
    pub display_name: String,
    pub summary: String,
    pub has_image: bool,
}

/// Prompt texts shown by the controller
#[derive(Debug, Clone)]
struct Prompts {
    confirm_delete: String,
    confirm_discard: String,
    missing_name: String,
}

pub struct Controller<S, P> {
    store: CharacterStore<S>,
    prompter: P,
    prompts: Prompts,
    collection: Vec<Character>,
    view: ViewState,
    next_generation: u64,
    last_id: u64,
    /// False after a failed write until the next successful one
    synced: bool,
}

impl<S: KeyValueStore, P: Prompter> Controller<S, P> {
    /// Rehydrate the collection from storage and start on the list
    pub fn new(store: CharacterStore<S>, prompter: P, settings: &Settings) -> Self {
        let collection = store.load();
        Self {
            store,
            prompter,
            prompts: Prompts {
                confirm_delete: settings.confirm_delete.clone(),
                confirm_discard: settings.confirm_discard.clone(),
                missing_name: settings.missing_name_message.clone(),
            },
            collection,
            view: ViewState::List,
            next_generation: 0,
            last_id: 0,
            synced: true,
        }
    }

    // === Queries ===

    pub fn characters(&self) -> &[Character] {
        &self.collection
    }

    pub fn get(&self, id: &CharacterId) -> Option<&Character> {
        self.collection.iter().find(|c| &c.id == id)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mode(&self) -> ViewMode {
        match self.view {
            ViewState::List => ViewMode::List,
            ViewState::Sheet(_) => ViewMode::Sheet,
        }
    }

    /// The character open on the sheet, if any
    pub fn session(&self) -> Option<&Character> {
        match &self.view {
            ViewState::Sheet(session) => Some(&session.character),
            ViewState::List => None,
        }
    }

    /// Whether the open session would append rather than replace on save
    pub fn session_is_new(&self) -> bool {
        self.session().is_some_and(|s| self.get(&s.id).is_none())
    }

    pub fn list_entries(&self) -> Vec<ListEntry> {
        self.collection
            .iter()
            .map(|c| ListEntry {
                id: c.id.clone(),
                display_name: c.display_name().to_string(),
                summary: c.summary(),
                has_image: c.image.is_some(),
            })
            .collect()
    }

    /// False if the last write to storage failed
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn store(&self) -> &CharacterStore<S> {
        &self.store
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    // === List -> Sheet ===

    /// Open a blank character on the sheet.
    ///
    /// Returns the new id, or `None` if a sheet is already open.
    pub fn start_create(&mut self) -> Option<CharacterId> {
        if self.view_mode() == ViewMode::Sheet {
            log::warn!("start_create ignored: a sheet is already open");
            return None;
        }
        let id = self.next_id();
        self.open_sheet(Character::empty(id.clone()));
        log::info!("Creating character {id}");
        Some(id)
    }

    /// Open a copy of an existing character; unknown ids are ignored
    pub fn start_edit(&mut self, id: &CharacterId) -> bool {
        if self.view_mode() == ViewMode::Sheet {
            log::warn!("start_edit ignored: a sheet is already open");
            return false;
        }
        let Some(found) = self.get(id).cloned() else {
            log::debug!("start_edit: no character {id}");
            return false;
        };
        self.open_sheet(found);
        log::info!("Editing character {id}");
        true
    }

    // === Session edits ===

    pub fn update_field(
        &mut self,
        field: BasicField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        let session = self.session_mut()?;
        session.character = session.character.with_field(field, value);
        Ok(())
    }

    pub fn update_property(&mut self, index: usize, edit: PropertyEdit) -> Result<(), EditError> {
        let session = self.session_mut()?;
        session.character = session
            .character
            .with_property(index, edit)
            .ok_or(EditError::PropertyIndex(index))?;
        Ok(())
    }

    /// Set the session portrait from an already-encoded data URI
    pub fn attach_image(&mut self, encoded: impl Into<String>) -> Result<(), EditError> {
        let session = self.session_mut()?;
        session.character = session.character.with_image(Some(encoded.into()));
        Ok(())
    }

    pub fn clear_image(&mut self) -> Result<(), EditError> {
        let session = self.session_mut()?;
        session.character = session.character.with_image(None);
        Ok(())
    }

    /// Remember the current session before handing a file to the encoder
    pub fn begin_image(&self) -> Option<ImageTicket> {
        match &self.view {
            ViewState::Sheet(session) => Some(ImageTicket {
                generation: session.generation,
            }),
            ViewState::List => None,
        }
    }

    /// Apply an encoder result if its session is still open.
    ///
    /// `None` or an empty result means no file was picked. Returns whether the
    /// image was applied.
    pub fn complete_image(&mut self, ticket: ImageTicket, encoded: Option<String>) -> bool {
        let Some(encoded) = encoded.filter(|s| !s.is_empty()) else {
            return false;
        };
        match &mut self.view {
            ViewState::Sheet(session) if session.generation == ticket.generation => {
                session.character = session.character.with_image(Some(encoded));
                true
            }
            _ => {
                log::warn!("Discarding image for a session that is no longer open");
                false
            }
        }
    }

    // === Sheet -> List ===

    /// Commit the session: replace by id in place, or append.
    pub fn save(&mut self) -> Result<CharacterId, SaveError> {
        match self.session() {
            None => return Err(SaveError::NoSession),
            Some(session) if session.name.is_empty() => {
                self.prompter.alert(&self.prompts.missing_name);
                return Err(SaveError::MissingName);
            }
            Some(_) => {}
        }

        let ViewState::Sheet(session) = std::mem::replace(&mut self.view, ViewState::List) else {
            return Err(SaveError::NoSession);
        };
        let character = session.character;
        let id = character.id.clone();
        match self.collection.iter_mut().find(|c| c.id == id) {
            Some(existing) => *existing = character,
            None => self.collection.push(character),
        }
        log::info!("Saved character {id}");
        self.persist();
        Ok(id)
    }

    /// Leave the sheet without saving, after confirmation.
    ///
    /// Returns whether the session was discarded.
    pub fn cancel_edit(&mut self) -> bool {
        if self.view_mode() == ViewMode::List {
            return false;
        }
        if !self.prompter.confirm(&self.prompts.confirm_discard) {
            return false;
        }
        self.view = ViewState::List;
        log::info!("Edit discarded");
        true
    }

    /// Remove a character after confirmation.
    ///
    /// Returns whether a record was removed. A confirmed delete of an unknown
    /// id still flushes the (unchanged) collection.
    pub fn delete_character(&mut self, id: &CharacterId) -> bool {
        if !self.prompter.confirm(&self.prompts.confirm_delete) {
            return false;
        }
        let before = self.collection.len();
        self.collection.retain(|c| &c.id != id);
        let removed = self.collection.len() != before;
        if removed {
            log::info!("Deleted character {id}");
        }
        self.persist();
        removed
    }

    // === Internals ===

    fn open_sheet(&mut self, character: Character) {
        self.next_generation += 1;
        self.view = ViewState::Sheet(Session {
            character,
            generation: self.next_generation,
        });
    }

    fn session_mut(&mut self) -> Result<&mut Session, EditError> {
        match &mut self.view {
            ViewState::Sheet(session) => Ok(session),
            ViewState::List => Err(EditError::NoSession),
        }
    }

    /// Millisecond-timestamp id, increasing and unused in the collection
    fn next_id(&mut self) -> CharacterId {
        let mut candidate = platform::now_ms().max(self.last_id + 1);
        while self
            .collection
            .iter()
            .any(|c| c.id.as_str() == candidate.to_string())
        {
            candidate += 1;
        }
        self.last_id = candidate;
        CharacterId::new(candidate.to_string())
    }

    fn persist(&mut self) {
        match self.store.save(&self.collection) {
            Ok(()) => self.synced = true,
            Err(e) => {
                // Memory stays authoritative for this session
                log::error!("Save error: {e}");
                self.synced = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::PropertyField;
    use crate::consts::STORAGE_KEY;
    use crate::persistence::MemoryStore;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const PORTRAIT: &str = "data:image/png;base64,AA";

    /// Answers confirms from a queue (defaulting to yes) and records alerts
    #[derive(Default)]
    struct ScriptedPrompter {
        answers: RefCell<VecDeque<bool>>,
        confirms: RefCell<Vec<String>>,
        alerts: RefCell<Vec<String>>,
    }

    impl ScriptedPrompter {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: RefCell::new(answers.iter().copied().collect()),
                ..Default::default()
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&self, message: &str) -> bool {
            self.confirms.borrow_mut().push(message.to_string());
            self.answers.borrow_mut().pop_front().unwrap_or(true)
        }

        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }
    }

    type TestController = Controller<MemoryStore, ScriptedPrompter>;

    fn controller_with(store: MemoryStore, prompter: ScriptedPrompter) -> TestController {
        Controller::new(
            CharacterStore::new(store, STORAGE_KEY),
            prompter,
            &Settings::default(),
        )
    }

    fn controller() -> TestController {
        controller_with(MemoryStore::new(), ScriptedPrompter::default())
    }

    fn seeded(characters: &[Character]) -> MemoryStore {
        let mut store = CharacterStore::new(MemoryStore::new(), STORAGE_KEY);
        store.save(characters).unwrap();
        store.store().clone()
    }

    fn named(id: &str, name: &str) -> Character {
        Character::empty(CharacterId::new(id)).with_field(BasicField::Name, name)
    }

    fn writes(c: &TestController) -> usize {
        c.store().store().writes()
    }

    #[test]
    fn test_create_and_save_aria() {
        let mut c = controller();
        assert_eq!(c.view_mode(), ViewMode::List);

        let id = c.start_create().unwrap();
        assert_eq!(c.view_mode(), ViewMode::Sheet);
        assert!(c.session_is_new());
        c.update_field(BasicField::Name, "Aria").unwrap();
        assert_eq!(c.save(), Ok(id.clone()));

        assert_eq!(c.view_mode(), ViewMode::List);
        assert!(c.session().is_none());
        assert_eq!(c.characters().len(), 1);
        let saved = &c.characters()[0];
        assert_eq!(saved.id, id);
        assert_eq!(saved.name, "Aria");
        assert!(saved.properties.iter().all(|p| *p == Default::default()));
        assert_eq!(writes(&c), 1);
    }

    #[test]
    fn test_edit_property_broken() {
        let store = seeded(&[named("1", "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::default());
        let before = c.characters()[0].clone();

        assert!(c.start_edit(&CharacterId::new("1")));
        c.update_property(3, PropertyEdit::Broken(true)).unwrap();
        c.save().unwrap();

        assert_eq!(c.characters().len(), 1);
        let after = &c.characters()[0];
        assert!(after.properties[3].broken);
        for i in (0..PROPERTY_SLOTS).filter(|&i| i != 3) {
            assert_eq!(after.properties[i], before.properties[i]);
        }
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut c = controller();
        c.start_create().unwrap();
        c.update_field(BasicField::Name, "").unwrap();

        assert_eq!(c.save(), Err(SaveError::MissingName));
        assert!(c.characters().is_empty());
        assert_eq!(c.view_mode(), ViewMode::Sheet);
        assert_eq!(writes(&c), 0);
        assert_eq!(
            c.prompter().alerts.borrow().as_slice(),
            [Settings::default().missing_name_message]
        );
    }

    #[test]
    fn test_whitespace_name_is_accepted() {
        let mut c = controller();
        c.start_create().unwrap();
        c.update_field(BasicField::Name, "   ").unwrap();
        assert!(c.save().is_ok());
        assert_eq!(c.characters().len(), 1);
    }

    #[test]
    fn test_session_is_isolated_from_collection() {
        let store = seeded(&[named("1", "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::default());

        c.start_edit(&CharacterId::new("1"));
        c.update_field(BasicField::Name, "Changed").unwrap();
        c.update_property(0, PropertyEdit::Text(PropertyField::Notes, "x".into()))
            .unwrap();

        assert_eq!(c.characters()[0].name, "Aria");
        assert_eq!(c.characters()[0].properties[0].notes, "");
        assert_eq!(c.session().unwrap().name, "Changed");
    }

    #[test]
    fn test_edit_then_save_keeps_record_and_position() {
        let originals = [named("1", "Aria"), named("2", "Bram"), named("3", "Cole")];
        let mut c = controller_with(seeded(&originals), ScriptedPrompter::default());

        c.start_edit(&CharacterId::new("2"));
        assert!(!c.session_is_new());
        c.save().unwrap();
        assert_eq!(c.characters(), &originals);
    }

    #[test]
    fn test_start_edit_unknown_id_is_noop() {
        let mut c = controller();
        assert!(!c.start_edit(&CharacterId::new("missing")));
        assert_eq!(c.view_mode(), ViewMode::List);
        assert!(c.session().is_none());
    }

    #[test]
    fn test_delete_then_edit_is_noop() {
        let store = seeded(&[named("1", "Aria"), named("2", "Bram")]);
        let mut c = controller_with(store, ScriptedPrompter::default());

        assert!(c.delete_character(&CharacterId::new("1")));
        assert!(!c.start_edit(&CharacterId::new("1")));
        assert_eq!(c.view_mode(), ViewMode::List);
        assert_eq!(c.characters().len(), 1);
        assert_eq!(c.store().load().len(), 1);
    }

    #[test]
    fn test_declined_delete_changes_nothing() {
        let store = seeded(&[named("1", "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::answering(&[false]));
        let writes_before = writes(&c);

        assert!(!c.delete_character(&CharacterId::new("1")));
        assert_eq!(c.characters().len(), 1);
        assert_eq!(writes(&c), writes_before);
        assert_eq!(c.prompter().confirms.borrow().len(), 1);
    }

    #[test]
    fn test_delete_unknown_id_is_not_an_error() {
        let store = seeded(&[named("1", "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::default());
        let writes_before = writes(&c);

        assert!(!c.delete_character(&CharacterId::new("9")));
        assert_eq!(c.characters().len(), 1);
        assert_eq!(writes(&c), writes_before + 1);
        assert!(c.is_synced());
    }

    #[test]
    fn test_cancel_requires_confirmation() {
        let mut c = controller_with(
            MemoryStore::new(),
            ScriptedPrompter::answering(&[false, true]),
        );
        c.start_create().unwrap();
        c.update_field(BasicField::Name, "Draft").unwrap();

        assert!(!c.cancel_edit());
        assert_eq!(c.session().unwrap().name, "Draft");

        assert!(c.cancel_edit());
        assert_eq!(c.view_mode(), ViewMode::List);
        assert!(c.characters().is_empty());
        assert_eq!(writes(&c), 0);
    }

    #[test]
    fn test_edits_need_a_session() {
        let mut c = controller();
        assert_eq!(
            c.update_field(BasicField::Age, "30"),
            Err(EditError::NoSession)
        );
        assert_eq!(
            c.update_property(0, PropertyEdit::Broken(true)),
            Err(EditError::NoSession)
        );
        assert_eq!(c.attach_image(PORTRAIT), Err(EditError::NoSession));
        assert_eq!(c.save(), Err(SaveError::NoSession));
        assert!(!c.cancel_edit());
    }

    #[test]
    fn test_property_index_out_of_range() {
        let mut c = controller();
        c.start_create();
        assert_eq!(
            c.update_property(PROPERTY_SLOTS, PropertyEdit::Broken(true)),
            Err(EditError::PropertyIndex(PROPERTY_SLOTS))
        );
    }

    #[test]
    fn test_no_transition_while_sheet_open() {
        let store = seeded(&[named("1", "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::default());
        let id = c.start_create().unwrap();

        assert!(c.start_create().is_none());
        assert!(!c.start_edit(&CharacterId::new("1")));
        assert_eq!(c.session().unwrap().id, id);
    }

    #[test]
    fn test_image_applies_to_requesting_session() {
        let mut c = controller();
        assert!(c.begin_image().is_none());

        c.start_create();
        let ticket = c.begin_image().unwrap();
        assert!(!c.complete_image(ticket, None));
        assert!(c.complete_image(ticket, Some(PORTRAIT.into())));
        assert_eq!(c.session().unwrap().image.as_deref(), Some(PORTRAIT));

        c.clear_image().unwrap();
        assert!(c.session().unwrap().image.is_none());
    }

    #[test]
    fn test_empty_image_result_keeps_portrait() {
        let mut c = controller();
        c.start_create();
        c.attach_image(PORTRAIT).unwrap();
        let ticket = c.begin_image().unwrap();

        assert!(!c.complete_image(ticket, Some(String::new())));
        assert_eq!(c.session().unwrap().image.as_deref(), Some(PORTRAIT));
    }

    #[test]
    fn test_view_exposes_session() {
        let mut c = controller();
        assert_eq!(c.view(), &ViewState::List);

        let id = c.start_create().unwrap();
        match c.view() {
            ViewState::Sheet(session) => assert_eq!(session.character().id, id),
            ViewState::List => panic!("expected an open sheet"),
        }
    }

    #[test]
    fn test_stale_image_is_discarded() {
        let mut c = controller();
        c.start_create();
        let ticket = c.begin_image().unwrap();
        assert!(c.cancel_edit());
        c.start_create();

        assert!(!c.complete_image(ticket, Some(PORTRAIT.into())));
        assert!(c.session().unwrap().image.is_none());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let mut c = controller_with(MemoryStore::with_quota(64), ScriptedPrompter::default());
        c.start_create();
        c.update_field(BasicField::Name, "Aria").unwrap();

        assert!(c.save().is_ok());
        assert!(!c.is_synced());
        assert_eq!(c.characters().len(), 1);
        assert_eq!(c.view_mode(), ViewMode::List);
        assert!(c.store().load().is_empty());
    }

    #[test]
    fn test_corrupt_storage_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "[{\"id\":").unwrap();
        let c = controller_with(store, ScriptedPrompter::default());
        assert!(c.characters().is_empty());
        assert_eq!(c.view_mode(), ViewMode::List);
    }

    #[test]
    fn test_new_ids_avoid_existing() {
        let far_future = (platform::now_ms() + 1_000_000).to_string();
        let store = seeded(&[named(&far_future, "Aria")]);
        let mut c = controller_with(store, ScriptedPrompter::default());
        c.last_id = far_future.parse::<u64>().unwrap() - 1;

        let id = c.start_create().unwrap();
        assert_ne!(id.as_str(), far_future);
    }

    #[test]
    fn test_list_entries() {
        let with_image = named("2", "Bram")
            .with_field(BasicField::Age, "17")
            .with_image(Some(PORTRAIT.into()));
        let store = seeded(&[Character::empty(CharacterId::new("1")), with_image]);
        let c = controller_with(store, ScriptedPrompter::default());

        let entries = c.list_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].display_name, "(unnamed)");
        assert!(!entries[0].has_image);
        assert_eq!(entries[1].display_name, "Bram");
        assert_eq!(entries[1].summary, "age:17");
        assert!(entries[1].has_image);
    }

    proptest! {
        #[test]
        fn prop_saves_grow_collection(names in prop::collection::hash_set("[a-z]{1,10}", 0..12)) {
            let mut c = controller();
            for name in &names {
                c.start_create().unwrap();
                c.update_field(BasicField::Name, name.as_str()).unwrap();
                c.save().unwrap();
            }

            prop_assert_eq!(c.characters().len(), names.len());
            prop_assert!(c.characters().iter().all(|ch| ch.properties.len() == PROPERTY_SLOTS));

            let mut ids: Vec<_> = c.characters().iter().map(|ch| ch.id.clone()).collect();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), names.len());
            prop_assert_eq!(c.store().load(), c.characters().to_vec());
        }
    }
}
