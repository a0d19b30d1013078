//! Character records and their property slots
//!
//! Values here are treated as immutable: every edit returns a new
//! `Character`, so a session copy never shares state with the collection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::consts::PROPERTY_SLOTS;

/// Opaque record identifier, persisted as a plain string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CharacterId(String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for CharacterId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One of the eight trait slots on a character
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Property {
    pub name: String,
    pub look: String,
    pub genre: String,
    pub strength: String,
    pub notes: String,
    /// Slot is disabled until repaired
    pub broken: bool,
}

/// A managed character record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: CharacterId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub appearance: String,
    /// Data URI of the portrait; an empty string on disk reads as absent
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    #[serde(default)]
    pub power_recovery: String,
    pub properties: [Property; PROPERTY_SLOTS],
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

impl Character {
    /// Blank template with the given id and eight empty properties
    pub fn empty(id: CharacterId) -> Self {
        Self {
            id,
            name: String::new(),
            gender: String::new(),
            age: String::new(),
            capacity: String::new(),
            appearance: String::new(),
            image: None,
            power_recovery: String::new(),
            properties: Default::default(),
        }
    }

    /// Name shown in lists
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "(unnamed)"
        } else {
            &self.name
        }
    }

    /// One-line "gender:.. age:.. capacity:.." summary, skipping empty parts
    pub fn summary(&self) -> String {
        [
            ("gender", &self.gender),
            ("age", &self.age),
            ("capacity", &self.capacity),
        ]
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| format!("{label}:{value}"))
        .collect::<Vec<_>>()
        .join(" ")
    }

    pub fn field(&self, field: BasicField) -> &str {
        match field {
            BasicField::Name => &self.name,
            BasicField::Gender => &self.gender,
            BasicField::Age => &self.age,
            BasicField::Capacity => &self.capacity,
            BasicField::Appearance => &self.appearance,
            BasicField::PowerRecovery => &self.power_recovery,
        }
    }

    /// Copy with one basic field replaced
    pub fn with_field(&self, field: BasicField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            BasicField::Name => next.name = value,
            BasicField::Gender => next.gender = value,
            BasicField::Age => next.age = value,
            BasicField::Capacity => next.capacity = value,
            BasicField::Appearance => next.appearance = value,
            BasicField::PowerRecovery => next.power_recovery = value,
        }
        next
    }

    /// Copy with one field of property `index` replaced.
    ///
    /// Returns `None` when `index` is not a valid slot.
    pub fn with_property(&self, index: usize, edit: PropertyEdit) -> Option<Self> {
        if index >= PROPERTY_SLOTS {
            return None;
        }
        let mut next = self.clone();
        let slot = &mut next.properties[index];
        match edit {
            PropertyEdit::Text(field, value) => match field {
                PropertyField::Name => slot.name = value,
                PropertyField::Look => slot.look = value,
                PropertyField::Genre => slot.genre = value,
                PropertyField::Strength => slot.strength = value,
                PropertyField::Notes => slot.notes = value,
            },
            PropertyEdit::Broken(broken) => slot.broken = broken,
        }
        Some(next)
    }

    /// Copy with the portrait replaced (or removed)
    pub fn with_image(&self, image: Option<String>) -> Self {
        Self {
            image: image.filter(|s| !s.is_empty()),
            ..self.clone()
        }
    }
}

/// Error when a field name does not match any known field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldParseError {
    #[error("Unknown character field: {0}")]
    UnknownField(String),
    #[error("Unknown property field: {0}")]
    UnknownPropertyField(String),
    #[error("Invalid value for broken: {0} (expected true/false)")]
    InvalidFlag(String),
}

/// Free-text fields on a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicField {
    Name,
    Gender,
    Age,
    Capacity,
    Appearance,
    PowerRecovery,
}

impl BasicField {
    pub const ALL: [BasicField; 6] = [
        BasicField::Name,
        BasicField::Gender,
        BasicField::Age,
        BasicField::Capacity,
        BasicField::Appearance,
        BasicField::PowerRecovery,
    ];

    /// Persisted field name
    pub fn as_str(&self) -> &'static str {
        match self {
            BasicField::Name => "name",
            BasicField::Gender => "gender",
            BasicField::Age => "age",
            BasicField::Capacity => "capacity",
            BasicField::Appearance => "appearance",
            BasicField::PowerRecovery => "powerRecovery",
        }
    }
}

impl FromStr for BasicField {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BasicField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FieldParseError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for BasicField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-text fields on a property slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyField {
    Name,
    Look,
    Genre,
    Strength,
    Notes,
}

impl PropertyField {
    pub const ALL: [PropertyField; 5] = [
        PropertyField::Name,
        PropertyField::Look,
        PropertyField::Genre,
        PropertyField::Strength,
        PropertyField::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyField::Name => "name",
            PropertyField::Look => "look",
            PropertyField::Genre => "genre",
            PropertyField::Strength => "strength",
            PropertyField::Notes => "notes",
        }
    }
}

impl FromStr for PropertyField {
    type Err = FieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| FieldParseError::UnknownPropertyField(s.to_string()))
    }
}

/// A single change to one property slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyEdit {
    Text(PropertyField, String),
    Broken(bool),
}

impl PropertyEdit {
    /// Build an edit from a field name and raw input text
    pub fn parse(field: &str, raw: &str) -> Result<Self, FieldParseError> {
        if field.eq_ignore_ascii_case("broken") {
            let flag = match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => true,
                "false" | "no" | "n" | "0" | "off" => false,
                _ => return Err(FieldParseError::InvalidFlag(raw.to_string())),
            };
            return Ok(PropertyEdit::Broken(flag));
        }
        let field = field.parse::<PropertyField>()?;
        Ok(PropertyEdit::Text(field, raw.to_string()))
    }
}
