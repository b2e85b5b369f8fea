// Core note types shared by the session controller and the CLI.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Name a note carries until a user or the auto-namer gives it a real one.
pub const DEFAULT_UNNAMED_NAME: &str = "New Note";

/// Folder notes live in unless a session is configured otherwise.
pub const DEFAULT_FOLDER: &str = "notes";

/// Named boolean flags stored with every note.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DocumentProperties {
    pub bookmarked: bool,
    pub starred: bool,
    /// Whether the note is offered to the AI library.
    #[serde(rename = "inAILibrary", alias = "includedInLibrary")]
    pub in_library: bool,
}

impl DocumentProperties {
    pub fn get(&self, property: Property) -> bool {
        match property {
            Property::Bookmarked => self.bookmarked,
            Property::Starred => self.starred,
            Property::InLibrary => self.in_library,
        }
    }

    pub fn set(&mut self, property: Property, value: bool) {
        match property {
            Property::Bookmarked => self.bookmarked = value,
            Property::Starred => self.starred = value,
            Property::InLibrary => self.in_library = value,
        }
    }
}

/// Selector for one of the [`DocumentProperties`] flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Bookmarked,
    Starred,
    InLibrary,
}

impl Property {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bookmarked => "bookmarked",
            Self::Starred => "starred",
            Self::InLibrary => "in_library",
        }
    }
}

/// The persistable part of a note: what a create or update sends and what
/// the server is known to hold after a successful write.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentPayload {
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: DocumentProperties,
}

/// A single note as held by an open session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRecord {
    /// Server-assigned id; empty until the first successful create.
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub properties: DocumentProperties,
    pub folder: String,
}

impl DocumentRecord {
    /// An unsaved, empty note in `folder` carrying the unnamed sentinel.
    pub fn blank(folder: impl Into<String>, unnamed_name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: unnamed_name.into(),
            content: String::new(),
            tags: BTreeSet::new(),
            properties: DocumentProperties::default(),
            folder: folder.into(),
        }
    }

    /// True once the server has assigned an id.
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn payload(&self) -> DocumentPayload {
        DocumentPayload {
            name: self.name.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            properties: self.properties,
        }
    }

    /// Overwrite the persistable fields, keeping id and folder.
    pub fn apply_payload(&mut self, payload: DocumentPayload) {
        self.name = payload.name;
        self.content = payload.content;
        self.tags = payload.tags;
        self.properties = payload.properties;
    }

    /// Number of characters in the body (not bytes).
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_record_is_unpersisted_and_unnamed() {
        let record = DocumentRecord::blank(DEFAULT_FOLDER, DEFAULT_UNNAMED_NAME);
        assert!(!record.is_persisted());
        assert_eq!(record.name, "New Note");
        assert_eq!(record.folder, "notes");
        assert!(record.content.is_empty());
        assert!(record.tags.is_empty());
        assert_eq!(record.properties, DocumentProperties::default());
    }

    #[test]
    fn payload_round_trips_through_record() {
        let mut record = DocumentRecord::blank("notes", "New Note");
        record.id = "42".into();
        let mut payload = record.payload();
        payload.name = "Groceries".into();
        payload.content = "milk".into();
        payload.tags.insert("home".into());
        payload.properties.starred = true;

        record.apply_payload(payload.clone());
        assert_eq!(record.id, "42");
        assert_eq!(record.payload(), payload);
    }

    #[test]
    fn content_len_counts_chars() {
        let mut record = DocumentRecord::blank("notes", "New Note");
        record.content = "caf\u{e9}".into();
        assert_eq!(record.content_len(), 4);
        assert_eq!(record.content.len(), 5);
    }

    #[test]
    fn property_accessors_cover_every_flag() {
        let mut properties = DocumentProperties::default();
        for property in [Property::Bookmarked, Property::Starred, Property::InLibrary] {
            assert!(!properties.get(property));
            properties.set(property, true);
            assert!(properties.get(property));
        }
    }

    #[test]
    fn properties_use_wire_names() {
        let properties = DocumentProperties { bookmarked: true, starred: false, in_library: true };
        let json = serde_json::to_value(properties).unwrap();
        assert_eq!(json["inAILibrary"], true);
        assert_eq!(json["bookmarked"], true);

        let parsed: DocumentProperties =
            serde_json::from_str(r#"{"includedInLibrary": true}"#).unwrap();
        assert!(parsed.in_library);
        assert!(!parsed.starred);
    }
}
