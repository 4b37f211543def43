//! Note and group models plus their document field mapping.
//!
//! Field names are fixed by the existing store schema; the decoders are
//! lenient the same way the app always was (missing booleans read as
//! false, missing timestamps as now).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Document, FieldValue, Fields};

/// A user-owned named container of notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub update_at: Option<DateTime<Utc>>,
}

impl Group {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.field("name").as_str().unwrap_or_default().to_string(),
            update_at: doc.field("updateAt").as_timestamp(),
        }
    }

    /// Fields for a brand new group document.
    pub fn create_fields(name: &str, owner_id: &str, now: DateTime<Utc>) -> Fields {
        Fields::from([
            ("name".to_string(), FieldValue::str(name)),
            ("userID".to_string(), FieldValue::str(owner_id)),
            ("createdAt".to_string(), FieldValue::Timestamp(now)),
            ("updateAt".to_string(), FieldValue::Timestamp(now)),
        ])
    }
}

/// A titled text + optional-image record belonging to exactly one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub pinned: bool,
    pub locked: bool,
    pub create_at: DateTime<Utc>,
    pub update_at: DateTime<Utc>,
}

impl Note {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            group_id: doc
                .field("groupId")
                .as_str()
                .unwrap_or_default()
                .to_string(),
            name: doc.field("name").as_str().unwrap_or_default().to_string(),
            content: doc
                .field("content")
                .as_str()
                .unwrap_or_default()
                .to_string(),
            image_url: doc.field("imageUrl").as_str().map(str::to_string),
            pinned: doc.field("pinned").as_bool().unwrap_or(false),
            locked: doc.field("locked").as_bool().unwrap_or(false),
            create_at: doc
                .field("createAt")
                .as_timestamp()
                .unwrap_or_else(Utc::now),
            update_at: doc
                .field("updateAt")
                .as_timestamp()
                .unwrap_or_else(Utc::now),
        }
    }

    /// Fields for a brand new note document. New notes are never pinned
    /// or locked.
    pub fn create_fields(
        group_id: &str,
        title: &str,
        content: &str,
        image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Fields {
        Fields::from([
            ("name".to_string(), FieldValue::str(title)),
            ("content".to_string(), FieldValue::str(content)),
            (
                "imageUrl".to_string(),
                image_url.map_or(FieldValue::Null, FieldValue::str),
            ),
            ("groupId".to_string(), FieldValue::str(group_id)),
            ("createAt".to_string(), FieldValue::Timestamp(now)),
            ("updateAt".to_string(), FieldValue::Timestamp(now)),
            ("pinned".to_string(), FieldValue::Bool(false)),
            ("locked".to_string(), FieldValue::Bool(false)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: Fields) -> Document {
        Document {
            id: "n1".to_string(),
            fields,
            update_time: None,
        }
    }

    #[test]
    fn note_decoding_defaults_missing_flags_to_false() {
        let note = Note::from_document(&doc(Fields::from([
            ("name".to_string(), FieldValue::str("title")),
            ("content".to_string(), FieldValue::str("body")),
            ("groupId".to_string(), FieldValue::str("g1")),
        ])));

        assert_eq!(note.name, "title");
        assert_eq!(note.group_id, "g1");
        assert!(!note.pinned);
        assert!(!note.locked);
        assert_eq!(note.image_url, None);
    }

    #[test]
    fn new_note_fields_carry_null_image_when_absent() {
        let now = Utc::now();
        let fields = Note::create_fields("g1", "t", "c", None, now);
        assert_eq!(fields.get("imageUrl"), Some(&FieldValue::Null));
        assert_eq!(fields.get("pinned"), Some(&FieldValue::Bool(false)));
        assert_eq!(fields.get("locked"), Some(&FieldValue::Bool(false)));
    }
}
