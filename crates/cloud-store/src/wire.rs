//! Tagged wire values for the document store REST surface.
//!
//! The store encodes every field as a single-key object naming its type
//! (`{"stringValue": "x"}`). This module owns the mapping between that
//! shape and the typed [`FieldValue`] used everywhere else; nothing past
//! the gateway sees the wire encoding.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::debug;
use notewell_core::store::{Document, FieldValue, Fields};
use serde::{Deserialize, Serialize};

/// One discriminated wire value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    StringValue(String),
    BooleanValue(bool),
    TimestampValue(DateTime<Utc>),
    DoubleValue(f64),
    NullValue(Option<()>),
    /// Full resource path of another document; only used in cursors.
    ReferenceValue(String),
}

impl From<&FieldValue> for WireValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Str(s) => WireValue::StringValue(s.clone()),
            FieldValue::Bool(b) => WireValue::BooleanValue(*b),
            FieldValue::Timestamp(ts) => WireValue::TimestampValue(*ts),
            FieldValue::Double(d) => WireValue::DoubleValue(*d),
            FieldValue::Null => WireValue::NullValue(None),
        }
    }
}

impl From<WireValue> for FieldValue {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::StringValue(s) => FieldValue::Str(s),
            WireValue::BooleanValue(b) => FieldValue::Bool(b),
            WireValue::TimestampValue(ts) => FieldValue::Timestamp(ts),
            WireValue::DoubleValue(d) => FieldValue::Double(d),
            WireValue::NullValue(_) => FieldValue::Null,
            WireValue::ReferenceValue(path) => FieldValue::Str(path),
        }
    }
}

/// Encode typed fields into the wire `fields` map.
pub fn encode_fields(fields: &Fields) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                serde_json::to_value(WireValue::from(value)).unwrap_or(serde_json::Value::Null),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}

/// A document as returned by the REST surface.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawDocument {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "updateTime")]
    pub update_time: Option<DateTime<Utc>>,
}

impl RawDocument {
    /// Server-assigned id: the last path segment of the resource name.
    pub fn doc_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// The still-encoded wire value of one field, for cursor building.
    pub fn wire_field(&self, field: &str) -> Option<WireValue> {
        let raw = self.fields.get(field)?.clone();
        serde_json::from_value(raw).ok()
    }

    /// Decode into the typed document. Fields with an unsupported wire
    /// type are skipped rather than failing the whole document.
    pub fn to_document(&self) -> Document {
        let mut fields = Fields::new();
        for (name, raw) in &self.fields {
            match serde_json::from_value::<WireValue>(raw.clone()) {
                Ok(value) => {
                    fields.insert(name.clone(), FieldValue::from(value));
                }
                Err(err) => {
                    debug!("skipping field {name} with unsupported wire type: {err}");
                }
            }
        }
        Document {
            id: self.doc_id().to_string(),
            fields,
            update_time: self.update_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wire_values_serialize_to_single_key_objects() {
        let encoded = serde_json::to_value(WireValue::StringValue("hello".to_string())).unwrap();
        assert_eq!(encoded, serde_json::json!({"stringValue": "hello"}));

        let encoded = serde_json::to_value(WireValue::BooleanValue(true)).unwrap();
        assert_eq!(encoded, serde_json::json!({"booleanValue": true}));

        let encoded = serde_json::to_value(WireValue::NullValue(None)).unwrap();
        assert_eq!(encoded, serde_json::json!({"nullValue": null}));
    }

    #[test]
    fn encode_decode_round_trips_typed_fields() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).single().unwrap();
        let fields = Fields::from([
            ("name".to_string(), FieldValue::str("title")),
            ("pinned".to_string(), FieldValue::Bool(false)),
            ("updateAt".to_string(), FieldValue::Timestamp(ts)),
            ("amount".to_string(), FieldValue::Double(9.5)),
            ("imageUrl".to_string(), FieldValue::Null),
        ]);

        let encoded = encode_fields(&fields);
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/notes/abc".to_string(),
            fields: serde_json::from_value(encoded).unwrap(),
            update_time: None,
        };
        let doc = raw.to_document();

        assert_eq!(doc.id, "abc");
        assert_eq!(doc.fields, fields);
    }

    #[test]
    fn unsupported_field_types_are_skipped() {
        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/notes/n1".to_string(),
            fields: BTreeMap::from([
                (
                    "name".to_string(),
                    serde_json::json!({"stringValue": "kept"}),
                ),
                (
                    "retries".to_string(),
                    serde_json::json!({"integerValue": "3"}),
                ),
            ]),
            update_time: None,
        };

        let doc = raw.to_document();
        assert_eq!(doc.fields.len(), 1);
        assert_eq!(doc.field("name"), &FieldValue::str("kept"));
    }
}
