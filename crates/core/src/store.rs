//! Document store seam: the typed contract the action layer consumes and
//! the transport crate implements.
//!
//! The store is a black box offering equality/ordering/limit queries with
//! opaque pagination cursors, plus document CRUD. Field values cross this
//! boundary as [`FieldValue`]; the wire encoding never leaks past it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;

/// Remote collection holding note groups.
pub const GROUPS_COLLECTION: &str = "noteGroups";
/// Remote collection holding notes.
pub const NOTES_COLLECTION: &str = "notes";
/// Remote collection holding subscriptions.
pub const SUBSCRIPTIONS_COLLECTION: &str = "subscriptions";

/// A typed document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Double(f64),
    Null,
}

impl FieldValue {
    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }
}

/// Named fields of a document. Ordered map so payloads serialize stably.
pub type Fields = BTreeMap<String, FieldValue>;

/// A document returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Server-assigned identifier (last path segment of the resource name).
    pub id: String,
    pub fields: Fields,
    pub update_time: Option<DateTime<Utc>>,
}

impl Document {
    /// Field lookup returning `Null` for absent fields.
    pub fn field(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&FieldValue::Null)
    }
}

/// Opaque pagination resume token.
///
/// Produced by the store alongside a page; handed back verbatim on the
/// next page request. The cache treats it as a value, never inspects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor(serde_json::Value);

impl Cursor {
    pub fn new(raw: serde_json::Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Sort direction for an ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An ordering clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// An equality filter. The store only needs equality for this client.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: FieldValue,
}

/// A structured query against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u32>,
    pub start_after: Option<Cursor>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, equals: FieldValue) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            equals,
        });
        self
    }

    pub fn order_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction: Direction::Descending,
        });
        self
    }

    pub fn order_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction: Direction::Ascending,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Cursor) -> Self {
        self.start_after = Some(cursor);
        self
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub documents: Vec<Document>,
    /// Resume point for the following page; `None` when the page was empty.
    pub next_cursor: Option<Cursor>,
}

/// The remote document store contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a structured query against a collection.
    async fn query(&self, collection: &str, query: Query) -> Result<Page>;

    /// Create a document; returns the server-assigned id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Partially update a document. Only fields named in `mask` are written.
    async fn patch(&self, collection: &str, id: &str, fields: Fields, mask: &[&str])
        -> Result<()>;

    /// Delete a document.
    async fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// Fetch a single document, `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;
}
