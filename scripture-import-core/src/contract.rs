//! # contract: Universal interface for record persistence
//!
//! This module defines a single trait ([`RecordWriter`]) and the plain data
//! types it exchanges: a [`Document`] (field name → [`FieldValue`]) written
//! into a named collection, and the [`DocumentRef`] the store hands back.
//!
//! ## Interface & Extensibility
//! - Implement [`RecordWriter`] to add a destination (remote document store, local file, memory).
//! - The only operation is create: records are write-once, nothing is read back or updated.
//! - Errors are boxed trait objects so every backend can surface its own failure type.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests get a `MockRecordWriter`
//!   (exported under the default `test-export-mocks` feature).

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use mockall::automock;

/// Boxed error returned by writer implementations.
pub type WriteError = Box<dyn std::error::Error + Send + Sync>;

/// Opaque, stable reference to a written document.
///
/// The content is whatever the store uses to address a document (a full
/// resource name for Firestore, `collection/id` for local stores). Children
/// store it verbatim as their ancestor link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef(String);

impl DocumentRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field value: either a scalar or a link to another document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    /// An absent value; written for positions the lenient policy could not parse.
    Null,
    Reference(DocumentRef),
}

impl FieldValue {
    /// Plain JSON rendering used by local stores and previews.
    ///
    /// References become `{"$ref": "<path>"}` so they stay distinguishable from strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Reference(r) => serde_json::json!({ "$ref": r.as_str() }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(i: Option<i64>) -> Self {
        i.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

impl From<&DocumentRef> for FieldValue {
    fn from(r: &DocumentRef) -> Self {
        FieldValue::Reference(r.clone())
    }
}

/// A record ready to be written: field names mapped to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convenience accessor for tests and reports.
    pub fn reference(&self, name: &str) -> Option<&DocumentRef> {
        match self.fields.get(name) {
            Some(FieldValue::Reference(r)) => Some(r),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Trait for persisting records into named collections.
/// The implementor is responsible for connecting to a backing store.
///
/// Implementations must return a reference that stays valid for the
/// lifetime of the import so later writes can link to it. The importer
/// never issues concurrent writes, so no ordering beyond program order is
/// required.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Create a new document in `collection` and return its reference.
    async fn create_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<DocumentRef, WriteError>;
}
