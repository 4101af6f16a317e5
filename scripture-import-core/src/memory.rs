//! In-memory [`RecordWriter`] used for dry runs and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{Document, DocumentRef, RecordWriter, WriteError};

/// A written document as kept by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub collection: String,
    pub reference: DocumentRef,
    pub document: Document,
}

/// Keeps every written document in insertion order, with client-generated ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<Vec<StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn all(&self) -> Vec<StoredDocument> {
        self.lock().clone()
    }

    /// Documents of one collection, in write order.
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.lock()
            .iter()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock().iter().filter(|d| d.collection == collection).count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredDocument>> {
        // Recover the data after a poisoning panic.
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RecordWriter for MemoryStore {
    async fn create_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<DocumentRef, WriteError> {
        let reference = DocumentRef::new(format!("{collection}/{}", Uuid::new_v4().simple()));
        self.lock().push(StoredDocument {
            collection: collection.to_string(),
            reference: reference.clone(),
            document,
        });
        Ok(reference)
    }
}
