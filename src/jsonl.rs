//! Local writer: one JSON line per record in `<output_dir>/<collection>.jsonl`.
//!
//! Ids are generated client-side, so references are `collection/<uuid>`
//! and appear in child lines as `{"$ref": "collection/<uuid>"}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use scripture_import_core::contract::{Document, DocumentRef, RecordWriter, WriteError};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

pub struct JsonlStore {
    output_dir: PathBuf,
}

impl JsonlStore {
    pub async fn new(output_dir: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).await.map_err(|e| {
            tracing::error!(error = ?e, path = %output_dir.display(), "Failed to create output directory");
            e
        })?;
        tracing::info!(path = %output_dir.display(), "Initialized JsonlStore");
        Ok(Self { output_dir })
    }

    pub fn collection_path(&self, collection: &str) -> PathBuf {
        self.output_dir.join(format!("{collection}.jsonl"))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl RecordWriter for JsonlStore {
    async fn create_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<DocumentRef, WriteError> {
        let id = Uuid::new_v4().simple().to_string();
        let mut line = document.to_json();
        if let Some(map) = line.as_object_mut() {
            map.insert("_id".to_string(), serde_json::Value::String(id.clone()));
        }
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');

        let path = self.collection_path(collection);
        let mut file = OpenOptions::new().create(true).append(true).open(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(DocumentRef::new(format!("{collection}/{id}")))
    }
}
