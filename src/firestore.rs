#![doc = "Firestore writer: implements the core RecordWriter contract against the Firestore REST API."]
//
//! # Firestore Integration (CLI <-> Core)
//!
//! [`FirestoreClient`] creates one document per record with
//! `POST /v1/projects/{project}/databases/{database}/documents/{collection}`
//! and returns the server-assigned document name as the [`DocumentRef`].
//! Ancestor links are sent as `referenceValue`s holding those names.
//!
//! ## Client Usage
//!
//! - `GOOGLE_APPLICATION_CREDENTIALS`: path to the service-account JSON. Its key signs the
//!   OAuth tokens for the production endpoint, and its `project_id` is used unless the config
//!   sets one.
//! - `FIRESTORE_ACCESS_TOKEN`: a ready-made bearer token, used instead of the service account
//!   (e.g. `gcloud auth application-default print-access-token`).
//! - `FIRESTORE_EMULATOR_HOST`: when set, requests go to `http://<host>` with the emulator's
//!   `owner` token and no other credentials are needed.

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use scripture_import_core::contract::{Document, DocumentRef, FieldValue, RecordWriter, WriteError};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use crate::load_config::FirestoreSection;

const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com";
const DEFAULT_DATABASE: &str = "(default)";
const EMULATOR_TOKEN: &str = "owner";
const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// How requests are authorised.
pub enum Credentials {
    /// Fixed bearer token: the emulator's, or `FIRESTORE_ACCESS_TOKEN`.
    Token(String),
    /// Tokens minted from a service-account key file.
    ServiceAccount(ServiceAccountTokens),
}

impl Credentials {
    async fn bearer(&self) -> Result<String, WriteError> {
        match self {
            Credentials::Token(token) => Ok(token.clone()),
            Credentials::ServiceAccount(tokens) => tokens.token().await,
        }
    }
}

/// Service-account token source. The key is loaded on the first request;
/// `gcp_auth` caches the token and refreshes it before expiry.
pub struct ServiceAccountTokens {
    path: PathBuf,
    account: OnceCell<CustomServiceAccount>,
}

impl ServiceAccountTokens {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            account: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn token(&self) -> Result<String, WriteError> {
        let account = self
            .account
            .get_or_try_init(|| async {
                CustomServiceAccount::from_file(&self.path).map_err(|e| {
                    tracing::error!(error = %e, path = %self.path.display(), "Failed to load service account key");
                    e
                })
            })
            .await?;
        let token = account.token(&[DATASTORE_SCOPE]).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to obtain access token for service account");
            e
        })?;
        Ok(token.as_str().to_string())
    }
}

pub struct FirestoreClient {
    http: reqwest::Client,
    base_url: String,
    project_id: String,
    database: String,
    credentials: Credentials,
}

#[derive(Deserialize)]
struct ServiceAccount {
    project_id: String,
}

#[derive(Deserialize)]
struct CreatedDocument {
    name: String,
}

/// Reads `project_id` from a service-account credentials file.
pub fn read_project_id(path: &Path) -> Result<String, WriteError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!(error = ?e, path = %path.display(), "Failed to read credentials file");
        e
    })?;
    let account: ServiceAccount = serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(error = ?e, path = %path.display(), "Credentials file has no project_id");
        e
    })?;
    Ok(account.project_id)
}

/// Firestore REST encoding of a single value.
pub fn encode_value(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::String(s) => serde_json::json!({ "stringValue": s }),
        // Firestore carries 64-bit integers as decimal strings.
        FieldValue::Integer(i) => serde_json::json!({ "integerValue": i.to_string() }),
        FieldValue::Null => serde_json::json!({ "nullValue": null }),
        FieldValue::Reference(r) => serde_json::json!({ "referenceValue": r.as_str() }),
    }
}

/// Request body for creating `document`.
pub fn encode_document(document: &Document) -> serde_json::Value {
    let fields: serde_json::Map<String, serde_json::Value> = document
        .fields()
        .map(|(name, value)| (name.to_string(), encode_value(value)))
        .collect();
    serde_json::json!({ "fields": fields })
}

impl FirestoreClient {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        database: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            database: database.into(),
            credentials,
        }
    }

    /// Builds a client from the environment variables listed in the module docs.
    ///
    /// Precedence for authorisation: emulator, then `FIRESTORE_ACCESS_TOKEN`,
    /// then the service-account key.
    pub fn new_from_env(section: &FirestoreSection) -> Result<Self, WriteError> {
        let key_file = env::var("GOOGLE_APPLICATION_CREDENTIALS").ok().map(PathBuf::from);

        let project_id = match (&section.project_id, &key_file) {
            (Some(id), _) => id.clone(),
            (None, Some(path)) => read_project_id(path)?,
            (None, None) => {
                tracing::error!("GOOGLE_APPLICATION_CREDENTIALS missing in environment and no project_id configured");
                return Err("no Firestore project: set GOOGLE_APPLICATION_CREDENTIALS or store.project_id".into());
            }
        };
        let database = section
            .database
            .clone()
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let (base_url, credentials) = if let Ok(host) = env::var("FIRESTORE_EMULATOR_HOST") {
            tracing::info!(host = %host, "Using Firestore emulator");
            (format!("http://{host}"), Credentials::Token(EMULATOR_TOKEN.to_string()))
        } else if let Ok(token) = env::var("FIRESTORE_ACCESS_TOKEN") {
            tracing::info!("Using FIRESTORE_ACCESS_TOKEN");
            (PRODUCTION_BASE_URL.to_string(), Credentials::Token(token))
        } else if let Some(path) = key_file {
            tracing::info!(path = %path.display(), "Using service account credentials");
            (
                PRODUCTION_BASE_URL.to_string(),
                Credentials::ServiceAccount(ServiceAccountTokens::new(path)),
            )
        } else {
            tracing::error!("No Firestore credentials in environment");
            return Err("no Firestore credentials: set GOOGLE_APPLICATION_CREDENTIALS, FIRESTORE_ACCESS_TOKEN or FIRESTORE_EMULATOR_HOST".into());
        };

        tracing::info!(
            project_id = %project_id,
            database = %database,
            base_url = %base_url,
            "Initialized FirestoreClient from environment"
        );
        Ok(Self::new(base_url, project_id, database, credentials))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Endpoint that creates a document with a server-generated id in `collection`.
    pub fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.base_url, self.project_id, self.database, collection
        )
    }
}

#[async_trait]
impl RecordWriter for FirestoreClient {
    async fn create_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<DocumentRef, WriteError> {
        let url = self.collection_url(collection);
        tracing::debug!(url = %url, fields = document.len(), "Creating Firestore document");
        let token = self.credentials.bearer().await?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&encode_document(&document))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, url = %url, "Failed to reach Firestore");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, url = %url, "Firestore returned error. Response body: {body}");
            return Err(format!("Firestore returned {status} for {collection}: {body}").into());
        }

        let created: CreatedDocument = response.json().await?;
        Ok(DocumentRef::new(created.name))
    }
}
