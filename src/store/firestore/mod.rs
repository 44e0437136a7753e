//! Firestore REST v1 document store.

mod value;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{FirebaseApp, StaticTokenProvider, TokenProvider, EMULATOR_TOKEN};
use crate::config::FirestoreConfig;
use crate::http::read_error_body;
use crate::metrics::StoreMetrics;

use super::{validate_document_id, DocumentFields, DocumentStore, StoreError};

pub use value::{decode_fields, decode_value, encode_fields, encode_value};

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Quote a field name for use in a field path unless it is a plain
/// identifier.
fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

/// Documents of one collection, accessed over the Firestore REST API.
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    database_path: String,
    collection: String,
    token_provider: Arc<dyn TokenProvider>,
}

impl FirestoreStore {
    pub fn new(
        endpoint: &str,
        project_id: &str,
        config: &FirestoreConfig,
        token_provider: Arc<dyn TokenProvider>,
        client: reqwest::Client,
    ) -> Self {
        let database_path = format!("projects/{}/databases/{}", project_id, config.database);
        let documents_url = format!(
            "{}/v1/{}/documents",
            endpoint.trim_end_matches('/'),
            database_path
        );

        Self {
            client,
            documents_url,
            database_path,
            collection: config.collection.clone(),
            token_provider,
        }
    }

    /// Build against production Firestore with the app's credentials, or
    /// against the emulator when one is configured.
    pub fn from_app(app: &FirebaseApp, config: &FirestoreConfig, client: reqwest::Client) -> Self {
        match config.emulator_host {
            Some(ref host) => Self::new(
                &format!("http://{}", host),
                &app.project_id,
                config,
                Arc::new(StaticTokenProvider::new(EMULATOR_TOKEN)),
                client,
            ),
            None => Self::new(
                &config.endpoint,
                &app.project_id,
                config,
                app.token_provider.clone(),
                client,
            ),
        }
    }

    pub fn documents_url(&self) -> &str {
        &self.documents_url
    }

    /// Full resource name, as it appears in event payloads
    pub fn document_name(&self, id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path, self.collection, id)
    }

    fn collection_url(&self) -> Result<Url, StoreError> {
        let mut url =
            Url::parse(&self.documents_url).map_err(|e| StoreError::Endpoint(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Endpoint(self.documents_url.clone()))?
            .push(&self.collection);
        Ok(url)
    }

    /// URL of one document; the ID is percent-encoded as a single segment.
    fn document_url(&self, id: &str) -> Result<Url, StoreError> {
        validate_document_id(id)?;
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Endpoint(self.documents_url.clone()))?
            .push(id);
        Ok(url)
    }

    async fn backend_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = read_error_body(response).await;
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);

        StoreError::Backend { status, message }
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, StoreError>>,
    {
        let started = Instant::now();
        let result = fut.await;
        StoreMetrics::observe(operation, started.elapsed());
        if result.is_err() {
            StoreMetrics::record_error(operation);
        }
        result
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[tracing::instrument(name = "firestore.create", skip(self, fields))]
    async fn create(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        self.timed("create", async {
            validate_document_id(id)?;
            let url = self.collection_url()?;
            let token = self.token_provider.access_token().await?;
            let response = self
                .client
                .post(url)
                .query(&[("documentId", id)])
                .bearer_auth(token)
                .json(&json!({ "fields": encode_fields(&fields) }))
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else if status == StatusCode::CONFLICT {
                Err(StoreError::AlreadyExists(self.document_name(id)))
            } else {
                Err(Self::backend_error(response).await)
            }
        })
        .await
    }

    #[tracing::instrument(name = "firestore.update", skip(self, fields))]
    async fn update(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        self.timed("update", async {
            let url = self.document_url(id)?;
            let token = self.token_provider.access_token().await?;

            // Only the masked fields are written; the document must exist.
            let mut query: Vec<(&str, String)> = fields
                .keys()
                .map(|name| ("updateMask.fieldPaths", field_path(name)))
                .collect();
            query.push(("currentDocument.exists", "true".to_string()));

            let response = self
                .client
                .patch(url)
                .query(&query)
                .bearer_auth(token)
                .json(&json!({ "fields": encode_fields(&fields) }))
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else if status == StatusCode::NOT_FOUND {
                Err(StoreError::NotFound(self.document_name(id)))
            } else {
                Err(Self::backend_error(response).await)
            }
        })
        .await
    }

    #[tracing::instrument(name = "firestore.get", skip(self))]
    async fn get(&self, id: &str) -> Result<Option<DocumentFields>, StoreError> {
        self.timed("get", async {
            let url = self.document_url(id)?;
            let token = self.token_provider.access_token().await?;
            let response = self
                .client
                .get(url)
                .bearer_auth(token)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let document: FirestoreDocument = response.json().await?;
                decode_fields(&document.fields).map(Some)
            } else if status == StatusCode::NOT_FOUND {
                Ok(None)
            } else {
                Err(Self::backend_error(response).await)
            }
        })
        .await
    }

    fn emits_create_events(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "firestore"
    }
}
