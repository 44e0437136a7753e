//! Document store abstraction over the queue collection.
//!
//! - `FirestoreStore`: Firestore REST API (or the local emulator)
//! - `MemoryDocumentStore`: in-process map, for local development and tests
//!
//! Use `create_document_store()` to pick the backend from configuration.

mod firestore;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::{AuthError, FirebaseApp};
use crate::config::Settings;

pub use firestore::{decode_fields, decode_value, encode_fields, encode_value, FirestoreStore};
pub use memory::MemoryDocumentStore;

/// Top-level fields of a document, as plain JSON
pub type DocumentFields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No document to update: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Document store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Document store returned {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Invalid document: {0}")]
    Codec(String),

    #[error("Invalid document ID: {0:?}")]
    InvalidId(String),

    #[error("Invalid document store endpoint: {0}")]
    Endpoint(String),
}

/// Reject IDs that cannot name a single document of the collection.
pub fn validate_document_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id == "." || id == ".." || id.contains('/') {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Access to documents of the monitored queue collection, addressed by ID.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document; fails if the ID is taken.
    async fn create(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError>;

    /// Merge `fields` into an existing document, leaving every other field
    /// untouched. Fails with [`StoreError::NotFound`] if there is no document.
    async fn update(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<DocumentFields>, StoreError>;

    /// Whether creating a document makes the hosting platform fire the
    /// creation trigger on its own.
    fn emits_create_events(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Create the document store selected by `store.backend`.
pub fn create_document_store(
    settings: &Settings,
    app: &FirebaseApp,
    client: reqwest::Client,
) -> Arc<dyn DocumentStore> {
    if settings.is_memory_store() {
        tracing::info!(backend = "memory", "Creating memory document store");
        return Arc::new(MemoryDocumentStore::new());
    }

    let store = FirestoreStore::from_app(app, &settings.firestore, client);
    tracing::info!(
        backend = "firestore",
        documents_url = %store.documents_url(),
        collection = %settings.firestore.collection,
        "Creating Firestore document store"
    );
    Arc::new(store)
}
