use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{DocumentFields, DocumentStore, StoreError};

/// In-memory queue collection.
///
/// Nothing watches it, so creating a document does not fire a trigger; the
/// queue API invokes the dispatcher itself when this backend is in use.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: DashMap<String, DocumentFields>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&self, id: impl Into<String>, fields: DocumentFields) {
        self.documents.insert(id.into(), fields);
    }

    /// Current fields of a document
    pub fn snapshot(&self, id: &str) -> Option<DocumentFields> {
        self.documents.get(id).map(|doc| doc.value().clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        match self.documents.entry(id.to_string()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(fields);
                Ok(())
            }
        }
    }

    async fn update(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        let mut doc = self
            .documents
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.extend(fields);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<DocumentFields>, StoreError> {
        Ok(self.snapshot(id))
    }

    fn emits_create_events(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
