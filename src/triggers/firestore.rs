//! Firestore document-created events delivered as CloudEvents.
//!
//! Binary mode carries the attributes in `ce-*` headers and the
//! `DocumentEventData` as the JSON body; structured mode wraps both in one
//! `application/cloudevents+json` body.

use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::AppError;
use crate::store::{decode_fields, DocumentFields, StoreError};

/// Event type emitted when a document is created
pub const CREATED_EVENT_TYPE: &str = "google.cloud.firestore.document.v1.created";

const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Missing CloudEvent attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Unsupported event type: {0}")]
    UnsupportedEventType(String),

    #[error("Event carries no document")]
    MissingDocument,

    #[error("Document {0} is not in the monitored collection")]
    UnexpectedPath(String),

    #[error("Malformed event payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Malformed document: {0}")]
    Decode(#[from] StoreError),
}

impl From<TriggerError> for AppError {
    fn from(err: TriggerError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Firestore `DocumentEventData` (JSON encoding)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEventData {
    #[serde(default)]
    pub value: Option<EventDocument>,
    #[serde(default)]
    pub old_value: Option<EventDocument>,
    #[serde(default)]
    pub update_mask: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    pub name: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StructuredEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    document: Option<String>,
    data: DocumentEventData,
}

/// CloudEvent attributes the trigger cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttributes {
    pub id: String,
    pub event_type: String,
    pub source: Option<String>,
    /// Document path relative to the database root, when supplied
    pub document: Option<String>,
}

/// A validated document-created event
#[derive(Debug, Clone)]
pub struct DocumentCreated {
    pub event_id: String,
    pub notification_id: String,
    pub fields: DocumentFields,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn is_structured(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Split a CloudEvent request into attributes and event data.
pub fn read_event(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(EventAttributes, DocumentEventData), TriggerError> {
    if is_structured(headers) {
        let event: StructuredEvent = serde_json::from_slice(body)?;
        let document = event.document.or_else(|| {
            event
                .subject
                .as_deref()
                .and_then(|s| s.strip_prefix("documents/"))
                .map(str::to_string)
        });

        let attributes = EventAttributes {
            id: event.id,
            event_type: event.event_type,
            source: event.source,
            document,
        };
        return Ok((attributes, event.data));
    }

    let attributes = EventAttributes {
        id: header(headers, "ce-id").ok_or(TriggerError::MissingAttribute("ce-id"))?,
        event_type: header(headers, "ce-type").ok_or(TriggerError::MissingAttribute("ce-type"))?,
        source: header(headers, "ce-source"),
        document: header(headers, "ce-document"),
    };
    let data = serde_json::from_slice(body)?;

    Ok((attributes, data))
}

/// Extract the document ID from a `{collection}/{id}` path, rejecting
/// documents outside the collection (including subcollections).
pub fn notification_id_from_path(path: &str, collection: &str) -> Option<String> {
    let relative = match path.split_once("/documents/") {
        Some((_, rest)) => rest,
        None => path,
    };

    let (parent, id) = relative.split_once('/')?;
    if parent != collection || id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id.to_string())
}

/// Validate a creation event for `collection` and decode its document.
pub fn parse_created_event(
    attributes: EventAttributes,
    data: DocumentEventData,
    collection: &str,
) -> Result<DocumentCreated, TriggerError> {
    // Also matches the `.withAuthContext` variant
    if !attributes.event_type.starts_with(CREATED_EVENT_TYPE) {
        return Err(TriggerError::UnsupportedEventType(attributes.event_type));
    }

    let document = data.value.ok_or(TriggerError::MissingDocument)?;
    let path = attributes.document.as_deref().unwrap_or(&document.name);
    let notification_id = notification_id_from_path(path, collection)
        .ok_or_else(|| TriggerError::UnexpectedPath(path.to_string()))?;

    let fields = decode_fields(&document.fields)?;

    Ok(DocumentCreated {
        event_id: attributes.id,
        notification_id,
        fields,
    })
}
