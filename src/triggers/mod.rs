//! Event sources that start a dispatcher invocation.

pub mod firestore;
mod http;

pub use firestore::{
    notification_id_from_path, parse_created_event, read_event, DocumentCreated,
    DocumentEventData, EventAttributes, EventDocument, TriggerError, CREATED_EVENT_TYPE,
};
pub use http::{firestore_event, TriggerResponse};
