//! HTTP endpoints the hosting platform delivers events to

mod handlers;
mod models;

pub use handlers::firestore_event;
pub use models::TriggerResponse;
