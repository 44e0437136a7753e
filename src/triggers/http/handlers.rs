//! Firestore event handler

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};

use crate::error::Result;
use crate::server::AppState;
use crate::triggers::firestore::{parse_created_event, read_event};

use super::models::TriggerResponse;

/// Handle a `document.created` event on the queue collection.
///
/// The event is acknowledged only once an outcome has been written back;
/// every failure answers with a non-2xx status so the platform records the
/// invocation as failed.
#[tracing::instrument(name = "trigger.firestore", skip_all)]
pub async fn firestore_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TriggerResponse>> {
    let (attributes, data) = read_event(&headers, &body)?;
    tracing::debug!(
        event_id = %attributes.id,
        event_type = %attributes.event_type,
        source = ?attributes.source,
        "Received Firestore event"
    );

    let event = parse_created_event(attributes, data, &state.settings.firestore.collection)?;

    let outcome = state
        .dispatcher
        .process(&event.notification_id, &event.fields)
        .await?;

    Ok(Json(TriggerResponse {
        success: true,
        event_id: event.event_id,
        notification_id: outcome.notification_id,
        message_id: outcome.message_id,
    }))
}
