//! Operator access to the queue collection.
//!
//! Enqueuing creates a document exactly as a client app would. Firestore
//! then fires the creation trigger; backends without a native trigger get
//! the dispatcher invoked in-process instead.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notification::DispatchError;
use crate::server::AppState;
use crate::store::{validate_document_id, DocumentFields};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub notification_id: String,
    /// `pending` while the platform trigger has yet to run, otherwise the
    /// status written by the in-process dispatch
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDocumentResponse {
    pub notification_id: String,
    pub fields: DocumentFields,
}

/// Auto-ID in the style Firestore assigns
fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// POST /api/v1/notification_queue
#[tracing::instrument(name = "api.enqueue_notification", skip_all)]
pub async fn enqueue_notification(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<EnqueueResponse>)> {
    let Value::Object(fields) = body else {
        return Err(AppError::Validation(
            "Queue document must be a JSON object".to_string(),
        ));
    };

    let notification_id = generate_id();
    state.store.create(&notification_id, fields.clone()).await?;
    tracing::info!(notification_id = %notification_id, backend = state.store.name(), "Queued notification");

    if state.store.emits_create_events() {
        return Ok((
            StatusCode::ACCEPTED,
            Json(EnqueueResponse {
                notification_id,
                status: "pending".to_string(),
                message_id: None,
                error: None,
            }),
        ));
    }

    let response = match state.dispatcher.process(&notification_id, &fields).await {
        Ok(outcome) => EnqueueResponse {
            notification_id,
            status: "sent".to_string(),
            message_id: Some(outcome.message_id),
            error: None,
        },
        // The outcome is on the document; a failed write is not
        Err(e @ DispatchError::Persistence(_)) => return Err(e.into()),
        Err(e) => EnqueueResponse {
            notification_id,
            status: "error".to_string(),
            message_id: None,
            error: Some(e.to_string()),
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/notification_queue/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueueDocumentResponse>> {
    validate_document_id(&id)?;
    let fields = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;

    Ok(Json(QueueDocumentResponse {
        notification_id: id,
        fields,
    }))
}
