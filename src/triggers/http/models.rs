use serde::Serialize;

/// Response body for a processed document-created event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub success: bool,
    pub event_id: String,
    pub notification_id: String,
    /// Message ID assigned by the push gateway
    pub message_id: String,
}
