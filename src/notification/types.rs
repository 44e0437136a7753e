use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::DocumentFields;

use super::DispatchError;

/// Error text written when `token` or `notification` is missing
pub const MISSING_DATA_MESSAGE: &str = "Missing required notification data";

/// Visible part of a push notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: Some(body.into()),
        }
    }
}

/// A validated document from the queue collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// Destination device token
    pub token: String,
    pub notification: NotificationContent,
    /// Custom key/value payload, empty when the document has none
    pub data: BTreeMap<String, String>,
}

/// Document-model truthiness: absent, `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn invalid(detail: impl std::fmt::Display) -> DispatchError {
    DispatchError::Validation(format!("Invalid notification data: {}", detail))
}

fn optional_string(
    fields: &serde_json::Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, DispatchError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(format_args!("{} must be a string", path))),
    }
}

impl QueueEntry {
    /// Validate a raw queue document.
    ///
    /// Presence of `token` and `notification` is checked first so a document
    /// missing either always yields [`MISSING_DATA_MESSAGE`]; type mismatches
    /// are reported afterwards.
    pub fn from_document(document: &DocumentFields) -> Result<Self, DispatchError> {
        let token = document.get("token");
        let notification = document.get("notification");

        if !is_truthy(token) || !is_truthy(notification) {
            return Err(DispatchError::Validation(MISSING_DATA_MESSAGE.to_string()));
        }

        let token = match token {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(invalid("token must be a string")),
        };

        let notification = match notification {
            Some(Value::Object(fields)) => NotificationContent {
                title: optional_string(fields, "title", "notification.title")?,
                body: optional_string(fields, "body", "notification.body")?,
            },
            _ => return Err(invalid("notification must be an object")),
        };

        let data = match document.get("data") {
            Some(Value::Object(fields)) => fields
                .iter()
                .map(|(key, value)| match value {
                    Value::String(s) => Ok((key.clone(), s.clone())),
                    _ => Err(invalid(format_args!("data.{} must be a string", key))),
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?,
            value if !is_truthy(value) => BTreeMap::new(),
            _ => return Err(invalid("data must be a map of strings")),
        };

        Ok(Self {
            token,
            notification,
            data,
        })
    }
}
