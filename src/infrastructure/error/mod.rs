use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::notification::DispatchError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A dispatcher invocation that ended in the error state
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

fn redact(log_msg: &str, production_msg: &str) -> String {
    if is_production() {
        production_msg.to_string()
    } else {
        log_msg.to_string()
    }
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    ///
    /// Any non-2xx status marks the triggering invocation as failed for the
    /// hosting platform.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Store(StoreError::InvalidId(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Store(StoreError::AlreadyExists(_)) => (StatusCode::CONFLICT, "CONFLICT"),
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
            AppError::Dispatch(DispatchError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            AppError::Dispatch(DispatchError::Gateway(_)) => {
                (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR")
            }
            AppError::Dispatch(DispatchError::Persistence(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let log_message = match &self {
            AppError::Dispatch(e) => e.to_string(),
            other => other.to_string(),
        };

        let client_message = match &self {
            AppError::Store(StoreError::InvalidId(_)) => log_message.clone(),
            AppError::Store(_) => redact(&log_message, "Document store unavailable"),
            AppError::Dispatch(DispatchError::Persistence(_)) => {
                redact(&log_message, "Failed to record notification status")
            }
            AppError::Auth(msg) | AppError::Validation(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            // The same text is already written onto the queue document
            AppError::Dispatch(_) => log_message.clone(),
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;

    #[test]
    fn test_dispatch_error_status_mapping() {
        let validation = AppError::from(DispatchError::Validation(
            "Missing required notification data".to_string(),
        ));
        assert_eq!(validation.status_and_code().0, StatusCode::BAD_REQUEST);

        let gateway = AppError::from(DispatchError::Gateway(GatewayError::Rejected {
            code: "UNREGISTERED".to_string(),
            message: "invalid-registration-token".to_string(),
        }));
        assert_eq!(gateway.status_and_code(), (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR"));

        let persistence = AppError::from(DispatchError::Persistence(StoreError::NotFound(
            "notification_queue/abc".to_string(),
        )));
        assert_eq!(
            persistence.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR")
        );
    }

    #[test]
    fn test_store_error_status_mapping() {
        let missing = AppError::from(StoreError::NotFound("notification_queue/x".to_string()));
        assert_eq!(missing.status_and_code().0, StatusCode::NOT_FOUND);

        let conflict = AppError::from(StoreError::AlreadyExists("notification_queue/x".to_string()));
        assert_eq!(conflict.status_and_code().0, StatusCode::CONFLICT);

        let invalid = AppError::from(StoreError::InvalidId("..".to_string()));
        assert_eq!(invalid.status_and_code(), (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"));
    }

    #[test]
    fn test_auth_error_status() {
        let response = AppError::Auth("Invalid or missing API key".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::Validation("bad event".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
