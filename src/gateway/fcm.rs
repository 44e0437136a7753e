use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::auth::{FirebaseApp, TokenProvider};
use crate::config::FcmConfig;
use crate::http::read_error_body;
use crate::notification::PushMessage;

use super::{GatewayError, PushGateway};

const FCM_ERROR_TYPE: &str = "type.googleapis.com/google.firebase.fcm.v1.FcmError";

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    message: &'a PushMessage,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    validate_only: bool,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "@type", default)]
    type_url: String,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Firebase Cloud Messaging HTTP v1 client
pub struct FcmGateway {
    client: reqwest::Client,
    send_url: String,
    token_provider: Arc<dyn TokenProvider>,
    validate_only: bool,
}

impl FcmGateway {
    pub fn new(app: &FirebaseApp, config: &FcmConfig, client: reqwest::Client) -> Self {
        let send_url = format!(
            "{}/v1/projects/{}/messages:send",
            config.endpoint.trim_end_matches('/'),
            app.project_id
        );

        Self {
            client,
            send_url,
            token_provider: app.token_provider.clone(),
            validate_only: config.validate_only,
        }
    }

    pub fn send_url(&self) -> &str {
        &self.send_url
    }
}

/// Turn a non-2xx response body into a rejection carrying the FCM error
/// code (falling back to the canonical status) and the gateway's message.
fn rejection(status: reqwest::StatusCode, body: &str) -> GatewayError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let ErrorStatus {
                message,
                status: canonical,
                details,
            } = envelope.error;

            let code = details
                .into_iter()
                .find(|d| d.type_url == FCM_ERROR_TYPE)
                .and_then(|d| d.error_code)
                .or(canonical)
                .unwrap_or_else(|| status.as_u16().to_string());

            let message = if message.is_empty() {
                code.clone()
            } else {
                message
            };

            GatewayError::Rejected { code, message }
        }
        Err(_) => GatewayError::Rejected {
            code: status.as_u16().to_string(),
            message: if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown gateway error")
                    .to_string()
            } else {
                body.to_string()
            },
        },
    }
}

#[async_trait]
impl PushGateway for FcmGateway {
    #[tracing::instrument(name = "fcm.send", skip(self, message), fields(validate_only = self.validate_only))]
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError> {
        let access_token = self.token_provider.access_token().await?;

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&SendRequest {
                message,
                validate_only: self.validate_only,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            let err = rejection(status, &body);
            tracing::warn!(
                status = status.as_u16(),
                code = err.code().unwrap_or_default(),
                error = %err,
                "FCM rejected message"
            );
            return Err(err);
        }

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        tracing::debug!(message_name = %body.name, "FCM accepted message");
        Ok(body.name)
    }

    fn name(&self) -> &'static str {
        "fcm"
    }
}
