//! Push gateway abstraction.
//!
//! The dispatcher only depends on [`PushGateway`]; [`FcmGateway`] talks to
//! the Firebase Cloud Messaging HTTP v1 API.

mod fcm;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::AuthError;
use crate::notification::PushMessage;

pub use fcm::FcmGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered with an error (bad token, quota, etc.)
    #[error("{message}")]
    Rejected { code: String, message: String },

    /// The request never got a response
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// No access token could be obtained for the call
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Gateway error code for rejected sends
    pub fn code(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Sends one message to one destination and returns the gateway's
/// identifier for it.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError>;

    fn name(&self) -> &'static str;
}
