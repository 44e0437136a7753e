//! Process-wide Google credentials shared by the push gateway and the
//! document store.

mod service_account;
mod token;

use std::sync::Arc;

use thiserror::Error;

use crate::config::Settings;

pub use service_account::{AssertionClaims, ServiceAccountKey, OAUTH_SCOPES};
pub use token::{
    MetadataTokenProvider, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider,
};

/// Bearer token accepted by the Firestore emulator
pub const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint returned {status}: {message}")]
    TokenEndpoint { status: u16, message: String },
}

/// Application context initialized once per process: the project the
/// queue lives in plus the credentials used to reach it.
#[derive(Clone)]
pub struct FirebaseApp {
    pub project_id: String,
    pub token_provider: Arc<dyn TokenProvider>,
}

impl std::fmt::Debug for FirebaseApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseApp")
            .field("project_id", &self.project_id)
            .field("credentials", &self.token_provider.kind())
            .finish()
    }
}

impl FirebaseApp {
    pub fn new(project_id: impl Into<String>, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            project_id: project_id.into(),
            token_provider,
        }
    }

    /// Resolve credentials and project ID from settings.
    ///
    /// Resolution order for credentials: configured key file, then the
    /// metadata server. The project ID comes from settings or, failing that,
    /// the key file.
    pub fn initialize(settings: &Settings, client: reqwest::Client) -> Result<Self, AuthError> {
        let (token_provider, key_project): (Arc<dyn TokenProvider>, Option<String>) =
            match settings.firebase.credentials_path {
                Some(ref path) => {
                    let key = ServiceAccountKey::from_file(path)?;
                    let project = key.project_id.clone();
                    let provider = ServiceAccountTokenProvider::new(key, client)?;
                    tracing::info!(
                        client_email = %provider.client_email(),
                        "Using service account credentials"
                    );
                    (Arc::new(provider), project)
                }
                None => {
                    tracing::info!("No key file configured, using metadata server credentials");
                    (Arc::new(MetadataTokenProvider::new(client)), None)
                }
            };

        let project_id = settings
            .firebase
            .project_id
            .clone()
            .or(key_project)
            .ok_or_else(|| {
                AuthError::Credentials(
                    "firebase.project_id is not set and the credentials do not name a project"
                        .to_string(),
                )
            })?;

        Ok(Self::new(project_id, token_provider))
    }
}
