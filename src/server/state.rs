use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::auth::FirebaseApp;
use crate::config::Settings;
use crate::gateway::{FcmGateway, PushGateway};
use crate::http::build_http_client;
use crate::notification::NotificationDispatcher;
use crate::store::{create_document_store, DocumentStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub store: Arc<dyn DocumentStore>,
    pub start_time: Instant,
}

impl AppState {
    /// Initialize the process-wide Firebase context and everything built on
    /// it. Runs once, before the first event is accepted.
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client =
            build_http_client(&settings.http).context("Failed to build outbound HTTP client")?;

        let app = FirebaseApp::initialize(&settings, client.clone())
            .context("Failed to initialize Firebase credentials")?;
        tracing::info!(
            project_id = %app.project_id,
            credentials = app.token_provider.kind(),
            "Firebase app initialized"
        );

        let gateway: Arc<dyn PushGateway> =
            Arc::new(FcmGateway::new(&app, &settings.fcm, client.clone()));
        let store = create_document_store(&settings, &app, client);

        Ok(Self::from_parts(settings, gateway, store))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        settings: Settings,
        gateway: Arc<dyn PushGateway>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(gateway, store.clone()));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            store,
            start_time: Instant::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_wires_configured_backends() {
        let mut settings = Settings::default();
        settings.firebase.project_id = Some("demo-project".to_string());
        settings.store.backend = "memory".to_string();

        let state = AppState::new(settings).unwrap();
        assert_eq!(state.store.name(), "memory");
        assert_eq!(state.dispatcher.gateway().name(), "fcm");
        assert_eq!(state.dispatcher.stats().total_processed, 0);
    }

    #[test]
    fn test_new_fails_without_project() {
        assert!(AppState::new(Settings::default()).is_err());
    }
}
