//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use push_queue_dispatcher::config::Settings;
use push_queue_dispatcher::gateway::{GatewayError, PushGateway};
use push_queue_dispatcher::notification::PushMessage;
use push_queue_dispatcher::server::{create_app, AppState};
use push_queue_dispatcher::store::{
    DocumentFields, DocumentStore, MemoryDocumentStore, StoreError,
};

pub const MESSAGE_ID: &str = "projects/demo-project/messages/0:1700000000000000%abc";

/// Gateway that records every message and answers from a fixed script.
pub struct FakeGateway {
    sent: Mutex<Vec<PushMessage>>,
    rejection: Option<(String, String)>,
}

impl FakeGateway {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            rejection: None,
        })
    }

    pub fn rejecting(code: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            rejection: Some((code.to_string(), message.to_string())),
        })
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    async fn send(&self, message: &PushMessage) -> Result<String, GatewayError> {
        self.sent.lock().unwrap().push(message.clone());
        match self.rejection {
            Some((ref code, ref message)) => Err(GatewayError::Rejected {
                code: code.clone(),
                message: message.clone(),
            }),
            None => Ok(MESSAGE_ID.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Memory store whose updates fail when they would set one of the given
/// statuses.
pub struct FlakyStore {
    pub inner: MemoryDocumentStore,
    failing_statuses: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn failing_on(statuses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryDocumentStore::new(),
            failing_statuses: Mutex::new(statuses.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        self.inner.create(id, fields).await
    }

    async fn update(&self, id: &str, fields: DocumentFields) -> Result<(), StoreError> {
        let status = fields.get("status").and_then(Value::as_str).unwrap_or_default();
        if self.failing_statuses.lock().unwrap().contains(status) {
            return Err(StoreError::Backend {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        self.inner.update(id, fields).await
    }

    async fn get(&self, id: &str) -> Result<Option<DocumentFields>, StoreError> {
        self.inner.get(id).await
    }

    fn emits_create_events(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

pub fn doc(value: Value) -> DocumentFields {
    value.as_object().cloned().expect("document must be an object")
}

pub fn valid_entry() -> DocumentFields {
    doc(serde_json::json!({
        "token": "abc",
        "notification": {"title": "Alert", "body": "Flood warning"}
    }))
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.store.backend = "memory".to_string();
    settings
}

pub fn test_app(
    settings: Settings,
    gateway: Arc<dyn PushGateway>,
    store: Arc<dyn DocumentStore>,
) -> (AppState, axum::Router) {
    let state = AppState::from_parts(settings, gateway, store);
    let router = create_app(state.clone());
    (state, router)
}

/// Send one request through the router and decode the JSON response body.
pub async fn call(
    router: &axum::Router,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, Value) {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}
