//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub collection: String,
    pub store: StoreHealthResponse,
    pub gateway: String,
}

#[derive(Debug, Serialize)]
pub struct StoreHealthResponse {
    pub backend: String,
    /// Whether creating a document fires the trigger without help
    pub emits_create_events: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub notifications: NotificationStats,
}

#[derive(Debug, Serialize)]
pub struct NotificationStats {
    pub total_processed: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub validation_errors: u64,
    pub gateway_errors: u64,
    pub persistence_errors: u64,
}

impl From<DispatcherStatsSnapshot> for NotificationStats {
    fn from(stats: DispatcherStatsSnapshot) -> Self {
        Self {
            total_processed: stats.total_processed,
            total_sent: stats.total_sent,
            total_failed: stats.total_failed(),
            validation_errors: stats.validation_errors,
            gateway_errors: stats.gateway_errors,
            persistence_errors: stats.persistence_errors,
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        collection: state.settings.firestore.collection.clone(),
        store: StoreHealthResponse {
            backend: state.store.name().to_string(),
            emits_create_events: state.store.emits_create_events(),
        },
        gateway: state.dispatcher.gateway().name().to_string(),
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        notifications: state.dispatcher.stats().into(),
    })
}
