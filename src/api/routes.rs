use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};
use crate::triggers::firestore_event;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::queue::{enqueue_notification, get_notification};

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Document-created events from the hosting platform
        .route("/events/firestore", post(firestore_event))
        // Operator queue API
        .nest(
            "/api/v1",
            Router::new()
                .route("/notification_queue", post(enqueue_notification))
                .route("/notification_queue/{id}", get(get_notification))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
