//! API layer - HTTP endpoint handlers organized by concern.

mod health;
mod metrics;
mod queue;
mod routes;

pub use health::{health, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use queue::{enqueue_notification, get_notification, EnqueueResponse, QueueDocumentResponse};
pub use routes::api_routes;
