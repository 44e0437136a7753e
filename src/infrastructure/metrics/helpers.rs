//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    ACCESS_TOKEN_FAILURES_TOTAL, ACCESS_TOKEN_REFRESHES_TOTAL, GATEWAY_SEND_LATENCY,
    INVOCATIONS_IN_FLIGHT, NOTIFICATIONS_PROCESSED_TOTAL, NOTIFICATION_ERRORS_TOTAL,
    STORE_ERRORS_TOTAL, STORE_OPERATION_LATENCY,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording dispatcher metrics
pub struct DispatchMetrics;

impl DispatchMetrics {
    /// Mark an invocation as started
    pub fn invocation_started() {
        INVOCATIONS_IN_FLIGHT.inc();
    }

    /// Mark an invocation as finished, whatever the outcome
    pub fn invocation_finished() {
        INVOCATIONS_IN_FLIGHT.dec();
    }

    /// Record a document that reached `status="sent"`
    pub fn record_sent() {
        NOTIFICATIONS_PROCESSED_TOTAL.with_label_values(&["sent"]).inc();
    }

    /// Record a failed invocation
    pub fn record_error(kind: &str) {
        NOTIFICATIONS_PROCESSED_TOTAL.with_label_values(&["error"]).inc();
        NOTIFICATION_ERRORS_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record gateway round-trip latency
    pub fn observe_gateway_latency(elapsed: Duration) {
        GATEWAY_SEND_LATENCY.observe(elapsed.as_secs_f64());
    }
}

/// Helper struct for recording document store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn observe(operation: &str, elapsed: Duration) {
        STORE_OPERATION_LATENCY
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_error(operation: &str) {
        STORE_ERRORS_TOTAL.with_label_values(&[operation]).inc();
    }
}

/// Helper struct for recording credential metrics
pub struct TokenMetrics;

impl TokenMetrics {
    pub fn record_refresh() {
        ACCESS_TOKEN_REFRESHES_TOTAL.inc();
    }

    pub fn record_failure() {
        ACCESS_TOKEN_FAILURES_TOTAL.inc();
    }
}
