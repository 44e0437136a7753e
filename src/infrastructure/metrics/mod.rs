//! Prometheus metrics for the queue dispatcher.
//!
//! - Invocation outcomes (sent / error by kind)
//! - Gateway send latency
//! - Document store write latency
//! - Access token refreshes

mod helpers;

pub use helpers::{encode_metrics, DispatchMetrics, StoreMetrics, TokenMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "push_dispatcher";

lazy_static! {
    // ============================================================================
    // Dispatch Metrics
    // ============================================================================

    /// Queue documents processed, by terminal status
    pub static ref NOTIFICATIONS_PROCESSED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_processed_total", METRIC_PREFIX),
        "Queue documents processed by terminal status",
        &["status"]
    ).unwrap();

    /// Failed invocations by error kind
    pub static ref NOTIFICATION_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notification_errors_total", METRIC_PREFIX),
        "Failed invocations by error kind",
        &["kind"]
    ).unwrap();

    /// Invocations currently in flight
    pub static ref INVOCATIONS_IN_FLIGHT: IntGauge = register_int_gauge!(
        format!("{}_invocations_in_flight", METRIC_PREFIX),
        "Dispatcher invocations currently in flight"
    ).unwrap();

    /// Push gateway send latency
    pub static ref GATEWAY_SEND_LATENCY: Histogram = register_histogram!(
        format!("{}_gateway_send_latency_seconds", METRIC_PREFIX),
        "Push gateway send latency in seconds",
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Document store operation latency
    pub static ref STORE_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_store_operation_latency_seconds", METRIC_PREFIX),
        "Document store operation latency in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).unwrap();

    /// Document store errors
    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_errors_total", METRIC_PREFIX),
        "Document store errors by operation",
        &["operation"]
    ).unwrap();

    // ============================================================================
    // Credential Metrics
    // ============================================================================

    /// OAuth access token refreshes
    pub static ref ACCESS_TOKEN_REFRESHES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_access_token_refreshes_total", METRIC_PREFIX),
        "OAuth access token refreshes"
    ).unwrap();

    /// Failed OAuth access token refreshes
    pub static ref ACCESS_TOKEN_FAILURES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_access_token_failures_total", METRIC_PREFIX),
        "Failed OAuth access token refreshes"
    ).unwrap();
}
