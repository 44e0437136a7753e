use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::gateway::PushGateway;
use crate::metrics::DispatchMetrics;
use crate::store::{DocumentFields, DocumentStore};

use super::{DispatchError, OutcomeRecord, PushMessage, QueueEntry};

/// Result of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub notification_id: String,
    /// Identifier returned by the push gateway
    pub message_id: String,
}

/// Statistics for the notification dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Invocations started
    pub total_processed: AtomicU64,
    /// Documents that reached `status="sent"`
    pub total_sent: AtomicU64,
    /// Invocations rejected by validation
    pub validation_errors: AtomicU64,
    /// Invocations whose gateway call failed
    pub gateway_errors: AtomicU64,
    /// Invocations whose status write failed
    pub persistence_errors: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_sent: self.total_sent.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            gateway_errors: self.gateway_errors.load(Ordering::Relaxed),
            persistence_errors: self.persistence_errors.load(Ordering::Relaxed),
        }
    }

    fn record_error(&self, error: &DispatchError) {
        let counter = match error {
            DispatchError::Validation(_) => &self.validation_errors,
            DispatchError::Gateway(_) => &self.gateway_errors,
            DispatchError::Persistence(_) => &self.persistence_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_processed: u64,
    pub total_sent: u64,
    pub validation_errors: u64,
    pub gateway_errors: u64,
    pub persistence_errors: u64,
}

impl DispatcherStatsSnapshot {
    pub fn total_failed(&self) -> u64 {
        self.validation_errors + self.gateway_errors + self.persistence_errors
    }
}

/// Turns newly created queue documents into push messages and records the
/// outcome back on each document.
///
/// One invocation runs validate → build → send → write strictly in order.
/// There is no duplicate-send guard: invoking twice for the same document
/// sends twice.
pub struct NotificationDispatcher {
    gateway: Arc<dyn PushGateway>,
    store: Arc<dyn DocumentStore>,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(gateway: Arc<dyn PushGateway>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            gateway,
            store,
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn gateway(&self) -> &Arc<dyn PushGateway> {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Process one newly created queue document.
    ///
    /// On failure the document is marked `status="error"` before the error is
    /// returned, so the caller only has to signal the failure to its host.
    #[tracing::instrument(
        name = "dispatcher.process",
        skip(self, document),
        fields(notification_id = %notification_id)
    )]
    pub async fn process(
        &self,
        notification_id: &str,
        document: &DocumentFields,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.stats.total_processed.fetch_add(1, Ordering::Relaxed);
        DispatchMetrics::invocation_started();
        tracing::info!(
            notification_id = %notification_id,
            notification = ?document,
            "Processing notification"
        );

        let result = self.deliver(notification_id, document).await;
        DispatchMetrics::invocation_finished();

        match result {
            Ok(outcome) => {
                self.stats.total_sent.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_sent();
                tracing::info!(
                    notification_id = %notification_id,
                    response = %outcome.message_id,
                    "Successfully sent notification"
                );
                Ok(outcome)
            }
            Err(error) => {
                let error = self.record_failure(notification_id, error).await;
                self.stats.record_error(&error);
                DispatchMetrics::record_error(error.kind());
                Err(error)
            }
        }
    }

    /// Validate, build, send and record success. Every failure, including a
    /// failed success write, is returned for the error funnel.
    async fn deliver(
        &self,
        notification_id: &str,
        document: &DocumentFields,
    ) -> Result<DispatchOutcome, DispatchError> {
        let entry = QueueEntry::from_document(document)?;
        let message = PushMessage::from_entry(&entry);

        let started = Instant::now();
        let sent = self.gateway.send(&message).await;
        DispatchMetrics::observe_gateway_latency(started.elapsed());
        let message_id = sent?;

        self.store
            .update(notification_id, OutcomeRecord::sent(message_id.as_str()).fields())
            .await?;

        Ok(DispatchOutcome {
            notification_id: notification_id.to_string(),
            message_id,
        })
    }

    /// Mark the document as failed and hand back the error to propagate.
    async fn record_failure(&self, notification_id: &str, error: DispatchError) -> DispatchError {
        tracing::error!(
            notification_id = %notification_id,
            kind = error.kind(),
            error = %error,
            "Error sending notification"
        );

        let record = OutcomeRecord::error(error.to_string());
        match self.store.update(notification_id, record.fields()).await {
            Ok(()) => error,
            Err(store_error) => {
                tracing::error!(
                    notification_id = %notification_id,
                    original_error = %error,
                    error = %store_error,
                    "Failed to record error status"
                );
                DispatchError::Persistence(store_error)
            }
        }
    }
}
