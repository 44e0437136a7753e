use thiserror::Error;

use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Why a dispatcher invocation ended in the error state.
///
/// The `Display` text is what gets written to the document's `error` field.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Required fields missing or malformed on the queue document
    #[error("{0}")]
    Validation(String),

    /// The push gateway refused or could not be reached
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A status write to the document failed
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl DispatchError {
    /// Metric label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation",
            DispatchError::Gateway(_) => "gateway",
            DispatchError::Persistence(_) => "persistence",
        }
    }
}
