use serde::Serialize;

use crate::models::{ProductId, SupplierId};

/// Failures reported by the remote entity store.
///
/// The hosted data service does not expose structured error codes, so every
/// variant carries only what is needed for a human-readable log line.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Store rejected request: {}", .0.join("; "))]
    Rejected(Vec<String>),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Injected failure: {0}")]
    Injected(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown supplier: {0}")]
    UnknownSupplier(SupplierId),

    #[error("Unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("Another product update is still in flight")]
    EditInProgress,

    #[error("Store returned no entity for {0}")]
    EmptyResult(&'static str),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

impl ServiceError {
    /// True when the failure happened before anything was sent to the store.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_)
                | ServiceError::UnknownSupplier(_)
                | ServiceError::UnknownProduct(_)
                | ServiceError::EditInProgress
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_joins_messages() {
        let err = StoreError::Rejected(vec!["bad id".into(), "denied".into()]);
        assert_eq!(err.to_string(), "Store rejected request: bad id; denied");
    }

    #[test]
    fn store_errors_are_not_local() {
        let err: ServiceError = StoreError::Transport("reset".into()).into();
        assert!(!err.is_local());
        assert!(ServiceError::EditInProgress.is_local());
        assert!(ServiceError::Validation("quantity".into()).is_local());
    }
}
