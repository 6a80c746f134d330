use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a durable-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(Uuid),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Core failure taxonomy. Input failures are rejected before any state
/// mutation; a stale ride reference is rejected the same way.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ride {0} is no longer active")]
    StaleState(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}
