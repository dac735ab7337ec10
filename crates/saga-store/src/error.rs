use thiserror::Error;

use crate::{OrderId, Version};

/// Errors that can occur when interacting with the saga store.
#[derive(Debug, Error)]
pub enum SagaStoreError {
    /// Another writer saved the instance first.
    /// The expected version did not match the stored version.
    #[error(
        "Concurrency conflict for saga {order_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: Version,
        actual: Version,
    },

    /// No active saga exists for the order.
    #[error("Saga not found: {0}")]
    NotFound(OrderId),

    /// The saga already ended and was archived.
    #[error("Saga already archived: {0}")]
    Archived(OrderId),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for saga store operations.
pub type Result<T> = std::result::Result<T, SagaStoreError>;
