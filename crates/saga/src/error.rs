//! Saga error types.

use std::time::Duration;

use common::{DeadlineId, OrderId};
use saga_store::SagaStoreError;
use thiserror::Error;

/// Errors that prevent the dispatcher from processing an event.
///
/// Downstream failures are not errors at this level: they are routed to
/// compensation and end as a rejected order.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Saga store error.
    #[error("Saga store error: {0}")]
    Store(#[from] SagaStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The task handling an event panicked.
    #[error("Event handler task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Failure reported by a command handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The receiving service rejected the command. Carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// No result arrived within the bounded wait.
    #[error("No result received within {0:?}")]
    Timeout(Duration),

    /// The command could not be delivered.
    #[error("Command bus unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a query handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query handler failed. Carries its message verbatim.
    #[error("{0}")]
    Failed(String),

    /// No response arrived within the bounded wait.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),
}

/// Deadline scheduling errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    /// A deadline with this name is already outstanding for the order.
    #[error("Deadline '{name}' already scheduled for order {order_id} ({deadline_id})")]
    AlreadyScheduled {
        name: String,
        order_id: OrderId,
        deadline_id: DeadlineId,
    },
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
