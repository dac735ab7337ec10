//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an order saga in its lifecycle.
///
/// State transitions:
/// ```text
/// Started ──► ProductReserveRequested ──► AwaitingPayment ──► PaymentProcessing ──► ApprovalRequested ──► Approved
///                 │                            │                    │
///                 │                            └────────────────────┴──► CancellingReservation ──┐
///                 └──────────────────────────────────────────────────────────────────────────────┴──► RejectionRequested ──► Rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Order-created received, nothing dispatched yet.
    #[default]
    Started,

    /// Reserve-product dispatched.
    ProductReserveRequested,

    /// Product reserved; fetching payment details and dispatching payment.
    AwaitingPayment,

    /// Payment command accepted; waiting for payment-processed.
    PaymentProcessing,

    /// Approve-order dispatched; waiting for order-approved.
    ApprovalRequested,

    /// Cancel-reservation dispatched; waiting for the acknowledgment.
    CancellingReservation,

    /// Reject-order dispatched; waiting for order-rejected.
    RejectionRequested,

    /// Order approved (terminal state).
    Approved,

    /// Order rejected (terminal state).
    Rejected,
}

impl SagaState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Approved | SagaState::Rejected)
    }

    /// Returns true if the saga is on the compensating branch.
    pub fn is_compensating(&self) -> bool {
        matches!(
            self,
            SagaState::CancellingReservation | SagaState::RejectionRequested | SagaState::Rejected
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Started => "Started",
            SagaState::ProductReserveRequested => "ProductReserveRequested",
            SagaState::AwaitingPayment => "AwaitingPayment",
            SagaState::PaymentProcessing => "PaymentProcessing",
            SagaState::ApprovalRequested => "ApprovalRequested",
            SagaState::CancellingReservation => "CancellingReservation",
            SagaState::RejectionRequested => "RejectionRequested",
            SagaState::Approved => "Approved",
            SagaState::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
