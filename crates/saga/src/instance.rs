//! Saga instance state.

use chrono::{DateTime, Utc};
use common::{DeadlineId, OrderId, PaymentId, ProductId, UserId};
use domain::{OrderCreated, ProductReserved};
use serde::{Deserialize, Serialize};

use crate::state::SagaState;

/// One order saga.
///
/// Created from the order-created event and mutated only by the
/// coordinator while it handles an event for this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaInstance {
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    user_id: UserId,
    state: SagaState,
    /// Generated when payment is attempted.
    payment_id: Option<PaymentId>,
    /// Set while the payment deadline is outstanding.
    pending_deadline: Option<DeadlineId>,
    /// Reason attached to the cancel-reservation command, once issued.
    compensation_reason: Option<String>,
    /// Reason the order was (or is being) rejected.
    rejection_reason: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl SagaInstance {
    /// Creates the instance for a newly created order.
    pub fn new(event: &OrderCreated) -> Self {
        Self {
            order_id: event.order_id,
            product_id: event.product_id.clone(),
            quantity: event.quantity,
            user_id: event.user_id.clone(),
            state: SagaState::Started,
            payment_id: None,
            pending_deadline: None,
            compensation_reason: None,
            rejection_reason: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub(crate) fn transition(&mut self, state: SagaState) {
        tracing::debug!(order_id = %self.order_id, from = %self.state, to = %state, "saga transition");
        self.state = state;
        if state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub(crate) fn set_payment_id(&mut self, payment_id: PaymentId) {
        self.payment_id = Some(payment_id);
    }

    pub(crate) fn set_pending_deadline(&mut self, deadline_id: DeadlineId) {
        self.pending_deadline = Some(deadline_id);
    }

    /// Clears the deadline handle, returning it if one was outstanding.
    ///
    /// Whoever takes the handle owns the payment outcome; a second take
    /// yields None.
    pub(crate) fn take_pending_deadline(&mut self) -> Option<DeadlineId> {
        self.pending_deadline.take()
    }

    pub(crate) fn set_compensation_reason(&mut self, reason: impl Into<String>) {
        self.compensation_reason = Some(reason.into());
    }

    pub(crate) fn set_rejection_reason(&mut self, reason: impl Into<String>) {
        self.rejection_reason = Some(reason.into());
    }
}

// Query methods
impl SagaInstance {
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the saga state.
    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn payment_id(&self) -> Option<PaymentId> {
        self.payment_id
    }

    /// Returns the outstanding payment deadline, if any.
    pub fn pending_deadline(&self) -> Option<DeadlineId> {
        self.pending_deadline
    }

    /// Returns true once a cancel-reservation command has been issued.
    pub fn compensation_requested(&self) -> bool {
        self.compensation_reason.is_some()
    }

    pub fn compensation_reason(&self) -> Option<&str> {
        self.compensation_reason.as_deref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns the reservation this saga made, as needed for compensation.
    pub fn reservation(&self) -> ProductReserved {
        ProductReserved {
            order_id: self.order_id,
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            user_id: self.user_id.clone(),
        }
    }
}
