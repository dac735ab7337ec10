//! Releasing a reservation after a failed step.

use domain::{CancelProductReservation, ProductReserved};

use crate::coordinator::OrderSaga;
use crate::deadline::DeadlineManager;
use crate::emitter::UpdateEmitter;
use crate::gateway::{CommandGateway, QueryGateway};
use crate::instance::SagaInstance;
use crate::order_saga;
use crate::state::SagaState;

impl<C, Q, D, U> OrderSaga<C, Q, D, U>
where
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    /// Cancels the product reservation described by `details`.
    ///
    /// Any outstanding payment deadline is cancelled first. A saga
    /// compensates at most once: a second request is logged and dropped,
    /// so a timeout racing a payment failure still releases stock once.
    /// If the cancel command cannot be delivered the saga stays in
    /// `CancellingReservation`; there is no retry.
    #[tracing::instrument(skip(self, saga, details, reason), fields(order_id = %saga.order_id()))]
    pub(crate) async fn compensate(
        &self,
        saga: &mut SagaInstance,
        details: &ProductReserved,
        reason: impl Into<String>,
    ) {
        let reason = reason.into();

        if let Some(deadline_id) = saga.take_pending_deadline() {
            self.deadlines
                .cancel(order_saga::PAYMENT_PROCESSING_DEADLINE, deadline_id);
        }

        if saga.compensation_requested() {
            tracing::warn!(%reason, "compensation already requested");
            return;
        }

        tracing::info!(%reason, "cancelling product reservation");
        saga.set_compensation_reason(reason.clone());
        saga.transition(SagaState::CancellingReservation);
        metrics::counter!("saga_compensations_total").increment(1);

        let command = CancelProductReservation {
            order_id: details.order_id,
            product_id: details.product_id.clone(),
            quantity: details.quantity,
            user_id: details.user_id.clone(),
            reason,
        };
        if let Err(e) = self.commands.send(command.into()).await {
            tracing::error!(error = %e, "cancel-reservation dispatch failed");
            metrics::counter!("saga_dispatch_failures_total").increment(1);
        }
    }
}
