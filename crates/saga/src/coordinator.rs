//! Order saga coordinator.

use common::PaymentId;
use domain::{
    ApproveOrder, FetchUserPaymentDetails, OrderApproved, OrderCreated, OrderRejected,
    OrderSummary, PaymentProcessed, ProductReservationCancelled, ProductReserved, ProgressPayment,
    RejectOrder, ReserveProduct,
};

use crate::config::SagaConfig;
use crate::deadline::{DeadlineFired, DeadlineManager};
use crate::emitter::UpdateEmitter;
use crate::error::QueryError;
use crate::events::SagaEvent;
use crate::gateway::{CommandGateway, QueryGateway};
use crate::instance::SagaInstance;
use crate::order_saga;
use crate::state::SagaState;

/// What handling an event did to the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The instance changed and must be saved.
    Applied,
    /// The event was stale or not accepted in the current state.
    Ignored { reason: &'static str },
}

/// Drives one order through reservation, payment and approval, falling
/// back to releasing the reservation and rejecting the order on failure.
///
/// The coordinator holds no per-order state of its own. Callers hand it
/// the instance for the event's order and must not deliver two events
/// for the same order concurrently.
pub struct OrderSaga<C, Q, D, U>
where
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    pub(crate) commands: C,
    queries: Q,
    pub(crate) deadlines: D,
    updates: U,
    config: SagaConfig,
}

impl<C, Q, D, U> OrderSaga<C, Q, D, U>
where
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    /// Creates a new coordinator.
    pub fn new(commands: C, queries: Q, deadlines: D, updates: U, config: SagaConfig) -> Self {
        Self {
            commands,
            queries,
            deadlines,
            updates,
            config,
        }
    }

    /// Returns the timing configuration.
    pub fn config(&self) -> &SagaConfig {
        &self.config
    }

    /// Starts a saga for a newly created order by requesting the reservation.
    ///
    /// If the product service rejects the reservation outright, the order
    /// is rejected with its message and no payment step is attempted.
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn start(&self, event: OrderCreated) -> SagaInstance {
        let mut saga = SagaInstance::new(&event);
        metrics::counter!("saga_started_total").increment(1);
        tracing::info!(product_id = %event.product_id, "OrderCreated handled");

        let command = ReserveProduct {
            order_id: event.order_id,
            product_id: event.product_id,
            quantity: event.quantity,
            user_id: event.user_id,
        };
        saga.transition(SagaState::ProductReserveRequested);

        if let Err(e) = self.commands.send(command.into()).await {
            tracing::warn!(error = %e, "product reservation rejected");
            self.request_rejection(&mut saga, e.to_string()).await;
        }

        saga
    }

    /// Handles an event for an existing saga.
    #[tracing::instrument(
        skip(self, saga, event),
        fields(order_id = %saga.order_id(), state = %saga.state())
    )]
    pub async fn handle(&self, saga: &mut SagaInstance, event: SagaEvent) -> EventOutcome {
        let event_type = domain::DomainEvent::event_type(&event);

        if saga.state().is_terminal() {
            return ignore(event_type, "saga already ended");
        }

        let outcome = match event {
            SagaEvent::OrderCreated(_) => EventOutcome::Ignored {
                reason: "duplicate order-created",
            },
            SagaEvent::ProductReserved(e) => self.on_product_reserved(saga, e).await,
            SagaEvent::PaymentProcessed(e) => self.on_payment_processed(saga, e).await,
            SagaEvent::ProductReservationCancelled(e) => {
                self.on_reservation_cancelled(saga, e).await
            }
            SagaEvent::OrderApproved(e) => self.on_order_approved(saga, e),
            SagaEvent::OrderRejected(e) => self.on_order_rejected(saga, e),
            SagaEvent::PaymentDeadlineExpired(d) => self.on_payment_deadline(saga, d).await,
        };

        match outcome {
            EventOutcome::Ignored { reason } => ignore(event_type, reason),
            EventOutcome::Applied => outcome,
        }
    }

    async fn on_product_reserved(
        &self,
        saga: &mut SagaInstance,
        event: ProductReserved,
    ) -> EventOutcome {
        if saga.state() != SagaState::ProductReserveRequested {
            return EventOutcome::Ignored {
                reason: "reservation not requested",
            };
        }

        tracing::info!(product_id = %event.product_id, "ProductReserved handled");
        saga.transition(SagaState::AwaitingPayment);

        let query = FetchUserPaymentDetails {
            user_id: event.user_id.clone(),
            order_id: event.order_id,
        };
        let fetched = tokio::time::timeout(
            self.config.query_timeout,
            self.queries.fetch_user_payment_details(query),
        )
        .await
        .unwrap_or(Err(QueryError::Timeout(self.config.query_timeout)));

        let user = match fetched {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.compensate(
                    saga,
                    &event,
                    order_saga::REASON_PAYMENT_DETAILS_UNAVAILABLE,
                )
                .await;
                return EventOutcome::Applied;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch user payment details");
                self.compensate(saga, &event, e.to_string()).await;
                return EventOutcome::Applied;
            }
        };
        tracing::info!(user_id = %user.user_id, "user payment details fetched");

        match self.deadlines.schedule(
            self.config.payment_deadline,
            order_saga::PAYMENT_PROCESSING_DEADLINE,
            event.clone(),
        ) {
            Ok(deadline_id) => saga.set_pending_deadline(deadline_id),
            Err(e) => {
                self.compensate(saga, &event, e.to_string()).await;
                return EventOutcome::Applied;
            }
        }

        let payment_id = PaymentId::new();
        saga.set_payment_id(payment_id);
        let command = ProgressPayment {
            order_id: event.order_id,
            payment_id,
            payment_details: user.payment_details,
        };

        match self
            .commands
            .send_and_wait(command.into(), self.config.payment_timeout)
            .await
        {
            Ok(Some(_)) => {
                saga.transition(SagaState::PaymentProcessing);
                tracing::info!(%payment_id, "payment accepted");
            }
            Ok(None) => {
                self.compensate(saga, &event, order_saga::REASON_PAYMENT_NOT_PROCESSED)
                    .await;
            }
            Err(e) => {
                tracing::error!(error = %e, %payment_id, "payment command failed");
                self.compensate(saga, &event, e.to_string()).await;
            }
        }

        EventOutcome::Applied
    }

    async fn on_payment_processed(
        &self,
        saga: &mut SagaInstance,
        _event: PaymentProcessed,
    ) -> EventOutcome {
        // The deadline handle decides who owns the payment outcome
        let Some(deadline_id) = saga.take_pending_deadline() else {
            return EventOutcome::Ignored {
                reason: "payment outcome already resolved",
            };
        };
        self.deadlines
            .cancel(order_saga::PAYMENT_PROCESSING_DEADLINE, deadline_id);

        let command = ApproveOrder {
            order_id: saga.order_id(),
        };
        saga.transition(SagaState::ApprovalRequested);

        if let Err(e) = self.commands.send(command.into()).await {
            tracing::error!(error = %e, "approve-order dispatch failed");
            metrics::counter!("saga_dispatch_failures_total").increment(1);
            let reservation = saga.reservation();
            self.compensate(saga, &reservation, e.to_string()).await;
            return EventOutcome::Applied;
        }

        tracing::info!("PaymentProcessed: payment is processed");
        EventOutcome::Applied
    }

    async fn on_reservation_cancelled(
        &self,
        saga: &mut SagaInstance,
        event: ProductReservationCancelled,
    ) -> EventOutcome {
        if saga.state() != SagaState::CancellingReservation {
            return EventOutcome::Ignored {
                reason: "reservation cancellation not requested",
            };
        }

        tracing::info!(reason = %event.reason, "ProductReservationCancelled handled");
        self.request_rejection(saga, event.reason).await;
        EventOutcome::Applied
    }

    fn on_order_approved(&self, saga: &mut SagaInstance, event: OrderApproved) -> EventOutcome {
        if saga.state() != SagaState::ApprovalRequested {
            return EventOutcome::Ignored {
                reason: "approval not requested",
            };
        }

        tracing::info!("OrderApproved: order is approved");
        self.updates.emit(
            order_saga::FIND_ORDER_TOPIC,
            &pass_all,
            OrderSummary::approved(event.order_id, event.order_status),
        );
        saga.transition(SagaState::Approved);

        metrics::counter!("saga_approved_total").increment(1);
        record_duration(saga);
        EventOutcome::Applied
    }

    fn on_order_rejected(&self, saga: &mut SagaInstance, event: OrderRejected) -> EventOutcome {
        if let Some(deadline_id) = saga.take_pending_deadline() {
            self.deadlines
                .cancel(order_saga::PAYMENT_PROCESSING_DEADLINE, deadline_id);
        }

        tracing::info!(reason = %event.reason, "OrderRejected: order is rejected");
        self.updates.emit(
            order_saga::FIND_ORDER_TOPIC,
            &pass_all,
            OrderSummary::rejected(event.order_id, event.order_status, event.reason.clone()),
        );
        saga.set_rejection_reason(event.reason);
        saga.transition(SagaState::Rejected);

        metrics::counter!("saga_rejected_total").increment(1);
        record_duration(saga);
        EventOutcome::Applied
    }

    async fn on_payment_deadline(
        &self,
        saga: &mut SagaInstance,
        fired: DeadlineFired,
    ) -> EventOutcome {
        if saga.pending_deadline() != Some(fired.deadline_id) {
            return EventOutcome::Ignored {
                reason: "deadline no longer outstanding",
            };
        }
        // Fired timers need no cancel
        saga.take_pending_deadline();

        tracing::info!(deadline_id = %fired.deadline_id, "payment deadline is reached");
        self.compensate(saga, &fired.payload, order_saga::REASON_PAYMENT_DEADLINE)
            .await;
        EventOutcome::Applied
    }

    async fn request_rejection(&self, saga: &mut SagaInstance, reason: String) {
        let command = RejectOrder::new(saga.order_id(), reason.clone());
        saga.set_rejection_reason(reason);
        saga.transition(SagaState::RejectionRequested);

        if let Err(e) = self.commands.send(command.into()).await {
            tracing::error!(error = %e, "reject-order dispatch failed");
            metrics::counter!("saga_dispatch_failures_total").increment(1);
        }
    }
}

fn pass_all(_: &crate::emitter::FindOrderQuery) -> bool {
    true
}

fn ignore(event_type: &'static str, reason: &'static str) -> EventOutcome {
    tracing::warn!(event_type, reason, "event ignored");
    metrics::counter!("saga_stale_events_total").increment(1);
    EventOutcome::Ignored { reason }
}

fn record_duration(saga: &SagaInstance) {
    if let Some(ended_at) = saga.ended_at() {
        let elapsed = (ended_at - saga.started_at()).to_std().unwrap_or_default();
        metrics::histogram!("saga_duration_seconds").record(elapsed.as_secs_f64());
    }
}
