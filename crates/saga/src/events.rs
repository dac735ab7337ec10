//! Events the order saga reacts to.

use common::OrderId;
use domain::{
    DomainEvent, IntegrationEvent, OrderApproved, OrderCreated, OrderRejected, PaymentProcessed,
    ProductReservationCancelled, ProductReserved,
};
use serde::{Deserialize, Serialize};

use crate::deadline::DeadlineFired;

/// Everything that can be delivered to a saga instance: the integration
/// events of the coordinated services plus the saga's own payment deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SagaEvent {
    OrderCreated(OrderCreated),
    ProductReserved(ProductReserved),
    PaymentProcessed(PaymentProcessed),
    ProductReservationCancelled(ProductReservationCancelled),
    OrderApproved(OrderApproved),
    OrderRejected(OrderRejected),

    /// The payment deadline elapsed.
    PaymentDeadlineExpired(DeadlineFired),
}

impl DomainEvent for SagaEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::OrderCreated(_) => "OrderCreated",
            SagaEvent::ProductReserved(_) => "ProductReserved",
            SagaEvent::PaymentProcessed(_) => "PaymentProcessed",
            SagaEvent::ProductReservationCancelled(_) => "ProductReservationCancelled",
            SagaEvent::OrderApproved(_) => "OrderApproved",
            SagaEvent::OrderRejected(_) => "OrderRejected",
            SagaEvent::PaymentDeadlineExpired(_) => "PaymentDeadlineExpired",
        }
    }

    fn order_id(&self) -> OrderId {
        match self {
            SagaEvent::OrderCreated(e) => e.order_id,
            SagaEvent::ProductReserved(e) => e.order_id,
            SagaEvent::PaymentProcessed(e) => e.order_id,
            SagaEvent::ProductReservationCancelled(e) => e.order_id,
            SagaEvent::OrderApproved(e) => e.order_id,
            SagaEvent::OrderRejected(e) => e.order_id,
            SagaEvent::PaymentDeadlineExpired(d) => d.payload.order_id,
        }
    }
}

impl From<IntegrationEvent> for SagaEvent {
    fn from(event: IntegrationEvent) -> Self {
        match event {
            IntegrationEvent::OrderCreated(e) => SagaEvent::OrderCreated(e),
            IntegrationEvent::ProductReserved(e) => SagaEvent::ProductReserved(e),
            IntegrationEvent::PaymentProcessed(e) => SagaEvent::PaymentProcessed(e),
            IntegrationEvent::ProductReservationCancelled(e) => {
                SagaEvent::ProductReservationCancelled(e)
            }
            IntegrationEvent::OrderApproved(e) => SagaEvent::OrderApproved(e),
            IntegrationEvent::OrderRejected(e) => SagaEvent::OrderRejected(e),
        }
    }
}

impl From<DeadlineFired> for SagaEvent {
    fn from(fired: DeadlineFired) -> Self {
        SagaEvent::PaymentDeadlineExpired(fired)
    }
}

impl From<OrderCreated> for SagaEvent {
    fn from(e: OrderCreated) -> Self {
        SagaEvent::OrderCreated(e)
    }
}

impl From<ProductReserved> for SagaEvent {
    fn from(e: ProductReserved) -> Self {
        SagaEvent::ProductReserved(e)
    }
}

impl From<PaymentProcessed> for SagaEvent {
    fn from(e: PaymentProcessed) -> Self {
        SagaEvent::PaymentProcessed(e)
    }
}

impl From<ProductReservationCancelled> for SagaEvent {
    fn from(e: ProductReservationCancelled) -> Self {
        SagaEvent::ProductReservationCancelled(e)
    }
}

impl From<OrderApproved> for SagaEvent {
    fn from(e: OrderApproved) -> Self {
        SagaEvent::OrderApproved(e)
    }
}

impl From<OrderRejected> for SagaEvent {
    fn from(e: OrderRejected) -> Self {
        SagaEvent::OrderRejected(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{DeadlineId, ProductId, UserId};
    use domain::OrderStatus;

    #[test]
    fn test_integration_events_keep_type_and_order() {
        let order_id = OrderId::new();
        let integration = IntegrationEvent::OrderRejected(OrderRejected {
            order_id,
            order_status: OrderStatus::Rejected,
            reason: "out of stock".to_string(),
        });

        let event = SagaEvent::from(integration.clone());
        assert_eq!(event.event_type(), integration.event_type());
        assert_eq!(event.order_id(), order_id);
    }

    #[test]
    fn test_deadline_event_routes_by_reservation_order() {
        let order_id = OrderId::new();
        let event = SagaEvent::from(DeadlineFired {
            name: "payment-processing-deadline".to_string(),
            deadline_id: DeadlineId::new(),
            payload: ProductReserved {
                order_id,
                product_id: ProductId::new("SKU-001"),
                quantity: 1,
                user_id: UserId::new("user-1"),
            },
        });

        assert_eq!(event.event_type(), "PaymentDeadlineExpired");
        assert_eq!(event.order_id(), order_id);
    }
}
