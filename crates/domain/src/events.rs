//! Integration events consumed by the order fulfillment saga.

use common::{OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::message::DomainEvent;
use crate::summary::OrderStatus;

/// Events published by the order, product and payment services that
/// drive the saga forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum IntegrationEvent {
    /// An order was placed. Starts a new saga.
    OrderCreated(OrderCreated),

    /// The product service reserved stock for the order.
    ProductReserved(ProductReserved),

    /// The payment service charged the user.
    PaymentProcessed(PaymentProcessed),

    /// A product reservation was released after a failure.
    ProductReservationCancelled(ProductReservationCancelled),

    /// The order service approved the order.
    OrderApproved(OrderApproved),

    /// The order service rejected the order.
    OrderRejected(OrderRejected),
}

impl DomainEvent for IntegrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            IntegrationEvent::OrderCreated(_) => "OrderCreated",
            IntegrationEvent::ProductReserved(_) => "ProductReserved",
            IntegrationEvent::PaymentProcessed(_) => "PaymentProcessed",
            IntegrationEvent::ProductReservationCancelled(_) => "ProductReservationCancelled",
            IntegrationEvent::OrderApproved(_) => "OrderApproved",
            IntegrationEvent::OrderRejected(_) => "OrderRejected",
        }
    }

    fn order_id(&self) -> OrderId {
        match self {
            IntegrationEvent::OrderCreated(e) => e.order_id,
            IntegrationEvent::ProductReserved(e) => e.order_id,
            IntegrationEvent::PaymentProcessed(e) => e.order_id,
            IntegrationEvent::ProductReservationCancelled(e) => e.order_id,
            IntegrationEvent::OrderApproved(e) => e.order_id,
            IntegrationEvent::OrderRejected(e) => e.order_id,
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub user_id: UserId,
}

/// Data for ProductReserved event.
///
/// Also used as the payload of the payment deadline, since it holds
/// everything needed to release the reservation again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReserved {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub user_id: UserId,
}

/// Data for PaymentProcessed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProcessed {
    pub order_id: OrderId,
}

/// Data for ProductReservationCancelled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductReservationCancelled {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub user_id: UserId,
    /// Why the reservation was released. Becomes the rejection reason.
    pub reason: String,
}

/// Data for OrderApproved event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApproved {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
}

/// Data for OrderRejected event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    pub reason: String,
}

impl From<OrderCreated> for IntegrationEvent {
    fn from(data: OrderCreated) -> Self {
        IntegrationEvent::OrderCreated(data)
    }
}

impl From<ProductReserved> for IntegrationEvent {
    fn from(data: ProductReserved) -> Self {
        IntegrationEvent::ProductReserved(data)
    }
}

impl From<PaymentProcessed> for IntegrationEvent {
    fn from(data: PaymentProcessed) -> Self {
        IntegrationEvent::PaymentProcessed(data)
    }
}

impl From<ProductReservationCancelled> for IntegrationEvent {
    fn from(data: ProductReservationCancelled) -> Self {
        IntegrationEvent::ProductReservationCancelled(data)
    }
}

impl From<OrderApproved> for IntegrationEvent {
    fn from(data: OrderApproved) -> Self {
        IntegrationEvent::OrderApproved(data)
    }
}

impl From<OrderRejected> for IntegrationEvent {
    fn from(data: OrderRejected) -> Self {
        IntegrationEvent::OrderRejected(data)
    }
}
