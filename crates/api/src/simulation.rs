//! Loopback stand-ins for the product, payment, order and user services.
//!
//! Commands are answered in-process and the events the real services
//! would publish are fed back to the saga, so an order can be driven end
//! to end from a single order-created event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::ProductId;
use domain::{
    DomainEvent, FetchUserPaymentDetails, IntegrationEvent, OrderApproved, OrderRejected,
    OrderStatus, OutboundCommand, PaymentDetails, PaymentProcessed, ProductReservationCancelled,
    ProductReserved, User,
};
use saga::{CommandGateway, DispatchError, QueryError, QueryGateway};
use tokio::sync::mpsc;

use crate::AppManager;

/// Stock available for a product nobody has set stock for.
pub const DEFAULT_STOCK: u32 = 100;

/// Command gateway that plays the downstream services.
///
/// Reservations draw from a per-product stock and fail with
/// `out of stock` when it runs short. Payments always succeed.
#[derive(Clone)]
pub struct LoopbackCommandGateway {
    events: mpsc::UnboundedSender<IntegrationEvent>,
    stock: Arc<Mutex<HashMap<ProductId, u32>>>,
}

impl LoopbackCommandGateway {
    /// Creates the gateway and the receiver its published events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IntegrationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            events: tx,
            stock: Arc::new(Mutex::new(HashMap::new())),
        };
        (gateway, rx)
    }

    fn stock_levels(&self) -> MutexGuard<'_, HashMap<ProductId, u32>> {
        self.stock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the available stock of a product.
    pub fn set_stock(&self, product_id: ProductId, quantity: u32) {
        self.stock_levels().insert(product_id, quantity);
    }

    /// Returns the available stock of a product.
    pub fn stock(&self, product_id: &ProductId) -> u32 {
        self.stock_levels()
            .get(product_id)
            .copied()
            .unwrap_or(DEFAULT_STOCK)
    }

    fn publish(&self, event: impl Into<IntegrationEvent>) -> Result<(), DispatchError> {
        self.events
            .send(event.into())
            .map_err(|_| DispatchError::Unavailable("event bus closed".to_string()))
    }

    fn handle(&self, command: OutboundCommand) -> Result<Option<String>, DispatchError> {
        match command {
            OutboundCommand::ReserveProduct(c) => {
                {
                    let mut stock = self.stock_levels();
                    let available = stock.entry(c.product_id.clone()).or_insert(DEFAULT_STOCK);
                    if *available < c.quantity {
                        return Err(DispatchError::Rejected("out of stock".to_string()));
                    }
                    *available -= c.quantity;
                }
                self.publish(ProductReserved {
                    order_id: c.order_id,
                    product_id: c.product_id,
                    quantity: c.quantity,
                    user_id: c.user_id,
                })?;
                Ok(None)
            }
            OutboundCommand::CancelProductReservation(c) => {
                *self
                    .stock_levels()
                    .entry(c.product_id.clone())
                    .or_insert(DEFAULT_STOCK) += c.quantity;
                self.publish(ProductReservationCancelled {
                    order_id: c.order_id,
                    product_id: c.product_id,
                    quantity: c.quantity,
                    user_id: c.user_id,
                    reason: c.reason,
                })?;
                Ok(None)
            }
            OutboundCommand::ProgressPayment(c) => {
                self.publish(PaymentProcessed {
                    order_id: c.order_id,
                })?;
                Ok(Some(c.payment_id.to_string()))
            }
            OutboundCommand::ApproveOrder(c) => {
                self.publish(OrderApproved {
                    order_id: c.order_id,
                    order_status: OrderStatus::Approved,
                })?;
                Ok(None)
            }
            OutboundCommand::RejectOrder(c) => {
                self.publish(OrderRejected {
                    order_id: c.order_id,
                    order_status: OrderStatus::Rejected,
                    reason: c.reason,
                })?;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CommandGateway for LoopbackCommandGateway {
    async fn send(&self, command: OutboundCommand) -> Result<(), DispatchError> {
        self.handle(command).map(|_| ())
    }

    async fn send_and_wait(
        &self,
        command: OutboundCommand,
        _timeout: Duration,
    ) -> Result<Option<String>, DispatchError> {
        self.handle(command)
    }
}

/// User service that knows every user and issues them a test card.
#[derive(Debug, Clone, Default)]
pub struct LoopbackQueryGateway;

#[async_trait]
impl QueryGateway for LoopbackQueryGateway {
    async fn fetch_user_payment_details(
        &self,
        query: FetchUserPaymentDetails,
    ) -> Result<Option<User>, QueryError> {
        Ok(Some(User {
            first_name: query.user_id.to_string(),
            last_name: String::new(),
            payment_details: PaymentDetails {
                name: query.user_id.to_string(),
                card_number: "4111111111111111".to_string(),
                valid_until_month: 12,
                valid_until_year: 2030,
                cvv: "123".to_string(),
            },
            user_id: query.user_id,
        }))
    }
}

/// Dispatches the events published by the loopback services.
///
/// Events are dispatched one at a time in the order they were published.
pub async fn run_event_pump(
    manager: Arc<AppManager>,
    mut events: mpsc::UnboundedReceiver<IntegrationEvent>,
) {
    while let Some(event) = events.recv().await {
        let event_type = event.event_type();
        let order_id = event.order_id();
        if let Err(e) = manager.dispatch(event.into()).await {
            tracing::error!(error = %e, %order_id, event_type, "failed to dispatch loopback event");
        }
    }
    tracing::debug!("loopback event channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, UserId};
    use domain::{CancelProductReservation, ReserveProduct};

    fn reserve(product: &str, quantity: u32) -> OutboundCommand {
        ReserveProduct {
            order_id: OrderId::new(),
            product_id: ProductId::new(product),
            quantity,
            user_id: UserId::new("user-1"),
        }
        .into()
    }

    #[tokio::test]
    async fn test_reservation_draws_stock_and_publishes() {
        let (gateway, mut events) = LoopbackCommandGateway::new();
        gateway.set_stock(ProductId::new("p-1"), 5);

        gateway.send(reserve("p-1", 3)).await.unwrap();

        assert_eq!(gateway.stock(&ProductId::new("p-1")), 2);
        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type(), "ProductReserved");
    }

    #[tokio::test]
    async fn test_reservation_beyond_stock_is_rejected() {
        let (gateway, mut events) = LoopbackCommandGateway::new();
        gateway.set_stock(ProductId::new("p-1"), 1);

        let result = gateway.send(reserve("p-1", 2)).await;

        assert_eq!(result, Err(DispatchError::Rejected("out of stock".to_string())));
        assert_eq!(gateway.stock(&ProductId::new("p-1")), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() {
        let (gateway, mut events) = LoopbackCommandGateway::new();
        gateway.set_stock(ProductId::new("p-1"), 0);

        let cancel = CancelProductReservation {
            order_id: OrderId::new(),
            product_id: ProductId::new("p-1"),
            quantity: 4,
            user_id: UserId::new("user-1"),
            reason: "Could not process payment".to_string(),
        };
        gateway.send(cancel.into()).await.unwrap();

        assert_eq!(gateway.stock(&ProductId::new("p-1")), 4);
        let IntegrationEvent::ProductReservationCancelled(event) = events.recv().await.unwrap()
        else {
            panic!("expected ProductReservationCancelled");
        };
        assert_eq!(event.reason, "Could not process payment");
    }

    #[tokio::test]
    async fn test_closed_bus_is_unavailable() {
        let (gateway, events) = LoopbackCommandGateway::new();
        drop(events);

        let result = gateway.send(reserve("p-1", 1)).await;
        assert!(matches!(result, Err(DispatchError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_every_user_has_payment_details() {
        let query = FetchUserPaymentDetails {
            user_id: UserId::new("anyone"),
            order_id: OrderId::new(),
        };
        let user = LoopbackQueryGateway
            .fetch_user_payment_details(query)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.user_id, UserId::new("anyone"));
    }
}
