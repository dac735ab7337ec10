//! Commands dispatched by the saga to the services it coordinates.

use common::{OrderId, PaymentId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::message::Command;
use crate::queries::PaymentDetails;

/// Every command the saga can send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboundCommand {
    ReserveProduct(ReserveProduct),
    CancelProductReservation(CancelProductReservation),
    ProgressPayment(ProgressPayment),
    ApproveOrder(ApproveOrder),
    RejectOrder(RejectOrder),
}

impl Command for OutboundCommand {
    fn command_type(&self) -> &'static str {
        match self {
            OutboundCommand::ReserveProduct(_) => "ReserveProduct",
            OutboundCommand::CancelProductReservation(_) => "CancelProductReservation",
            OutboundCommand::ProgressPayment(_) => "ProgressPayment",
            OutboundCommand::ApproveOrder(_) => "ApproveOrder",
            OutboundCommand::RejectOrder(_) => "RejectOrder",
        }
    }

    fn order_id(&self) -> OrderId {
        match self {
            OutboundCommand::ReserveProduct(c) => c.order_id,
            OutboundCommand::CancelProductReservation(c) => c.order_id,
            OutboundCommand::ProgressPayment(c) => c.order_id,
            OutboundCommand::ApproveOrder(c) => c.order_id,
            OutboundCommand::RejectOrder(c) => c.order_id,
        }
    }
}

/// Command to reserve stock for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveProduct {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub user_id: UserId,
}

/// Compensating command releasing a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelProductReservation {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub user_id: UserId,
    pub reason: String,
}

/// Command asking the payment service to charge the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressPayment {
    pub order_id: OrderId,
    pub payment_id: PaymentId,
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveOrder {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectOrder {
    pub order_id: OrderId,
    pub reason: String,
}

impl RejectOrder {
    pub fn new(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

impl From<ReserveProduct> for OutboundCommand {
    fn from(cmd: ReserveProduct) -> Self {
        OutboundCommand::ReserveProduct(cmd)
    }
}

impl From<CancelProductReservation> for OutboundCommand {
    fn from(cmd: CancelProductReservation) -> Self {
        OutboundCommand::CancelProductReservation(cmd)
    }
}

impl From<ProgressPayment> for OutboundCommand {
    fn from(cmd: ProgressPayment) -> Self {
        OutboundCommand::ProgressPayment(cmd)
    }
}

impl From<ApproveOrder> for OutboundCommand {
    fn from(cmd: ApproveOrder) -> Self {
        OutboundCommand::ApproveOrder(cmd)
    }
}

impl From<RejectOrder> for OutboundCommand {
    fn from(cmd: RejectOrder) -> Self {
        OutboundCommand::RejectOrder(cmd)
    }
}
