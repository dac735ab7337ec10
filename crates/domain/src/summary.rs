//! Order summary published to subscription queries.

use common::OrderId;
use serde::{Deserialize, Serialize};

/// Status of an order as reported by the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final outcome of an order, pushed to everyone waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub order_status: OrderStatus,
    /// Rejection reason. Empty for approved orders.
    #[serde(default)]
    pub message: String,
}

impl OrderSummary {
    /// Creates the summary of an approved order.
    pub fn approved(order_id: OrderId, order_status: OrderStatus) -> Self {
        Self {
            order_id,
            order_status,
            message: String::new(),
        }
    }

    /// Creates the summary of a rejected order.
    pub fn rejected(order_id: OrderId, order_status: OrderStatus, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            order_status,
            message: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Approved).unwrap(),
            "\"APPROVED\""
        );
        let status: OrderStatus = serde_json::from_str("\"REJECTED\"").unwrap();
        assert_eq!(status, OrderStatus::Rejected);
    }

    #[test]
    fn test_rejected_summary_keeps_reason() {
        let order_id = OrderId::new();
        let summary = OrderSummary::rejected(order_id, OrderStatus::Rejected, "out of stock");
        assert_eq!(summary.order_id, order_id);
        assert_eq!(summary.message, "out of stock");
    }

    #[test]
    fn test_approved_summary_has_no_message() {
        let summary = OrderSummary::approved(OrderId::new(), OrderStatus::Approved);
        assert!(summary.message.is_empty());
    }
}
