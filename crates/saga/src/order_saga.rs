//! Order saga constants.

/// The saga type identifier stored alongside every instance.
pub const SAGA_TYPE: &str = "OrderSaga";

/// Name of the deadline guarding the payment step.
pub const PAYMENT_PROCESSING_DEADLINE: &str = "payment-processing-deadline";

/// Topic order summaries are published on.
pub const FIND_ORDER_TOPIC: &str = "find-order";

/// Reason used when the payment-details query returns nothing.
pub const REASON_PAYMENT_DETAILS_UNAVAILABLE: &str = "Could not fetch user payment details";

/// Reason used when the payment command completes without a result.
pub const REASON_PAYMENT_NOT_PROCESSED: &str = "Could not process payment";

/// Reason used when the payment deadline fires.
pub const REASON_PAYMENT_DEADLINE: &str = "Payment is not processed within the deadline";
