//! Message contracts for the order fulfillment saga.
//!
//! This crate defines what travels between the saga and the services it
//! coordinates:
//! - Integration events published by the order, product and payment services
//! - Commands the saga dispatches to those services
//! - The payment-details query and its response
//! - The order summary pushed to subscription queries

pub mod commands;
pub mod events;
pub mod message;
pub mod queries;
pub mod summary;

pub use commands::{
    ApproveOrder, CancelProductReservation, OutboundCommand, ProgressPayment, RejectOrder,
    ReserveProduct,
};
pub use events::{
    IntegrationEvent, OrderApproved, OrderCreated, OrderRejected, PaymentProcessed,
    ProductReservationCancelled, ProductReserved,
};
pub use message::{Command, DomainEvent};
pub use queries::{FetchUserPaymentDetails, PaymentDetails, User};
pub use summary::{OrderStatus, OrderSummary};
