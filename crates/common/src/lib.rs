//! Shared identifier types used across the saga crates.

pub mod types;

pub use types::{DeadlineId, OrderId, PaymentId, ProductId, UserId};
