//! Traits shared by every message the saga consumes or produces.

use common::OrderId;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for integration events.
///
/// Events are facts published by another service. Every event the saga
/// handles carries the order it belongs to, which is how it is routed to
/// the right saga instance.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the correlation key of the saga this event belongs to.
    fn order_id(&self) -> OrderId;
}

/// Trait for commands dispatched by the saga.
pub trait Command: Serialize + Send + Sync + Clone {
    /// Returns the command type name, used for routing and logging.
    fn command_type(&self) -> &'static str;

    /// Returns the order the command was issued for.
    fn order_id(&self) -> OrderId;
}
