//! Order fulfillment saga.
//!
//! One saga instance is kept per order. It reacts to the integration
//! events of the order, product and payment services:
//! 1. Reserve the product
//! 2. Fetch the user's payment details and charge them, guarded by a
//!    payment deadline
//! 3. Approve the order
//!
//! If any step fails, or the deadline fires first, the reservation is
//! released and the order is rejected with a reason.

pub mod compensation;
pub mod config;
pub mod coordinator;
pub mod deadline;
pub mod emitter;
pub mod error;
pub mod events;
pub mod gateway;
pub mod instance;
pub mod manager;
pub mod order_saga;
pub mod services;
pub mod state;

pub use config::SagaConfig;
pub use coordinator::{EventOutcome, OrderSaga};
pub use deadline::{DeadlineFired, DeadlineManager, TokioDeadlineManager};
pub use emitter::{FindOrderQuery, InMemoryUpdateEmitter, UpdateEmitter};
pub use error::{DeadlineError, DispatchError, QueryError, Result, SagaError};
pub use events::SagaEvent;
pub use gateway::{CommandGateway, QueryGateway};
pub use instance::SagaInstance;
pub use manager::{DispatchOutcome, SagaManager};
pub use services::{InMemoryCommandGateway, InMemoryQueryGateway, ManualDeadlineManager};
pub use state::SagaState;
