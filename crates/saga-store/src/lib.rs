pub mod error;
pub mod memory;
pub mod record;
pub mod store;

pub use common::OrderId;
pub use error::{Result, SagaStoreError};
pub use memory::InMemorySagaStore;
pub use record::{SagaRecord, Version};
pub use store::{SagaStore, SaveOptions};
