use async_trait::async_trait;

use crate::{OrderId, Result, SagaRecord, Version};

/// Options for saving a saga instance.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    /// Expected version of the stored instance for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the instance to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting no instance to exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Storage for saga instances, keyed by correlation id.
///
/// The store is the single source of truth for saga state. Each order has
/// at most one active instance; a save only succeeds if the caller saw the
/// latest version, which gives single-writer-per-key semantics even when
/// several processes dispatch events.
#[async_trait]
pub trait SagaStore: Send + Sync {
    /// Loads the active saga for an order.
    ///
    /// Returns None if no saga was started or it has been archived.
    async fn load(&self, order_id: OrderId) -> Result<Option<SagaRecord>>;

    /// Saves a saga instance.
    ///
    /// If `options.expected_version` is set, the operation fails with
    /// `ConcurrencyConflict` when the stored version differs.
    ///
    /// Returns the new version of the instance.
    async fn save(&self, record: SagaRecord, options: SaveOptions) -> Result<Version>;

    /// Moves an ended saga out of the active set.
    async fn archive(&self, order_id: OrderId) -> Result<()>;

    /// Loads an archived saga.
    async fn load_archived(&self, order_id: OrderId) -> Result<Option<SagaRecord>>;

    /// Returns the number of active sagas.
    async fn active_count(&self) -> Result<usize>;
}
