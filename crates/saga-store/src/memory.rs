use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    OrderId, Result, SagaRecord, SagaStoreError, Version,
    store::{SagaStore, SaveOptions},
};

/// In-memory saga store.
///
/// Provides the same interface a durable store would, including version
/// checks and archiving.
#[derive(Clone, Default)]
pub struct InMemorySagaStore {
    active: Arc<RwLock<HashMap<OrderId, SagaRecord>>>,
    archived: Arc<RwLock<HashMap<OrderId, SagaRecord>>>,
}

impl InMemorySagaStore {
    /// Creates a new empty in-memory saga store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of archived sagas.
    pub async fn archived_count(&self) -> usize {
        self.archived.read().await.len()
    }
}

#[async_trait]
impl SagaStore for InMemorySagaStore {
    async fn load(&self, order_id: OrderId) -> Result<Option<SagaRecord>> {
        Ok(self.active.read().await.get(&order_id).cloned())
    }

    async fn save(&self, mut record: SagaRecord, options: SaveOptions) -> Result<Version> {
        let order_id = record.order_id;

        if self.archived.read().await.contains_key(&order_id) {
            return Err(SagaStoreError::Archived(order_id));
        }

        let mut active = self.active.write().await;

        let current_version = active
            .get(&order_id)
            .map(|r| r.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(SagaStoreError::ConcurrencyConflict {
                order_id,
                expected,
                actual: current_version,
            });
        }

        let new_version = current_version.next();
        record.version = new_version;
        record.updated_at = Utc::now();
        active.insert(order_id, record);

        tracing::debug!(%order_id, version = %new_version, "saga saved");

        Ok(new_version)
    }

    async fn archive(&self, order_id: OrderId) -> Result<()> {
        let record = self
            .active
            .write()
            .await
            .remove(&order_id)
            .ok_or(SagaStoreError::NotFound(order_id))?;

        self.archived.write().await.insert(order_id, record);
        metrics::counter!("saga_store_archived_total").increment(1);
        Ok(())
    }

    async fn load_archived(&self, order_id: OrderId) -> Result<Option<SagaRecord>> {
        Ok(self.archived.read().await.get(&order_id).cloned())
    }

    async fn active_count(&self) -> Result<usize> {
        Ok(self.active.read().await.len())
    }
}
