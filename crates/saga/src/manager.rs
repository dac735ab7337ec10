//! Routes events to saga instances and persists them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::OrderId;
use domain::DomainEvent;
use saga_store::{SagaRecord, SagaStore, SaveOptions, Version};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::coordinator::{EventOutcome, OrderSaga};
use crate::deadline::{DeadlineFired, DeadlineManager};
use crate::emitter::UpdateEmitter;
use crate::error::Result;
use crate::events::SagaEvent;
use crate::gateway::{CommandGateway, QueryGateway};
use crate::instance::SagaInstance;
use crate::order_saga;
use crate::state::SagaState;

/// What dispatching an event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new saga was started.
    Started(SagaState),
    /// An existing saga handled the event.
    Applied(SagaState),
    /// The saga reached a terminal state and was archived.
    Ended(SagaState),
    /// No saga accepted the event.
    Ignored,
}

type KeyLocks = HashMap<OrderId, Arc<tokio::sync::Mutex<()>>>;

/// Dispatches events to the saga for their order.
///
/// Events for the same order are handled one at a time; events for
/// different orders run concurrently. Each handled event is saved with
/// a version check, so a second dispatcher sharing the store cannot
/// overwrite a newer instance.
///
/// Each event is handled on its own task. Dropping the future returned
/// by [`SagaManager::dispatch`] does not interrupt a handler that has
/// already sent commands or scheduled a deadline; it still saves.
pub struct SagaManager<S, C, Q, D, U>
where
    S: SagaStore,
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    inner: Arc<Inner<S, C, Q, D, U>>,
}

struct Inner<S, C, Q, D, U>
where
    S: SagaStore,
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    store: S,
    saga: OrderSaga<C, Q, D, U>,
    locks: Mutex<KeyLocks>,
}

impl<S, C, Q, D, U> SagaManager<S, C, Q, D, U>
where
    S: SagaStore + 'static,
    C: CommandGateway + 'static,
    Q: QueryGateway + 'static,
    D: DeadlineManager + 'static,
    U: UpdateEmitter + 'static,
{
    /// Creates a new saga manager.
    pub fn new(store: S, saga: OrderSaga<C, Q, D, U>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                saga,
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the saga store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Returns the coordinator.
    pub fn saga(&self) -> &OrderSaga<C, Q, D, U> {
        &self.inner.saga
    }

    /// Delivers an event to the saga for its order.
    ///
    /// Order-created starts a saga unless one already exists or has
    /// ended. Any other event for an order without an active saga is
    /// ignored.
    #[tracing::instrument(
        skip(self, event),
        fields(order_id = %event.order_id(), event_type = event.event_type())
    )]
    pub async fn dispatch(&self, event: SagaEvent) -> Result<DispatchOutcome> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.dispatch(event).await }.in_current_span()).await?
    }

    /// Feeds fired deadlines back into their sagas until the sender closes.
    pub async fn run_deadlines(&self, mut fired: mpsc::UnboundedReceiver<DeadlineFired>) {
        while let Some(deadline) = fired.recv().await {
            let deadline_id = deadline.deadline_id;
            if let Err(e) = self.dispatch(deadline.into()).await {
                tracing::error!(error = %e, %deadline_id, "failed to dispatch fired deadline");
            }
        }
        tracing::debug!("deadline channel closed");
    }

    /// Returns the saga for an order, whether active or ended.
    pub async fn saga_status(&self, order_id: OrderId) -> Result<Option<SagaInstance>> {
        let store = &self.inner.store;
        let record = match store.load(order_id).await? {
            Some(record) => Some(record),
            None => store.load_archived(order_id).await?,
        };
        Ok(record.map(|r| r.decode()).transpose()?)
    }

    /// Returns the number of orders with an event in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.locks().len()
    }
}

impl<S, C, Q, D, U> Inner<S, C, Q, D, U>
where
    S: SagaStore,
    C: CommandGateway,
    Q: QueryGateway,
    D: DeadlineManager,
    U: UpdateEmitter,
{
    fn locks(&self) -> MutexGuard<'_, KeyLocks> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn dispatch(&self, event: SagaEvent) -> Result<DispatchOutcome> {
        let order_id = event.order_id();
        let key_lock = Arc::clone(self.locks().entry(order_id).or_default());

        let outcome = {
            let _guard = key_lock.lock().await;
            self.dispatch_locked(order_id, event).await
        };

        let mut locks = self.locks();
        // The map and this call hold the only references
        if Arc::strong_count(&key_lock) == 2 {
            locks.remove(&order_id);
        }

        outcome
    }

    async fn dispatch_locked(&self, order_id: OrderId, event: SagaEvent) -> Result<DispatchOutcome> {
        let Some(record) = self.store.load(order_id).await? else {
            return self.start_saga(order_id, event).await;
        };

        let mut saga: SagaInstance = record.decode()?;
        let outcome = self.saga.handle(&mut saga, event).await;
        if let EventOutcome::Ignored { .. } = outcome {
            return Ok(DispatchOutcome::Ignored);
        }

        self.persist(&saga, SaveOptions::expect_version(record.version))
            .await?;

        if saga.state().is_terminal() {
            self.store.archive(order_id).await?;
            tracing::info!(state = %saga.state(), "saga ended");
            return Ok(DispatchOutcome::Ended(saga.state()));
        }

        Ok(DispatchOutcome::Applied(saga.state()))
    }

    async fn start_saga(&self, order_id: OrderId, event: SagaEvent) -> Result<DispatchOutcome> {
        let SagaEvent::OrderCreated(created) = event else {
            tracing::warn!("no active saga for event; ignored");
            metrics::counter!("saga_stale_events_total").increment(1);
            return Ok(DispatchOutcome::Ignored);
        };

        if self.store.load_archived(order_id).await?.is_some() {
            tracing::warn!("saga for order already ended; duplicate order-created ignored");
            metrics::counter!("saga_stale_events_total").increment(1);
            return Ok(DispatchOutcome::Ignored);
        }

        let saga = self.saga.start(created).await;
        self.persist(&saga, SaveOptions::expect_new()).await?;
        Ok(DispatchOutcome::Started(saga.state()))
    }

    async fn persist(&self, saga: &SagaInstance, options: SaveOptions) -> Result<Version> {
        let record = SagaRecord::encode(
            saga.order_id(),
            order_saga::SAGA_TYPE,
            saga.state().as_str(),
            saga,
        )?;
        Ok(self.store.save(record, options).await?)
    }
}
