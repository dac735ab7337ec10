//! Payment deadline scheduling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use common::{DeadlineId, OrderId};
use domain::ProductReserved;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::DeadlineError;

/// A deadline that elapsed without being cancelled.
///
/// Re-enters the saga as an ordinary event for the order in `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineFired {
    pub name: String,
    pub deadline_id: DeadlineId,
    /// The reservation the deadline guards.
    pub payload: ProductReserved,
}

/// Schedules and cancels deadlines for saga instances.
///
/// At most one deadline per (name, order) may be outstanding; a second
/// `schedule` while one is pending is rejected.
pub trait DeadlineManager: Send + Sync {
    /// Schedules a deadline that fires after `after` unless cancelled.
    fn schedule(
        &self,
        after: Duration,
        name: &str,
        payload: ProductReserved,
    ) -> Result<DeadlineId, DeadlineError>;

    /// Cancels a deadline. Unknown or already fired handles are ignored.
    fn cancel(&self, name: &str, deadline_id: DeadlineId);
}

struct Timer {
    name: String,
    order_id: OrderId,
    task: AbortHandle,
}

#[derive(Default)]
struct Timers {
    by_id: HashMap<DeadlineId, Timer>,
    outstanding: HashMap<(String, OrderId), DeadlineId>,
}

impl Timers {
    fn remove(&mut self, deadline_id: DeadlineId) -> Option<Timer> {
        let timer = self.by_id.remove(&deadline_id)?;
        self.outstanding
            .remove(&(timer.name.clone(), timer.order_id));
        Some(timer)
    }
}

struct Shared {
    timers: Mutex<Timers>,
    fired: mpsc::UnboundedSender<DeadlineFired>,
}

impl Shared {
    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, name: String, deadline_id: DeadlineId, payload: ProductReserved) {
        // Cancelled between the timer elapsing and taking the lock
        if self.timers().remove(deadline_id).is_none() {
            return;
        }

        tracing::info!(%deadline_id, order_id = %payload.order_id, %name, "deadline fired");
        metrics::counter!("saga_deadlines_fired_total").increment(1);

        let fired = DeadlineFired {
            name,
            deadline_id,
            payload,
        };
        if self.fired.send(fired).is_err() {
            tracing::warn!(%deadline_id, "deadline receiver dropped; firing lost");
        }
    }
}

/// Deadline manager backed by tokio timers.
///
/// Each deadline is a spawned task sleeping for the window. Fired
/// deadlines are delivered on the channel returned by [`TokioDeadlineManager::new`].
#[derive(Clone)]
pub struct TokioDeadlineManager {
    shared: Arc<Shared>,
}

impl TokioDeadlineManager {
    /// Creates a manager and the receiver fired deadlines are delivered on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeadlineFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = Self {
            shared: Arc::new(Shared {
                timers: Mutex::new(Timers::default()),
                fired: tx,
            }),
        };
        (manager, rx)
    }

    /// Returns the number of deadlines currently outstanding.
    pub fn outstanding_count(&self) -> usize {
        self.shared.timers().by_id.len()
    }
}

impl DeadlineManager for TokioDeadlineManager {
    fn schedule(
        &self,
        after: Duration,
        name: &str,
        payload: ProductReserved,
    ) -> Result<DeadlineId, DeadlineError> {
        let order_id = payload.order_id;
        let key = (name.to_string(), order_id);

        // The lock is held until the timer is registered, so a zero-length
        // deadline cannot fire before it exists.
        let mut timers = self.shared.timers();

        if let Some(existing) = timers.outstanding.get(&key) {
            tracing::warn!(
                %order_id,
                deadline_id = %existing,
                %name,
                "deadline already outstanding; refusing to schedule another"
            );
            return Err(DeadlineError::AlreadyScheduled {
                name: name.to_string(),
                order_id,
                deadline_id: *existing,
            });
        }

        let deadline_id = DeadlineId::new();
        let shared = Arc::clone(&self.shared);
        let task_name = name.to_string();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            shared.fire(task_name, deadline_id, payload);
        });

        timers.by_id.insert(
            deadline_id,
            Timer {
                name: name.to_string(),
                order_id,
                task: task.abort_handle(),
            },
        );
        timers.outstanding.insert(key, deadline_id);

        tracing::debug!(%order_id, %deadline_id, %name, ?after, "deadline scheduled");
        Ok(deadline_id)
    }

    fn cancel(&self, name: &str, deadline_id: DeadlineId) {
        let mut timers = self.shared.timers();

        match timers.by_id.get(&deadline_id) {
            Some(timer) if timer.name == name => {}
            Some(_) => {
                tracing::warn!(%deadline_id, %name, "deadline name mismatch; not cancelled");
                return;
            }
            None => {
                tracing::debug!(%deadline_id, %name, "deadline not outstanding; nothing to cancel");
                return;
            }
        }

        if let Some(timer) = timers.remove(deadline_id) {
            timer.task.abort();
            tracing::debug!(order_id = %timer.order_id, %deadline_id, %name, "deadline cancelled");
        }
    }
}
