//! Deadline manager driven by hand.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use common::{DeadlineId, OrderId};
use domain::ProductReserved;

use crate::deadline::{DeadlineFired, DeadlineManager};
use crate::error::DeadlineError;

/// A deadline recorded by [`ManualDeadlineManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledDeadline {
    pub deadline_id: DeadlineId,
    pub name: String,
    pub after: Duration,
    pub payload: ProductReserved,
}

#[derive(Debug, Default)]
struct ManualState {
    outstanding: HashMap<DeadlineId, ScheduledDeadline>,
    scheduled: Vec<ScheduledDeadline>,
    cancelled: Vec<DeadlineId>,
}

/// Deadline manager that never fires on its own.
///
/// Tests decide when a deadline elapses by calling [`ManualDeadlineManager::fire`]
/// and delivering the result to the saga.
#[derive(Debug, Clone, Default)]
pub struct ManualDeadlineManager {
    state: Arc<Mutex<ManualState>>,
}

impl ManualDeadlineManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fires an outstanding deadline. Returns None if it was cancelled or
    /// already fired.
    pub fn fire(&self, deadline_id: DeadlineId) -> Option<DeadlineFired> {
        let deadline = self.state().outstanding.remove(&deadline_id)?;
        Some(DeadlineFired {
            name: deadline.name,
            deadline_id,
            payload: deadline.payload,
        })
    }

    /// Returns the outstanding deadline for an order, if any.
    pub fn outstanding_for(&self, order_id: OrderId) -> Option<ScheduledDeadline> {
        self.state()
            .outstanding
            .values()
            .find(|d| d.payload.order_id == order_id)
            .cloned()
    }

    pub fn outstanding_count(&self) -> usize {
        self.state().outstanding.len()
    }

    /// Returns every deadline ever scheduled, in order.
    pub fn scheduled(&self) -> Vec<ScheduledDeadline> {
        self.state().scheduled.clone()
    }

    /// Returns the ids passed to `cancel` that were outstanding.
    pub fn cancelled(&self) -> Vec<DeadlineId> {
        self.state().cancelled.clone()
    }
}

impl DeadlineManager for ManualDeadlineManager {
    fn schedule(
        &self,
        after: Duration,
        name: &str,
        payload: ProductReserved,
    ) -> Result<DeadlineId, DeadlineError> {
        let mut state = self.state();
        let order_id = payload.order_id;

        if let Some(existing) = state
            .outstanding
            .values()
            .find(|d| d.name == name && d.payload.order_id == order_id)
        {
            return Err(DeadlineError::AlreadyScheduled {
                name: name.to_string(),
                order_id,
                deadline_id: existing.deadline_id,
            });
        }

        let deadline = ScheduledDeadline {
            deadline_id: DeadlineId::new(),
            name: name.to_string(),
            after,
            payload,
        };
        let deadline_id = deadline.deadline_id;
        state.scheduled.push(deadline.clone());
        state.outstanding.insert(deadline_id, deadline);
        Ok(deadline_id)
    }

    fn cancel(&self, name: &str, deadline_id: DeadlineId) {
        let mut state = self.state();
        if state
            .outstanding
            .get(&deadline_id)
            .is_some_and(|d| d.name == name)
        {
            state.outstanding.remove(&deadline_id);
            state.cancelled.push(deadline_id);
        }
    }
}
