//! Pushes order summaries to subscription queries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common::OrderId;
use domain::OrderSummary;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// The query a subscriber registered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOrderQuery {
    pub order_id: OrderId,
}

/// Publishes updates to everyone subscribed to a topic.
pub trait UpdateEmitter: Send + Sync {
    /// Pushes `update` to every subscriber of `topic` whose query passes
    /// `filter`. Returns the number of subscribers reached.
    fn emit(
        &self,
        topic: &str,
        filter: &(dyn Fn(&FindOrderQuery) -> bool + Sync),
        update: OrderSummary,
    ) -> usize;
}

struct Subscriber {
    query: FindOrderQuery,
    tx: mpsc::UnboundedSender<OrderSummary>,
}

/// In-process update emitter with channel-backed subscriptions.
#[derive(Clone, Default)]
pub struct InMemoryUpdateEmitter {
    topics: Arc<Mutex<HashMap<String, Vec<Subscriber>>>>,
}

impl InMemoryUpdateEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to updates on `topic`.
    ///
    /// Dropping the receiver ends the subscription.
    pub fn subscribe(
        &self,
        topic: &str,
        query: FindOrderQuery,
    ) -> mpsc::UnboundedReceiver<OrderSummary> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber { query, tx });
        rx
    }

    /// Returns the number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics()
            .get(topic)
            .map(|subs| subs.iter().filter(|s| !s.tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn topics(&self) -> MutexGuard<'_, HashMap<String, Vec<Subscriber>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UpdateEmitter for InMemoryUpdateEmitter {
    fn emit(
        &self,
        topic: &str,
        filter: &(dyn Fn(&FindOrderQuery) -> bool + Sync),
        update: OrderSummary,
    ) -> usize {
        let mut topics = self.topics();
        let Some(subscribers) = topics.get_mut(topic) else {
            return 0;
        };

        subscribers.retain(|s| !s.tx.is_closed());

        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            if filter(&subscriber.query) && subscriber.tx.send(update.clone()).is_ok() {
                delivered += 1;
            }
        }

        tracing::debug!(%topic, order_id = %update.order_id, delivered, "update emitted");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OrderStatus;

    const TOPIC: &str = "find-order";

    fn pass_all(_: &FindOrderQuery) -> bool {
        true
    }

    #[tokio::test]
    async fn test_emit_reaches_all_subscribers() {
        let emitter = InMemoryUpdateEmitter::new();
        let order_id = OrderId::new();
        let mut first = emitter.subscribe(TOPIC, FindOrderQuery { order_id });
        let mut second = emitter.subscribe(
            TOPIC,
            FindOrderQuery {
                order_id: OrderId::new(),
            },
        );

        let summary = OrderSummary::approved(order_id, OrderStatus::Approved);
        assert_eq!(emitter.emit(TOPIC, &pass_all, summary.clone()), 2);

        assert_eq!(first.recv().await.unwrap(), summary);
        assert_eq!(second.recv().await.unwrap(), summary);
    }

    #[tokio::test]
    async fn test_filter_selects_subscribers() {
        let emitter = InMemoryUpdateEmitter::new();
        let order_id = OrderId::new();
        let mut matching = emitter.subscribe(TOPIC, FindOrderQuery { order_id });
        let mut other = emitter.subscribe(
            TOPIC,
            FindOrderQuery {
                order_id: OrderId::new(),
            },
        );

        let summary = OrderSummary::rejected(order_id, OrderStatus::Rejected, "out of stock");
        let delivered = emitter.emit(TOPIC, &|q: &FindOrderQuery| q.order_id == order_id, summary);

        assert_eq!(delivered, 1);
        assert_eq!(matching.recv().await.unwrap().message, "out of stock");
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let emitter = InMemoryUpdateEmitter::new();
        let summary = OrderSummary::approved(OrderId::new(), OrderStatus::Approved);
        assert_eq!(emitter.emit(TOPIC, &pass_all, summary), 0);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let emitter = InMemoryUpdateEmitter::new();
        let order_id = OrderId::new();
        let rx = emitter.subscribe(TOPIC, FindOrderQuery { order_id });
        assert_eq!(emitter.subscriber_count(TOPIC), 1);

        drop(rx);
        let summary = OrderSummary::approved(order_id, OrderStatus::Approved);
        assert_eq!(emitter.emit(TOPIC, &pass_all, summary), 0);
        assert_eq!(emitter.subscriber_count(TOPIC), 0);
    }
}
