//! In-memory query gateway.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::UserId;
use domain::{FetchUserPaymentDetails, User};

use crate::error::QueryError;
use crate::gateway::QueryGateway;

#[derive(Debug, Default)]
struct QueryState {
    users: HashMap<UserId, User>,
    failure: Option<String>,
    delay: Option<Duration>,
    queries: usize,
}

/// Query gateway answering from a fixed set of users.
///
/// Unknown users yield `Ok(None)`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueryGateway {
    state: Arc<RwLock<QueryState>>,
}

impl InMemoryQueryGateway {
    /// Creates a new in-memory query gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, QueryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, QueryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a user.
    pub fn add_user(&self, user: User) {
        self.write().users.insert(user.user_id.clone(), user);
    }

    /// Makes every query fail with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.write().failure = Some(message.into());
    }

    /// Delays every answer.
    pub fn set_delay(&self, delay: Duration) {
        self.write().delay = Some(delay);
    }

    /// Returns how many queries were received.
    pub fn query_count(&self) -> usize {
        self.read().queries
    }
}

#[async_trait]
impl QueryGateway for InMemoryQueryGateway {
    async fn fetch_user_payment_details(
        &self,
        query: FetchUserPaymentDetails,
    ) -> Result<Option<User>, QueryError> {
        let delay = {
            let mut state = self.write();
            state.queries += 1;
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.read();
        if let Some(message) = &state.failure {
            return Err(QueryError::Failed(message.clone()));
        }
        Ok(state.users.get(&query.user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;
    use domain::PaymentDetails;

    fn user(id: &str) -> User {
        User {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            user_id: UserId::new(id),
            payment_details: PaymentDetails {
                name: "Jane Doe".to_string(),
                card_number: "4111111111111111".to_string(),
                valid_until_month: 12,
                valid_until_year: 2030,
                cvv: "123".to_string(),
            },
        }
    }

    fn query(id: &str) -> FetchUserPaymentDetails {
        FetchUserPaymentDetails {
            user_id: UserId::new(id),
            order_id: OrderId::new(),
        }
    }

    #[tokio::test]
    async fn test_known_and_unknown_users() {
        let gateway = InMemoryQueryGateway::new();
        gateway.add_user(user("user-1"));

        let found = gateway.fetch_user_payment_details(query("user-1")).await;
        let missing = gateway.fetch_user_payment_details(query("user-2")).await;

        assert_eq!(found.unwrap().unwrap().first_name, "Jane");
        assert_eq!(missing, Ok(None));
        assert_eq!(gateway.query_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_message_is_verbatim() {
        let gateway = InMemoryQueryGateway::new();
        gateway.add_user(user("user-1"));
        gateway.fail_with("user not found");

        let result = gateway.fetch_user_payment_details(query("user-1")).await;

        assert_eq!(result, Err(QueryError::Failed("user not found".to_string())));
    }
}
