//! Collaborators the saga dispatches commands and queries through.

use std::time::Duration;

use async_trait::async_trait;
use domain::{FetchUserPaymentDetails, OutboundCommand, User};

use crate::error::{DispatchError, QueryError};

/// Routes commands to the services that handle them.
#[async_trait]
pub trait CommandGateway: Send + Sync {
    /// Dispatches a command and reports whether its handler accepted it.
    ///
    /// The handler's return value is discarded.
    async fn send(&self, command: OutboundCommand) -> Result<(), DispatchError>;

    /// Dispatches a command and waits up to `timeout` for the handler's result.
    ///
    /// `Ok(None)` means the handler completed without producing a result.
    async fn send_and_wait(
        &self,
        command: OutboundCommand,
        timeout: Duration,
    ) -> Result<Option<String>, DispatchError>;
}

/// Answers the queries the saga needs.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    /// Fetches the payment details of the user who placed an order.
    ///
    /// Returns `Ok(None)` when the user service has no answer.
    async fn fetch_user_payment_details(
        &self,
        query: FetchUserPaymentDetails,
    ) -> Result<Option<User>, QueryError>;
}
