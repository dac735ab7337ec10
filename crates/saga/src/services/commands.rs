//! In-memory command gateway.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Command, OutboundCommand};

use crate::error::DispatchError;
use crate::gateway::CommandGateway;

#[derive(Debug, Default)]
struct GatewayState {
    sent: Vec<OutboundCommand>,
    failures: HashMap<&'static str, DispatchError>,
    payment_without_result: bool,
    payment_delay: Option<Duration>,
}

/// Command gateway that records every dispatched command.
///
/// Every command succeeds unless a failure was configured for its type.
/// `ProgressPayment` answers `send_and_wait` with the payment id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommandGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryCommandGateway {
    /// Creates a new in-memory command gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GatewayState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GatewayState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every command of `command_type` fail with `error`.
    pub fn fail_on(&self, command_type: &'static str, error: DispatchError) {
        self.write().failures.insert(command_type, error);
    }

    /// Makes the payment handler complete without a result.
    pub fn set_payment_without_result(&self, enabled: bool) {
        self.write().payment_without_result = enabled;
    }

    /// Delays the payment handler's result.
    pub fn set_payment_delay(&self, delay: Duration) {
        self.write().payment_delay = Some(delay);
    }

    /// Returns every command dispatched so far, in order.
    pub fn sent(&self) -> Vec<OutboundCommand> {
        self.read().sent.clone()
    }

    /// Returns the dispatched commands of one type.
    pub fn commands_of_type(&self, command_type: &str) -> Vec<OutboundCommand> {
        self.read()
            .sent
            .iter()
            .filter(|c| c.command_type() == command_type)
            .cloned()
            .collect()
    }

    fn record(&self, command: &OutboundCommand) -> Result<(), DispatchError> {
        let mut state = self.write();
        state.sent.push(command.clone());
        match state.failures.get(command.command_type()) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CommandGateway for InMemoryCommandGateway {
    async fn send(&self, command: OutboundCommand) -> Result<(), DispatchError> {
        self.record(&command)
    }

    async fn send_and_wait(
        &self,
        command: OutboundCommand,
        timeout: Duration,
    ) -> Result<Option<String>, DispatchError> {
        self.record(&command)?;

        let OutboundCommand::ProgressPayment(payment) = command else {
            return Ok(None);
        };

        let (without_result, delay) = {
            let state = self.read();
            (state.payment_without_result, state.payment_delay)
        };

        let handler = async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            (!without_result).then(|| payment.payment_id.to_string())
        };

        tokio::time::timeout(timeout, handler)
            .await
            .map_err(|_| DispatchError::Timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, PaymentId};
    use domain::{ApproveOrder, PaymentDetails, ProgressPayment};

    fn payment() -> ProgressPayment {
        ProgressPayment {
            order_id: OrderId::new(),
            payment_id: PaymentId::new(),
            payment_details: PaymentDetails {
                name: "Jane Doe".to_string(),
                card_number: "4111111111111111".to_string(),
                valid_until_month: 12,
                valid_until_year: 2030,
                cvv: "123".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_records_commands() {
        let gateway = InMemoryCommandGateway::new();
        let order_id = OrderId::new();

        gateway
            .send(ApproveOrder { order_id }.into())
            .await
            .unwrap();

        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(gateway.commands_of_type("ApproveOrder").len(), 1);
        assert!(gateway.commands_of_type("RejectOrder").is_empty());
    }

    #[tokio::test]
    async fn test_configured_failure_is_returned_and_recorded() {
        let gateway = InMemoryCommandGateway::new();
        gateway.fail_on("ApproveOrder", DispatchError::Rejected("closed".to_string()));

        let result = gateway
            .send(ApproveOrder { order_id: OrderId::new() }.into())
            .await;

        assert_eq!(result, Err(DispatchError::Rejected("closed".to_string())));
        assert_eq!(gateway.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_payment_returns_payment_id() {
        let gateway = InMemoryCommandGateway::new();
        let command = payment();
        let expected = command.payment_id.to_string();

        let result = gateway
            .send_and_wait(command.into(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result, Some(expected));
    }

    #[tokio::test]
    async fn test_payment_without_result() {
        let gateway = InMemoryCommandGateway::new();
        gateway.set_payment_without_result(true);

        let result = gateway
            .send_and_wait(payment().into(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_payment_times_out() {
        let gateway = InMemoryCommandGateway::new();
        gateway.set_payment_delay(Duration::from_secs(30));

        let result = gateway
            .send_and_wait(payment().into(), Duration::from_secs(10))
            .await;

        assert_eq!(result, Err(DispatchError::Timeout(Duration::from_secs(10))));
    }
}
