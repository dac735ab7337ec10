//! Saga timing configuration loaded from environment variables.

use std::time::Duration;

const DEFAULT_WINDOW_SECS: u64 = 10;

/// Bounds on the payment step.
///
/// Reads from environment variables:
/// - `SAGA_PAYMENT_DEADLINE_SECS`: deadline window started at product reservation (default: `10`)
/// - `SAGA_PAYMENT_TIMEOUT_SECS`: bounded wait on the payment command (default: `10`)
/// - `SAGA_QUERY_TIMEOUT_SECS`: bounded wait on the payment-details query (default: `10`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SagaConfig {
    pub payment_deadline: Duration,
    pub payment_timeout: Duration,
    pub query_timeout: Duration,
}

impl SagaConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            payment_deadline: secs_from_env("SAGA_PAYMENT_DEADLINE_SECS"),
            payment_timeout: secs_from_env("SAGA_PAYMENT_TIMEOUT_SECS"),
            query_timeout: secs_from_env("SAGA_QUERY_TIMEOUT_SECS"),
        }
    }
}

impl Default for SagaConfig {
    fn default() -> Self {
        Self {
            payment_deadline: Duration::from_secs(DEFAULT_WINDOW_SECS),
            payment_timeout: Duration::from_secs(DEFAULT_WINDOW_SECS),
            query_timeout: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

fn secs_from_env(key: &str) -> Duration {
    parse_secs(std::env::var(key).ok().as_deref())
}

fn parse_secs(value: Option<&str>) -> Duration {
    let secs = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_WINDOW_SECS);
    Duration::from_secs(secs)
}
