use std::time::Duration;

use tokio::time::sleep;

use crate::{
    config::RetryConfig,
    coordinator::SingletonCoordinator,
    error::LoaderError,
    ports::ExternalHandle,
};

/// Bounded backoff schedule applied at the caller boundary. The coordinator
/// stays retry-free and purely state-transition-driven; this is the one
/// place automatic retries happen.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms.max(1)),
            backoff_max: Duration::from_millis(config.backoff_max_ms.max(1)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based): doubles from
    /// the base, capped at the configured maximum.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.backoff_base.as_millis() as f64;
        let max = self.backoff_max.as_millis() as f64;
        let exp = attempt.saturating_sub(1).min(16) as i32;
        Duration::from_millis((base * 2f64.powi(exp)).min(max) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

/// Acquire with the bounded automatic retry loop expected at the widget
/// boundary: stop on success, on the first non-retryable error, or once
/// `max_attempts` acquires have been made.
pub async fn acquire_with_retry(
    coordinator: &SingletonCoordinator,
    policy: &RetryPolicy,
) -> Result<ExternalHandle, LoaderError> {
    let mut attempt = 0_u32;
    loop {
        attempt += 1;
        match coordinator.acquire().await {
            Ok(handle) => return Ok(handle),
            Err(err) => {
                if !err.retryable || attempt >= policy.max_attempts() {
                    tracing::warn!(
                        target: "mapload",
                        attempts = attempt,
                        kind = ?err.kind,
                        "acquire_retries_exhausted"
                    );
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                tracing::info!(
                    target: "mapload",
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "acquire_retry_scheduled"
                );
                sleep(delay).await;
            }
        }
    }
}
