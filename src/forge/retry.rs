//! Exponential backoff for transient forge failures.
use log::*;
use std::{future::Future, time::Duration};

use crate::Result;

/// Delay before the first retry.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
/// Upper bound for any single delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);
const RETRY_MULTIPLIER: u32 = 2;

/// Backoff schedule for retried requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: INITIAL_RETRY_DELAY,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = RETRY_MULTIPLIER.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Run `op`, retrying transient failures per `policy`. Anything else
/// returns immediately.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    what: &str,
    op: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(result) => return Ok(result),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{what} failed: {err}: retry {} of {} in {delay:?}",
                    attempt + 1,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
