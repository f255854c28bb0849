//! Retry/timeout executor.
//!
//! Wraps one guarded operation with a per-attempt deadline and bounded
//! exponential backoff, under a circuit breaker. The breaker is consulted
//! once per guarded operation: an exhausted or terminal operation records
//! exactly one failure, so three failed turns (not three failed attempts)
//! open a breaker with threshold 3.

use std::future::Future;
use std::time::Duration;

use vl_domain::config::ReliabilityConfig;
use vl_domain::error::{Error, Result};

use crate::breaker::CircuitBreaker;

/// Retry settings for one guarded operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub per_attempt_timeout: Duration,
    /// Sleep before attempt N+1 is `backoff[N-1]`.
    pub backoff: Vec<Duration>,
}

impl From<&ReliabilityConfig> for RetryPolicy {
    fn from(cfg: &ReliabilityConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            per_attempt_timeout: cfg.per_attempt_timeout(),
            backoff: cfg.backoff_schedule(),
        }
    }
}

/// Run `op` with up to `1 + max_retries` attempts under `breaker`.
///
/// * `BreakerOpen` is terminal: surfaced immediately, nothing attempted.
/// * A deadline miss is a retryable failure.
/// * Terminal errors (`is_retryable() == false`) surface immediately.
/// * Backoff sleeps are plain `tokio::time::sleep` calls, cancellable by
///   dropping the future.
pub async fn execute<T, F, Fut>(
    policy: &RetryPolicy,
    breaker: &CircuitBreaker,
    op_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    breaker.try_acquire()?;

    let attempts = policy.max_retries + 1;
    let mut last_err: Option<Error> = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            if let Some(delay) = policy.backoff.get(attempt as usize - 2) {
                tokio::time::sleep(*delay).await;
            }
        }

        match tokio::time::timeout(policy.per_attempt_timeout, op()).await {
            Ok(Ok(value)) => {
                breaker.record_success();
                return Ok(value);
            }
            Ok(Err(e)) if !e.is_retryable() => {
                tracing::warn!(op = op_name, attempt, error = %e, "terminal failure");
                breaker.record_failure();
                return Err(e);
            }
            Ok(Err(e)) => {
                tracing::warn!(op = op_name, attempt, error = %e, "attempt failed");
                last_err = Some(e);
            }
            Err(_) => {
                let e = Error::Timeout(format!(
                    "{op_name}: attempt {attempt} exceeded {:?}",
                    policy.per_attempt_timeout
                ));
                tracing::warn!(op = op_name, attempt, "attempt timed out");
                last_err = Some(e);
            }
        }
    }

    breaker.record_failure();
    Err(Error::RetriesExhausted {
        attempts,
        source: Box::new(
            last_err.unwrap_or_else(|| Error::Timeout(format!("{op_name}: no attempt ran"))),
        ),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
