//! Three-state circuit breaker guarding a fallible dependency.
//!
//! One breaker exists per (session, dependency) pair: the memory service,
//! the fast-path LLM and the background sync each get their own so a
//! failing path does not degrade the others.
//!
//! Granularity: the breaker counts *guarded operations*, not individual
//! retry attempts. The retry executor acquires once, runs its attempts,
//! and reports a single success or failure. Checking the breaker never
//! suspends; cooldown is measured on `tokio::time::Instant` so tests can
//! drive it with the paused clock.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use vl_domain::error::{Error, Result};
use vl_domain::trace::TraceEvent;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStatus {
    /// Requests pass.
    Closed,
    /// Requests fail fast without touching the dependency.
    Open,
    /// Exactly one probe request is allowed; its outcome decides the next
    /// state.
    HalfOpen,
}

impl BreakerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerStatus::Closed => "closed",
            BreakerStatus::Open => "open",
            BreakerStatus::HalfOpen => "half-open",
        }
    }
}

struct Inner {
    status: BreakerStatus,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

pub struct CircuitBreaker {
    dependency: String,
    threshold: u32,
    cooldown: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(dependency: impl Into<String>, threshold: u32, cooldown: Duration) -> Self {
        Self {
            dependency: dependency.into(),
            threshold,
            cooldown,
            inner: Mutex::new(Inner {
                status: BreakerStatus::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Effective state right now, accounting for an elapsed cooldown.
    ///
    /// Reading does not transition; the transition to half-open happens on
    /// the next `try_acquire`.
    pub fn status(&self) -> BreakerStatus {
        let inner = self.inner.lock();
        match inner.status {
            BreakerStatus::Open if self.cooldown_elapsed(&inner) => BreakerStatus::HalfOpen,
            other => other,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().consecutive_failures
    }

    /// Ask to pass one guarded operation through.
    ///
    /// Open (cooldown running) rejects with `BreakerOpen`. Open with an
    /// elapsed cooldown admits the caller as the half-open probe; further
    /// callers are rejected until the probe reports its outcome.
    pub fn try_acquire(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.status {
            BreakerStatus::Closed => Ok(()),
            BreakerStatus::Open => {
                if self.cooldown_elapsed(&inner) {
                    self.transition(&mut inner, BreakerStatus::HalfOpen);
                    inner.probe_in_flight = true;
                    Ok(())
                } else {
                    Err(Error::BreakerOpen)
                }
            }
            BreakerStatus::HalfOpen => {
                if inner.probe_in_flight {
                    Err(Error::BreakerOpen)
                } else {
                    inner.probe_in_flight = true;
                    Ok(())
                }
            }
        }
    }

    /// Report a successful guarded operation.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        if inner.status != BreakerStatus::Closed {
            self.transition(&mut inner, BreakerStatus::Closed);
        }
    }

    /// Report a failed guarded operation (including a failed health probe).
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.probe_in_flight = false;
        match inner.status {
            BreakerStatus::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.threshold {
                    inner.opened_at = Some(Instant::now());
                    self.transition(&mut inner, BreakerStatus::Open);
                }
            }
            BreakerStatus::HalfOpen | BreakerStatus::Open => {
                // A failed probe re-arms the cooldown.
                inner.consecutive_failures += 1;
                inner.opened_at = Some(Instant::now());
                if inner.status != BreakerStatus::Open {
                    self.transition(&mut inner, BreakerStatus::Open);
                }
            }
        }
    }

    fn cooldown_elapsed(&self, inner: &Inner) -> bool {
        inner
            .opened_at
            .map(|at| at.elapsed() >= self.cooldown)
            .unwrap_or(false)
    }

    fn transition(&self, inner: &mut Inner, to: BreakerStatus) {
        TraceEvent::BreakerTransition {
            dependency: self.dependency.clone(),
            from: inner.status.as_str().into(),
            to: to.as_str().into(),
        }
        .emit();
        inner.status = to;
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("memory", 3, Duration::from_secs(30))
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_failures() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        assert_eq!(b.status(), BreakerStatus::Closed);
        assert_eq!(b.consecutive_failures(), 2);

        b.record_failure();
        assert_eq!(b.status(), BreakerStatus::Open);
        assert!(matches!(b.try_acquire(), Err(Error::BreakerOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_failure_count() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        b.record_success();
        assert_eq!(b.consecutive_failures(), 0);

        // Two more failures do not open it: the streak restarted.
        b.record_failure();
        b.record_failure();
        assert_eq!(b.status(), BreakerStatus::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_moves_open_to_half_open() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        assert_eq!(b.status(), BreakerStatus::Open);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(b.status(), BreakerStatus::Open);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(b.status(), BreakerStatus::HalfOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_admits_exactly_one_probe() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        assert!(b.try_acquire().is_ok());
        // Second caller is rejected while the probe is outstanding.
        assert!(matches!(b.try_acquire(), Err(Error::BreakerOpen)));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_success_closes() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        b.try_acquire().expect("probe admitted");
        b.record_success();
        assert_eq!(b.status(), BreakerStatus::Closed);
        assert_eq!(b.consecutive_failures(), 0);
        assert!(b.try_acquire().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_rearms_cooldown() {
        let b = breaker();
        for _ in 0..3 {
            b.record_failure();
        }
        tokio::time::advance(Duration::from_secs(30)).await;

        b.try_acquire().expect("probe admitted");
        b.record_failure();
        assert_eq!(b.status(), BreakerStatus::Open);

        // The cooldown restarted at the probe failure.
        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(matches!(b.try_acquire(), Err(Error::BreakerOpen)));
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(b.try_acquire().is_ok());
    }
}
