use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reliability envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Retry, timeout and circuit-breaker settings shared by every guarded
/// dependency call. Not mutable per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    /// Retries after the first attempt (2 means up to 3 attempts).
    #[serde(default = "d_2")]
    pub max_retries: u32,
    #[serde(default = "d_10_000")]
    pub per_attempt_timeout_ms: u64,
    #[serde(default = "d_2_000")]
    pub health_probe_timeout_ms: u64,
    /// Consecutive failures that open a breaker.
    #[serde(default = "d_3")]
    pub breaker_threshold: u32,
    #[serde(default = "d_30_000")]
    pub breaker_cooldown_ms: u64,
    /// Sleep before retry attempt N+1 is `backoff_ms[N-1]`.
    #[serde(default = "d_backoff")]
    pub backoff_ms: Vec<u64>,
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            per_attempt_timeout_ms: 10_000,
            health_probe_timeout_ms: 2_000,
            breaker_threshold: 3,
            breaker_cooldown_ms: 30_000,
            backoff_ms: d_backoff(),
        }
    }
}

impl ReliabilityConfig {
    pub fn per_attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.per_attempt_timeout_ms)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }

    pub fn breaker_cooldown(&self) -> Duration {
        Duration::from_millis(self.breaker_cooldown_ms)
    }

    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.backoff_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_2() -> u32 {
    2
}
fn d_10_000() -> u64 {
    10_000
}
fn d_2_000() -> u64 {
    2_000
}
fn d_3() -> u32 {
    3
}
fn d_30_000() -> u64 {
    30_000
}
fn d_backoff() -> Vec<u64> {
    vec![2_000, 4_000]
}
