//! Background memory synchronization.
//!
//! Mirrors completed turns into the memory service without blocking the
//! turn that produced them. The worker owns its own breaker so a failing
//! sync never degrades the interactive paths, and absorbs every error:
//! the user already heard the reply.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use vl_domain::trace::TraceEvent;
use vl_domain::turn::Turn;
use vl_memory::MemoryProvider;

use crate::breaker::CircuitBreaker;
use crate::retry::{self, RetryPolicy};

struct SyncInner {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

pub struct SyncWorker {
    agent_id: String,
    memory: Arc<dyn MemoryProvider>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
    inner: Mutex<SyncInner>,
}

impl SyncWorker {
    pub fn new(
        agent_id: impl Into<String>,
        memory: Arc<dyn MemoryProvider>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            memory,
            breaker,
            policy,
            inner: Mutex::new(SyncInner {
                tracker: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Fire-and-forget append of a completed (user, assistant) pair.
    pub fn schedule(&self, turn: &Turn) {
        let (tracker, cancel) = {
            let inner = self.inner.lock();
            (inner.tracker.clone(), inner.cancel.clone())
        };

        let agent_id = self.agent_id.clone();
        let memory = self.memory.clone();
        let breaker = self.breaker.clone();
        let policy = self.policy.clone();
        let user = turn.user_text.clone();
        let assistant = turn.assistant_text.clone();

        tracker.spawn(async move {
            let started = Instant::now();
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(agent_id = %agent_id, "background sync cancelled");
                }
                result = retry::execute(&policy, &breaker, "memory.append", || {
                    memory.append(&agent_id, &user, &assistant)
                }) => match result {
                    Ok(()) => TraceEvent::SyncCompleted {
                        agent_id: agent_id.clone(),
                        duration_ms: started.elapsed().as_millis() as u64,
                    }
                    .emit(),
                    Err(e) => {
                        tracing::warn!(agent_id = %agent_id, error = %e, "background sync failed");
                    }
                },
            }
        });
    }

    /// Number of in-flight sync tasks.
    pub fn pending(&self) -> usize {
        self.inner.lock().tracker.len()
    }

    /// Best-effort flush, then forced cancellation after the grace period.
    ///
    /// Losing the last turn on abrupt teardown is acceptable; the durable
    /// store stays consistent with what it already acknowledged.
    pub async fn drain(&self, grace: Duration) {
        let (tracker, cancel) = {
            let inner = self.inner.lock();
            (inner.tracker.clone(), inner.cancel.clone())
        };
        tracker.close();
        if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
            tracing::warn!("background sync did not flush within grace; cancelling");
            cancel.cancel();
            let _ = tokio::time::timeout(grace, tracker.wait()).await;
        }
    }

    /// Drain, then arm a fresh task group (reset-on-reconnect).
    pub async fn reset(&self, grace: Duration) {
        self.drain(grace).await;
        let mut inner = self.inner.lock();
        inner.tracker = TaskTracker::new();
        inner.cancel = CancellationToken::new();
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
