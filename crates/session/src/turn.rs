//! Turn orchestration: the per-utterance state machine.
//!
//! `handle_utterance` is the only place that converts dependency and
//! reliability failures into user-visible text. It always returns a
//! non-empty, validated reply; silence is a bug.
//!
//! The controller serializes calls: one in-flight turn per session.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;

use vl_domain::config::{AgentMode, SessionConfig};
use vl_domain::error::{Error, Result};
use vl_domain::trace::TraceEvent;
use vl_domain::transcript::{Role, TranscriptEvent};
use vl_domain::turn::{Turn, TurnPath};
use vl_memory::MemoryProvider;

use crate::breaker::{BreakerStatus, CircuitBreaker};
use crate::controller::SessionState;
use crate::fastpath::FastPathGenerator;
use crate::loader::MemoryLoader;
use crate::retry::{self, RetryPolicy};
use crate::sync::SyncWorker;
use crate::transport::RoomTransport;
use crate::validate::{self, FallbackContext};

/// Shared collaborators for one session's orchestrator.
pub struct TurnDeps {
    pub loader: Arc<MemoryLoader>,
    pub memory: Arc<dyn MemoryProvider>,
    pub memory_breaker: Arc<CircuitBreaker>,
    /// `None` disables the fast path regardless of mode.
    pub fastpath: Option<FastPathGenerator>,
    pub fast_breaker: Arc<CircuitBreaker>,
    pub transport: Arc<dyn RoomTransport>,
    pub sync: Arc<SyncWorker>,
}

pub struct TurnOrchestrator {
    room_name: String,
    agent_id: String,
    mode: AgentMode,
    refresh_every: u32,
    policy: RetryPolicy,
    deps: TurnDeps,
}

impl TurnOrchestrator {
    pub fn new(
        room_name: impl Into<String>,
        agent_id: impl Into<String>,
        session_cfg: &SessionConfig,
        policy: RetryPolicy,
        deps: TurnDeps,
    ) -> Self {
        Self {
            room_name: room_name.into(),
            agent_id: agent_id.into(),
            mode: session_cfg.mode,
            refresh_every: session_cfg.memory_refresh_every_turns,
            policy,
            deps,
        }
    }

    /// Process one finalized user utterance end to end.
    ///
    /// Publishes the user transcript, routes to the fast or memory path,
    /// validates the candidate, publishes the assistant transcript,
    /// records the turn, schedules background sync, hands the text to the
    /// TTS sink, and returns it. Never returns an empty string.
    pub async fn handle_utterance(&self, state: &mut SessionState, user_text: &str) -> String {
        let started_at = Utc::now();
        let turn_started = Instant::now();

        // 1. User transcript first; the reply must never gate it.
        self.publish(Role::User, user_text).await;

        // 2. Periodic snapshot refresh, off the turn's critical path.
        if state.turn_counter > 0 && state.turn_counter % self.refresh_every == 0 {
            let loader = self.deps.loader.clone();
            state.tasks.spawn(async move {
                if let Err(e) = loader.reload().await {
                    tracing::warn!(error = %e, "snapshot refresh failed; keeping current snapshot");
                }
            });
        }

        // 3–5. Route: fast path when eligible, memory path otherwise or on
        // fast-path failure.
        let mut outcome: Option<(String, TurnPath)> = None;
        let mut failure: Option<Error> = None;

        if let Some(generator) = self.eligible_fast_path() {
            match self.run_fast_path(generator, state, user_text).await {
                Ok(text) => outcome = Some((text, TurnPath::Fast)),
                Err(e) => {
                    tracing::debug!(error = %e, "fast path unavailable; using memory path");
                }
            }
        }
        if outcome.is_none() {
            match self.run_memory_path(user_text).await {
                Ok(text) => outcome = Some((text, TurnPath::Memory)),
                Err(e) => failure = Some(e),
            }
        }

        // 6–7. Validate the candidate; synthesize a fallback on any
        // terminal failure or rejection.
        let (mut assistant_text, mut path, mut validated) = match outcome {
            Some((text, path)) => (text, path, true),
            None => {
                let err = failure.unwrap_or(Error::BreakerOpen);
                let ctx = validate::context_for_error(&err);
                tracing::warn!(error = %err, context = ?ctx, "turn failed; speaking fallback");
                (validate::fallback_for(ctx).to_owned(), TurnPath::Fallback, false)
            }
        };
        if let Err(reason) = validate::validate(&assistant_text) {
            tracing::warn!(%reason, "candidate reply rejected; speaking fallback");
            assistant_text = validate::fallback_for(FallbackContext::EmptyResponse).to_owned();
            path = TurnPath::Fallback;
            validated = false;
        }

        // 8. Assistant transcript, history, counter, background sync.
        self.publish(Role::Assistant, &assistant_text).await;
        let turn = Turn {
            user_text: user_text.to_owned(),
            assistant_text: assistant_text.clone(),
            started_at,
            finished_at: Utc::now(),
            path,
            validated,
        };
        state.history.push(turn.clone());
        state.turn_counter += 1;
        self.deps.sync.schedule(&turn);

        TraceEvent::TurnCompleted {
            room: self.room_name.clone(),
            path: path_name(path).into(),
            validated,
            duration_ms: turn_started.elapsed().as_millis() as u64,
        }
        .emit();

        // 9. Speak.
        if let Err(e) = self.deps.transport.speak(&assistant_text).await {
            tracing::warn!(error = %e, "TTS sink rejected assistant text");
        }
        assistant_text
    }

    // ── Path selection ───────────────────────────────────────────────

    fn eligible_fast_path(&self) -> Option<&FastPathGenerator> {
        if self.mode != AgentMode::Hybrid {
            return None;
        }
        let generator = self.deps.fastpath.as_ref()?;
        match self.deps.fast_breaker.status() {
            BreakerStatus::Closed | BreakerStatus::HalfOpen => Some(generator),
            BreakerStatus::Open => None,
        }
    }

    async fn run_fast_path(
        &self,
        generator: &FastPathGenerator,
        state: &SessionState,
        user_text: &str,
    ) -> Result<String> {
        // Probe the provider only when the breaker is half-open.
        if self.deps.fast_breaker.status() == BreakerStatus::HalfOpen {
            if let Err(e) = generator.probe().await {
                self.deps.fast_breaker.record_failure();
                return Err(Error::Unreachable(format!("llm probe failed: {e}")));
            }
        }

        let snapshot = self.deps.loader.current();
        retry::execute(&self.policy, &self.deps.fast_breaker, "llm.generate", || {
            generator.generate(&snapshot.system_prompt, &state.history, user_text)
        })
        .await
    }

    async fn run_memory_path(&self, user_text: &str) -> Result<String> {
        // Fail fast while the breaker cools down; no network traffic.
        if self.deps.memory_breaker.status() == BreakerStatus::Open {
            return Err(Error::BreakerOpen);
        }

        if let Err(e) = self.deps.memory.probe().await {
            self.deps.memory_breaker.record_failure();
            return Err(Error::Unreachable(format!("health probe failed: {e}")));
        }

        retry::execute(&self.policy, &self.deps.memory_breaker, "memory.ask", || {
            self.deps.memory.ask(&self.agent_id, user_text)
        })
        .await
    }

    // ── Publication ──────────────────────────────────────────────────

    async fn publish(&self, role: Role, text: &str) {
        let event = TranscriptEvent::now(role, text);
        if let Err(e) = self.deps.transport.publish_transcript(event).await {
            tracing::warn!(error = %e, ?role, "transcript publication failed");
        }
    }
}

fn path_name(path: TurnPath) -> &'static str {
    match path {
        TurnPath::Fast => "fast",
        TurnPath::Memory => "memory",
        TurnPath::Fallback => "fallback",
    }
}
