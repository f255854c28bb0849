//! Session controller: owns the lifecycle of one room assignment.
//!
//! Phases run `INITIALIZING → READY → SERVING → DRAINING → CLOSED`.
//! The controller's event loop serializes everything: participant
//! bookkeeping, conflict eviction, idle tracking, and one in-flight turn
//! at a time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::task::TaskTracker;

use vl_domain::config::Config;
use vl_domain::error::Result;
use vl_domain::trace::TraceEvent;
use vl_memory::MemoryProvider;
use vl_providers::LlmProvider;

use crate::breaker::CircuitBreaker;
use crate::fastpath::FastPathGenerator;
use crate::history::TurnHistory;
use crate::loader::MemoryLoader;
use crate::registry::{RoomAssignment, RoomRegistry};
use crate::retry::RetryPolicy;
use crate::sync::SyncWorker;
use crate::transport::{ParticipantKind, RoomEvent, RoomTransport};
use crate::turn::{TurnDeps, TurnOrchestrator};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-session mutable state, owned by the controller for the lifetime of
/// one room assignment.
pub struct SessionState {
    pub assignment: RoomAssignment,
    pub history: TurnHistory,
    pub turn_counter: u32,
    pub last_activity: Instant,
    /// Handles for snapshot refreshes and other session-scoped tasks; all
    /// complete or are dropped before the session closes.
    pub tasks: TaskTracker,
}

impl SessionState {
    pub fn new(assignment: RoomAssignment, history_window: usize) -> Self {
        Self {
            assignment,
            history: TurnHistory::new(history_window),
            turn_counter: 0,
            last_activity: Instant::now(),
            tasks: TaskTracker::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Phase machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Ready,
    Serving,
    Draining,
    Closed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Initializing => "initializing",
            SessionPhase::Ready => "ready",
            SessionPhase::Serving => "serving",
            SessionPhase::Draining => "draining",
            SessionPhase::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DrainReason {
    LastHumanLeft,
    IdleTimeout,
    Shutdown,
    AgentConflict,
}

impl DrainReason {
    fn as_str(&self) -> &'static str {
        match self {
            DrainReason::LastHumanLeft => "last-human-left",
            DrainReason::IdleTimeout => "idle-timeout",
            DrainReason::Shutdown => "shutdown",
            DrainReason::AgentConflict => "agent-conflict",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Controller
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionController {
    phase: SessionPhase,
    state: SessionState,
    orchestrator: TurnOrchestrator,
    loader: Arc<MemoryLoader>,
    sync: Arc<SyncWorker>,
    registry: Arc<RoomRegistry>,
    transport: Arc<dyn RoomTransport>,
    idle_timeout: Duration,
    drain_grace: Duration,
    humans: HashSet<String>,
    foreign_agents: HashSet<String>,
    needs_reset: bool,
}

impl SessionController {
    /// Wire up a session for an accepted assignment.
    ///
    /// Builds the per-session reliability state: one breaker each for the
    /// memory path, the fast path and the background sync, so one failing
    /// dependency never masks another. `llm = None` disables the fast
    /// path regardless of mode.
    pub fn new(
        config: &Config,
        assignment: RoomAssignment,
        registry: Arc<RoomRegistry>,
        memory: Arc<dyn MemoryProvider>,
        llm: Option<Arc<dyn LlmProvider>>,
        transport: Arc<dyn RoomTransport>,
    ) -> Self {
        let rel = &config.reliability;
        let policy = RetryPolicy::from(rel);

        let memory_breaker = Arc::new(CircuitBreaker::new(
            "memory",
            rel.breaker_threshold,
            rel.breaker_cooldown(),
        ));
        let fast_breaker = Arc::new(CircuitBreaker::new(
            "llm",
            rel.breaker_threshold,
            rel.breaker_cooldown(),
        ));
        let sync_breaker = Arc::new(CircuitBreaker::new(
            "memory-sync",
            rel.breaker_threshold,
            rel.breaker_cooldown(),
        ));

        let loader = Arc::new(MemoryLoader::new(
            assignment.agent_id.clone(),
            memory.clone(),
            memory_breaker.clone(),
            policy.clone(),
        ));
        let sync = Arc::new(SyncWorker::new(
            assignment.agent_id.clone(),
            memory.clone(),
            sync_breaker,
            policy.clone(),
        ));

        let orchestrator = TurnOrchestrator::new(
            assignment.room_name.clone(),
            assignment.agent_id.clone(),
            &config.session,
            policy,
            TurnDeps {
                loader: loader.clone(),
                memory,
                memory_breaker,
                fastpath: llm.map(FastPathGenerator::new),
                fast_breaker,
                transport: transport.clone(),
                sync: sync.clone(),
            },
        );

        let state = SessionState::new(assignment, config.session.history_window);

        Self {
            phase: SessionPhase::Initializing,
            state,
            orchestrator,
            loader,
            sync,
            registry,
            transport,
            idle_timeout: Duration::from_secs(config.session.idle_timeout_secs),
            drain_grace: Duration::from_millis(config.session.drain_grace_ms),
            humans: HashSet::new(),
            foreign_agents: HashSet::new(),
            needs_reset: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Clean the room, preload the snapshot, and become READY.
    ///
    /// A failed preload is not fatal: the minimal snapshot serves until a
    /// refresh succeeds, and the memory path's health probe keeps
    /// reporting the outage per turn.
    pub async fn initialize(&mut self) {
        let room = self.state.assignment.room_name.clone();
        if let Err(e) = self.transport.clear_stale_agents(&room).await {
            tracing::warn!(room = %room, error = %e, "stale participant cleanup failed");
        }
        if let Err(e) = self.loader.reload().await {
            tracing::warn!(
                room = %room,
                error = %e,
                "snapshot preload failed; serving with minimal prompt"
            );
        }
        self.set_phase(SessionPhase::Ready);
    }

    /// Drive the session until it closes. Events arrive from the
    /// transport; an idle deadline with no finalized transcript drains.
    pub async fn run(mut self, mut events: mpsc::Receiver<RoomEvent>) -> Result<()> {
        self.initialize().await;

        while !matches!(self.phase, SessionPhase::Draining | SessionPhase::Closed) {
            let idle_deadline = self.state.last_activity + self.idle_timeout;
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => self.begin_drain(DrainReason::Shutdown),
                },
                _ = tokio::time::sleep_until(idle_deadline) => {
                    self.begin_drain(DrainReason::IdleTimeout);
                }
            }
        }

        self.drain_and_close().await;
        Ok(())
    }

    /// Apply one transport event. Public so tests (and embedders with
    /// their own loops) can drive the controller directly.
    pub async fn handle_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::ParticipantJoined(p) => match p.kind {
                ParticipantKind::Human => {
                    if self.humans.is_empty() && self.needs_reset {
                        self.reset_conversation().await;
                    }
                    self.humans.insert(p.identity);
                }
                ParticipantKind::Agent => {
                    self.foreign_agents.insert(p.identity);
                    if self.foreign_agents.len() > 1 {
                        tracing::warn!(
                            room = %self.state.assignment.room_name,
                            count = self.foreign_agents.len(),
                            "multiple agents in room; evicting this session"
                        );
                        self.begin_drain(DrainReason::AgentConflict);
                    }
                }
                ParticipantKind::Local => {}
            },
            RoomEvent::ParticipantLeft(p) => match p.kind {
                ParticipantKind::Human => {
                    self.humans.remove(&p.identity);
                    if self.humans.is_empty() {
                        self.needs_reset = true;
                        if self.phase == SessionPhase::Serving {
                            self.begin_drain(DrainReason::LastHumanLeft);
                        }
                    }
                }
                ParticipantKind::Agent => {
                    self.foreign_agents.remove(&p.identity);
                }
                ParticipantKind::Local => {}
            },
            RoomEvent::UserTranscript { text } => {
                if !matches!(self.phase, SessionPhase::Ready | SessionPhase::Serving) {
                    tracing::debug!(phase = self.phase.as_str(), "transcript ignored");
                    return;
                }
                if self.phase == SessionPhase::Ready {
                    self.set_phase(SessionPhase::Serving);
                }
                self.state.last_activity = Instant::now();
                let reply = self
                    .orchestrator
                    .handle_utterance(&mut self.state, &text)
                    .await;
                tracing::debug!(chars = reply.len(), "turn complete");
            }
            RoomEvent::Shutdown => self.begin_drain(DrainReason::Shutdown),
        }
    }

    /// Reset-on-reconnect: clear in-process conversational state, cancel
    /// and await in-flight background work, and reload the snapshot.
    /// Durable memory in the service is untouched.
    pub async fn reset_conversation(&mut self) {
        tracing::info!(
            room = %self.state.assignment.room_name,
            "clearing conversational state for reconnect"
        );
        self.state.history.clear();
        self.state.turn_counter = 0;

        self.state.tasks.close();
        if tokio::time::timeout(self.drain_grace, self.state.tasks.wait())
            .await
            .is_err()
        {
            tracing::warn!("session tasks did not finish within grace; dropping handles");
        }
        self.state.tasks = TaskTracker::new();
        self.sync.reset(self.drain_grace).await;

        if let Err(e) = self.loader.reload().await {
            tracing::warn!(error = %e, "snapshot reload on reconnect failed; keeping current");
        }
        self.needs_reset = false;
        self.state.last_activity = Instant::now();
    }

    /// Finish draining: bounded wait for session tasks, flush background
    /// sync, release the room, and close.
    pub async fn drain_and_close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        if self.phase != SessionPhase::Draining {
            self.set_phase(SessionPhase::Draining);
        }

        self.state.tasks.close();
        if tokio::time::timeout(self.drain_grace, self.state.tasks.wait())
            .await
            .is_err()
        {
            tracing::warn!("session tasks did not finish within grace; dropping handles");
        }
        self.sync.drain(self.drain_grace).await;

        self.registry.release(&self.state.assignment.room_name);
        self.set_phase(SessionPhase::Closed);
    }

    fn begin_drain(&mut self, reason: DrainReason) {
        if matches!(self.phase, SessionPhase::Draining | SessionPhase::Closed) {
            return;
        }
        tracing::info!(
            room = %self.state.assignment.room_name,
            reason = reason.as_str(),
            "session draining"
        );
        self.set_phase(SessionPhase::Draining);
    }

    fn set_phase(&mut self, to: SessionPhase) {
        TraceEvent::SessionPhase {
            room: self.state.assignment.room_name.clone(),
            from: self.phase.as_str().into(),
            to: to.as_str().into(),
        }
        .emit();
        self.phase = to;
    }
}
