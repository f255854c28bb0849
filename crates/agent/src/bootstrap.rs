//! Process-state construction shared by the CLI commands.
//!
//! Builds the process-wide singletons (agent binding, room registry,
//! memory client, optional fast-path provider, dispatch gate) and hands
//! them to whichever transport integration hosts the worker.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use vl_domain::config::{AgentMode, Config, ConfigSeverity};
use vl_memory::{MemoryProvider, RestMemoryClient};
use vl_providers::LlmProvider;
use vl_session::{
    DispatchDecision, DispatchGate, JobRequest, RoomEvent, RoomRegistry, RoomTransport,
    SessionController,
};

/// Everything created once at process start.
pub struct ProcessState {
    pub config: Arc<Config>,
    pub registry: Arc<RoomRegistry>,
    pub gate: DispatchGate,
    pub memory: Arc<dyn MemoryProvider>,
    pub llm: Option<Arc<dyn LlmProvider>>,
}

impl std::fmt::Debug for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessState").finish_non_exhaustive()
    }
}

/// Validate the config and wire up the process singletons.
pub fn build_process_state(config: Arc<Config>) -> anyhow::Result<ProcessState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Memory client ────────────────────────────────────────────────
    let memory: Arc<dyn MemoryProvider> = Arc::new(
        RestMemoryClient::new(&config.memory, &config.reliability)
            .context("creating memory client")?,
    );
    tracing::info!(url = %config.memory.base_url, "memory client ready");

    // ── Fast-path provider (hybrid mode only) ────────────────────────
    let llm = match config.session.mode {
        AgentMode::Hybrid => {
            let provider = vl_providers::create_provider(&config.llm, &config.reliability)
                .context("creating LLM provider")?;
            tracing::info!(
                provider = provider.provider_id(),
                model = %config.llm.model,
                "fast-path provider ready"
            );
            Some(provider)
        }
        AgentMode::MemoryOnly => None,
    };

    // ── Registry and dispatch gate ───────────────────────────────────
    let registry = Arc::new(RoomRegistry::new());
    let gate = DispatchGate::new(config.binding.clone(), registry.clone());
    tracing::info!(
        agent_id = %config.binding.agent_id,
        agent_name = %config.binding.agent_name,
        "dispatch gate bound to primary agent"
    );

    Ok(ProcessState {
        config,
        registry,
        gate,
        memory,
        llm,
    })
}

impl ProcessState {
    /// Offer a job to the gate; on acceptance, launch a session driven by
    /// the given transport and event stream.
    ///
    /// Returns the session task handle, or `None` when the gate rejects
    /// the job (the rejection was already surfaced to the transport side
    /// via logs and trace events).
    pub fn dispatch(
        &self,
        req: &JobRequest,
        transport: Arc<dyn RoomTransport>,
        events: mpsc::Receiver<RoomEvent>,
    ) -> Option<tokio::task::JoinHandle<vl_domain::Result<()>>> {
        match self.gate.accept(req) {
            DispatchDecision::Accepted(assignment) => {
                let controller = SessionController::new(
                    &self.config,
                    assignment,
                    self.registry.clone(),
                    self.memory.clone(),
                    self.llm.clone(),
                    transport,
                );
                Some(tokio::spawn(controller.run(events)))
            }
            decision => {
                tracing::info!(?decision, room = %req.room_name, "job not accepted");
                None
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
