use serde::Serialize;

/// Structured trace events emitted across all VoiceLoop crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    MemoryCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        streaming: bool,
        duration_ms: u64,
    },
    BreakerTransition {
        dependency: String,
        from: String,
        to: String,
    },
    TurnCompleted {
        room: String,
        path: String,
        validated: bool,
        duration_ms: u64,
    },
    SessionPhase {
        room: String,
        from: String,
        to: String,
    },
    DispatchRejected {
        room: String,
        reason: String,
    },
    SnapshotRefreshed {
        agent_id: String,
        blocks: usize,
        prompt_chars: usize,
    },
    SyncCompleted {
        agent_id: String,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "vl_event");
    }
}
