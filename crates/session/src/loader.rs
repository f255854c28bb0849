//! Memory loader: persona + memory blocks → composed system prompt.
//!
//! The loader owns the session's [`AgentSnapshot`]. Snapshots are
//! immutable once published; a reload builds a new one and swaps the
//! pointer, so a turn already holding a snapshot keeps a coherent view.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::Instant;

use vl_domain::error::Result;
use vl_domain::trace::TraceEvent;
use vl_memory::{MemoryBlock, MemoryProvider};

use crate::breaker::CircuitBreaker;
use crate::retry::{self, RetryPolicy};

/// Prompt used when the agent has no persona and no blocks. A snapshot
/// never carries an empty system prompt.
pub const MINIMAL_SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Keep your replies short and natural to speak aloud.";

/// Immutable persona + blocks + composed prompt bundle cached per session.
#[derive(Debug, Clone)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub persona: String,
    pub blocks: Vec<MemoryBlock>,
    pub loaded_at: Instant,
    pub system_prompt: String,
}

/// Compose the system prompt: persona first, then each block in
/// service-returned order, each prefixed by its label.
///
/// Deterministic: identical persona and block list always produce an
/// identical prompt.
pub fn compose_system_prompt(persona: &str, blocks: &[MemoryBlock]) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(1 + blocks.len());
    if !persona.trim().is_empty() {
        sections.push(persona.trim().to_owned());
    }
    for block in blocks {
        sections.push(format!("[{}]\n{}", block.label, block.value));
    }
    if sections.is_empty() {
        MINIMAL_SYSTEM_PROMPT.to_owned()
    } else {
        sections.join("\n\n")
    }
}

pub struct MemoryLoader {
    agent_id: String,
    memory: Arc<dyn MemoryProvider>,
    breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
    current: RwLock<Arc<AgentSnapshot>>,
}

impl MemoryLoader {
    /// Create a loader seeded with the minimal-fallback snapshot.
    pub fn new(
        agent_id: impl Into<String>,
        memory: Arc<dyn MemoryProvider>,
        breaker: Arc<CircuitBreaker>,
        policy: RetryPolicy,
    ) -> Self {
        let agent_id = agent_id.into();
        let initial = Arc::new(AgentSnapshot {
            agent_id: agent_id.clone(),
            persona: String::new(),
            blocks: Vec::new(),
            loaded_at: Instant::now(),
            system_prompt: MINIMAL_SYSTEM_PROMPT.to_owned(),
        });
        Self {
            agent_id,
            memory,
            breaker,
            policy,
            current: RwLock::new(initial),
        }
    }

    /// The currently published snapshot. Cheap; callers may hold it for
    /// the duration of one turn even while a reload swaps in a newer one.
    pub fn current(&self) -> Arc<AgentSnapshot> {
        self.current.read().clone()
    }

    /// Fetch persona and blocks and publish a fresh snapshot atomically.
    pub async fn reload(&self) -> Result<Arc<AgentSnapshot>> {
        let record = retry::execute(&self.policy, &self.breaker, "memory.get_agent", || {
            self.memory.get_agent(&self.agent_id)
        })
        .await?;

        let persona = record.persona.unwrap_or_default();
        let system_prompt = compose_system_prompt(&persona, &record.blocks);
        let snapshot = Arc::new(AgentSnapshot {
            agent_id: self.agent_id.clone(),
            persona,
            blocks: record.blocks,
            loaded_at: Instant::now(),
            system_prompt,
        });

        TraceEvent::SnapshotRefreshed {
            agent_id: self.agent_id.clone(),
            blocks: snapshot.blocks.len(),
            prompt_chars: snapshot.system_prompt.len(),
        }
        .emit();

        *self.current.write() = snapshot.clone();
        Ok(snapshot)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
