use async_trait::async_trait;

use vl_domain::error::Result;

use crate::types::AgentRecord;

/// Trait over the memory service so the orchestrator and tests can swap
/// implementations.
///
/// All methods map to single requests; the caller wraps them in the retry
/// executor and circuit breaker as needed.
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// Health check under its own short deadline. Gates the full `ask`
    /// call; never retried.
    async fn probe(&self) -> Result<()>;

    /// Fetch the agent's persona and ordered memory blocks.
    async fn get_agent(&self, agent_id: &str) -> Result<AgentRecord>;

    /// One request/response turn through the memory service with the
    /// agent's full capability set (tools, memory reads/writes). May take
    /// seconds. Returns the assistant text, which is non-empty on a
    /// well-formed response but is NOT validated here.
    async fn ask(&self, agent_id: &str, user_text: &str) -> Result<String>;

    /// Append a (user, assistant) pair to the agent's durable history.
    /// A duplicate-turn rejection from the service counts as success.
    async fn append(&self, agent_id: &str, user: &str, assistant: &str) -> Result<()>;
}
