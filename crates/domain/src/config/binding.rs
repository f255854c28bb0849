use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent binding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The nominated primary agent this process serves.
///
/// Immutable after startup. The dispatch gate refuses jobs for any other
/// agent name, and the memory loader only ever loads this agent id.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BindingConfig {
    /// Opaque agent id in the memory service (required).
    #[serde(default)]
    pub agent_id: String,
    /// Human label enforced by the dispatch gate (required).
    #[serde(default)]
    pub agent_name: String,
}
