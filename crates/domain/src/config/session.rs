use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session behavior
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turn routing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    /// Fast path allowed; memory path used for fallback and tool turns.
    Hybrid,
    /// All turns go through the memory service (tools work).
    MemoryOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "d_mode")]
    pub mode: AgentMode,
    /// Seconds without a finalized user transcript before draining.
    #[serde(default = "d_300")]
    pub idle_timeout_secs: u64,
    /// Reload persona/blocks every this many completed user turns.
    #[serde(default = "d_5")]
    pub memory_refresh_every_turns: u32,
    /// Number of recent turns fed to the fast path.
    #[serde(default = "d_10")]
    pub history_window: usize,
    /// Grace period for background work when the session drains.
    #[serde(default = "d_2000")]
    pub drain_grace_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: d_mode(),
            idle_timeout_secs: 300,
            memory_refresh_every_turns: 5,
            history_window: 10,
            drain_grace_ms: 2000,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_mode() -> AgentMode {
    AgentMode::MemoryOnly
}
fn d_300() -> u64 {
    300
}
fn d_5() -> u32 {
    5
}
fn d_10() -> usize {
    10
}
fn d_2000() -> u64 {
    2000
}
