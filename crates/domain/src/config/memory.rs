use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory service connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "d_memory_url")]
    pub base_url: String,
    /// Environment variable holding the API key. Unset means no auth header.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            base_url: d_memory_url(),
            api_key_env: None,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_memory_url() -> String {
    "http://localhost:8283".into()
}
