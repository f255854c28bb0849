use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fast-path LLM provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection settings for the direct streaming LLM provider.
///
/// Any OpenAI-compatible chat completions endpoint works here. The key is
/// resolved from `api_key_env` at client construction; `api_key` is an
/// inline override for tests and local setups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_llm_url")]
    pub base_url: String,
    #[serde(default = "d_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "d_model")]
    pub model: String,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            base_url: d_llm_url(),
            api_key_env: d_key_env(),
            api_key: None,
            model: d_model(),
            temperature: d_temperature(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_provider_id() -> String {
    "openai".into()
}
fn d_llm_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_model() -> String {
    "gpt-4o-mini".into()
}
fn d_temperature() -> f32 {
    0.7
}
