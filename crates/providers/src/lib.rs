//! `vl-providers` — fast-path LLM adapters for VoiceLoop.
//!
//! The fast path issues a streaming chat-completion call with the cached
//! system prompt and recent history and assembles the streamed tokens into
//! a full reply. It is text-only by contract: no tool definitions are ever
//! sent, and turns that need tools route through the memory service.

pub mod openai_compat;
pub mod traits;
mod util;

pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatMessage, ChatRequest, LlmProvider};

use std::sync::Arc;

use vl_domain::config::{LlmConfig, ReliabilityConfig};
use vl_domain::error::Result;

/// Build the configured provider.
///
/// Only the OpenAI-compatible wire format is implemented; every hosted and
/// local endpoint this core targets (OpenAI, Azure-style gateways, vLLM,
/// Ollama) speaks it.
pub fn create_provider(
    cfg: &LlmConfig,
    reliability: &ReliabilityConfig,
) -> Result<Arc<dyn LlmProvider>> {
    let provider = OpenAiCompatProvider::from_config(cfg, reliability)?;
    Ok(Arc::new(provider))
}
