//! Fast-path generator: direct streaming LLM call with the cached system
//! prompt and recent history. Assembles streamed tokens into a complete
//! reply; streaming is an implementation concern of the provider, the
//! contract here is a full string.

use std::sync::Arc;

use futures_util::StreamExt;

use vl_domain::error::{Error, Result};
use vl_domain::stream::StreamEvent;
use vl_providers::{ChatMessage, ChatRequest, LlmProvider};

use crate::history::TurnHistory;

pub struct FastPathGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl FastPathGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Reachability probe, used before a half-open breaker admits a call.
    pub async fn probe(&self) -> Result<()> {
        self.provider.probe().await
    }

    /// Generate a reply from `[system, ...history, user]`.
    ///
    /// No tool execution happens here; tool-capable turns must route
    /// through the memory path.
    pub async fn generate(
        &self,
        system_prompt: &str,
        history: &TurnHistory,
        user_text: &str,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(2 + history.len() * 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(history.to_messages());
        messages.push(ChatMessage::user(user_text));

        let mut stream = self
            .provider
            .chat_stream(ChatRequest {
                messages,
                model: None,
                temperature: None,
            })
            .await?;

        let mut text = String::new();
        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Token { text: chunk } => text.push_str(&chunk),
                StreamEvent::Done { .. } => break,
                StreamEvent::Error { message } => return Err(Error::Protocol(message)),
            }
        }
        Ok(text)
    }
}
