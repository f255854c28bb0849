use serde::Serialize;
use std::pin::Pin;

/// A boxed async stream, used for LLM streaming responses.
pub type BoxStream<'a, T> = Pin<Box<dyn futures_core::Stream<Item = T> + Send + 'a>>;

/// Events emitted during LLM streaming (provider-agnostic).
///
/// The fast path is text-only: there are deliberately no tool-call events
/// here. Turns that need tool execution go through the memory service.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// A text token chunk.
    #[serde(rename = "token")]
    Token { text: String },

    /// Stream is finished.
    #[serde(rename = "done")]
    Done { finish_reason: Option<String> },

    /// An error occurred during streaming.
    #[serde(rename = "error")]
    Error { message: String },
}
