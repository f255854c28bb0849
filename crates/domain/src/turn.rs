use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which pipeline produced the assistant text for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPath {
    /// Direct streaming LLM call with the cached system prompt.
    Fast,
    /// Full request/response turn through the memory service.
    Memory,
    /// Synthesized fallback sentence (dependency failure or rejection).
    Fallback,
}

/// One user utterance and its reply.
///
/// Turns live in the bounded per-session history ring and are handed to
/// the background sync worker; the memory service is the system of record.
#[derive(Debug, Clone)]
pub struct Turn {
    pub user_text: String,
    pub assistant_text: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub path: TurnPath,
    /// False when the candidate reply was replaced by a validation fallback.
    pub validated: bool,
}
