//! Wire DTOs for the memory service plus the decoded [`AgentRecord`] the
//! rest of the core works with.
//!
//! The service returns the agent's memory either as an object wrapping a
//! block list or as a bare list. Both shapes decode into the same ordered
//! `Vec<MemoryBlock>` here so nothing downstream ever touches raw JSON.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Decoded agent record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A labeled memory string owned by an agent. Order matters: blocks are
/// composed into the system prompt in service-returned order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    pub label: String,
    pub value: String,
}

/// Persona and ordered memory blocks for one agent.
#[derive(Debug, Clone, Default)]
pub struct AgentRecord {
    pub name: String,
    pub persona: Option<String>,
    pub blocks: Vec<MemoryBlock>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Agent wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub(crate) struct AgentDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub memory: Option<MemoryShapeDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockDto {
    pub label: String,
    #[serde(default)]
    pub value: String,
}

/// The two memory payload shapes the service is known to emit.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MemoryShapeDto {
    Wrapped { blocks: Vec<BlockDto> },
    Inline(Vec<BlockDto>),
}

impl From<AgentDto> for AgentRecord {
    fn from(dto: AgentDto) -> Self {
        let blocks = match dto.memory {
            Some(MemoryShapeDto::Wrapped { blocks }) | Some(MemoryShapeDto::Inline(blocks)) => {
                blocks
                    .into_iter()
                    .map(|b| MemoryBlock {
                        label: b.label,
                        value: b.value,
                    })
                    .collect()
            }
            None => Vec::new(),
        };
        Self {
            name: dto.name,
            persona: dto.persona,
            blocks,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub messages: Vec<OutgoingMessage>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OutgoingMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IncomingMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// The last assistant message's text, verbatim.
    ///
    /// Whitespace-only content is returned as-is; rejecting it is the
    /// response validator's job, not the wire layer's.
    pub(crate) fn assistant_text(self) -> Option<String> {
        self.messages.into_iter().rev().find_map(|m| {
            let is_assistant = m.role.as_deref() == Some("assistant")
                || m.message_type.as_deref() == Some("assistant_message");
            if !is_assistant {
                return None;
            }
            m.content.or(m.text)
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_memory_shape_decodes() {
        let json = r#"{
            "name": "Ivy",
            "persona": "A patient helper.",
            "memory": { "blocks": [
                { "label": "human", "value": "Likes blue." },
                { "label": "notes", "value": "Prefers short answers." }
            ]}
        }"#;
        let dto: AgentDto = serde_json::from_str(json).unwrap();
        let record: AgentRecord = dto.into();
        assert_eq!(record.name, "Ivy");
        assert_eq!(record.persona.as_deref(), Some("A patient helper."));
        assert_eq!(record.blocks.len(), 2);
        assert_eq!(record.blocks[0].label, "human");
        assert_eq!(record.blocks[1].label, "notes");
    }

    #[test]
    fn inline_memory_shape_decodes() {
        let json = r#"{
            "name": "Ivy",
            "memory": [
                { "label": "z-last", "value": "1" },
                { "label": "a-first", "value": "2" }
            ]
        }"#;
        let dto: AgentDto = serde_json::from_str(json).unwrap();
        let record: AgentRecord = dto.into();
        assert!(record.persona.is_none());
        // Service order preserved, not label order.
        assert_eq!(record.blocks[0].label, "z-last");
        assert_eq!(record.blocks[1].label, "a-first");
    }

    #[test]
    fn missing_memory_yields_empty_blocks() {
        let json = r#"{ "name": "Ivy" }"#;
        let dto: AgentDto = serde_json::from_str(json).unwrap();
        let record: AgentRecord = dto.into();
        assert!(record.blocks.is_empty());
    }

    #[test]
    fn assistant_text_picks_last_assistant_message() {
        let json = r#"{ "messages": [
            { "role": "user", "content": "hi" },
            { "role": "assistant", "content": "first" },
            { "role": "assistant", "content": "second" }
        ]}"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.assistant_text().as_deref(), Some("second"));
    }

    #[test]
    fn assistant_text_accepts_message_type_and_text_fields() {
        let json = r#"{ "messages": [
            { "message_type": "assistant_message", "text": "typed reply" }
        ]}"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.assistant_text().as_deref(), Some("typed reply"));
    }

    #[test]
    fn assistant_text_preserves_whitespace_verbatim() {
        let json = r#"{ "messages": [ { "role": "assistant", "content": "   " } ] }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        // Validation happens upstream; the wire layer must not trim.
        assert_eq!(resp.assistant_text().as_deref(), Some("   "));
    }

    #[test]
    fn assistant_text_none_without_assistant_message() {
        let json = r#"{ "messages": [ { "role": "user", "content": "hi" } ] }"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert!(resp.assistant_text().is_none());
    }
}
