use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role on the transcript channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A structured transcript event published to the room.
///
/// Within one turn the user event is always published before the
/// assistant event; the timestamps make that ordering observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEvent {
    /// Build an event stamped with the current wall-clock time.
    pub fn now(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}
