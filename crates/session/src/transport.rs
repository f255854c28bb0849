//! Room transport interface.
//!
//! The WebRTC media server, STT and TTS are collaborators behind this
//! seam: the core consumes finalized transcripts and participant events,
//! and produces transcript publications and assistant speech.

use async_trait::async_trait;

use vl_domain::error::Result;
use vl_domain::transcript::TranscriptEvent;

/// How a participant identity classifies for session policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    /// A human user. Presence keeps the session alive.
    Human,
    /// A foreign agent identity. More than one in the room is a conflict.
    Agent,
    /// This session's own participant.
    Local,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub identity: String,
    pub kind: ParticipantKind,
}

impl Participant {
    pub fn new(identity: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
        }
    }
}

/// Events the transport feeds into a session controller.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    ParticipantJoined(Participant),
    ParticipantLeft(Participant),
    /// A finalized user transcript from the STT collaborator.
    UserTranscript { text: String },
    /// Explicit shutdown request.
    Shutdown,
}

/// Outbound side of the room: transcript publication and speech.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    /// Publish a structured transcript event to the room.
    async fn publish_transcript(&self, event: TranscriptEvent) -> Result<()>;

    /// Hand assistant text to the TTS collaborator for synthesis.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Remove stale non-human participants left over from a previous
    /// serving agent. Called once when a job is accepted.
    async fn clear_stale_agents(&self, room_name: &str) -> Result<()>;
}
