//! Per-room job acceptance.
//!
//! The gate is the front door of the process: it locks the room in the
//! registry, enforces the configured primary agent, and rejects duplicate
//! dispatches. Decisions surface to the transport; they never reach the
//! user.

use std::sync::Arc;

use uuid::Uuid;

use vl_domain::config::BindingConfig;
use vl_domain::trace::TraceEvent;

use crate::registry::{RoomAssignment, RoomRegistry};

/// A job from the transport: serve `room_name` with the named agent.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub room_name: String,
    pub agent_id: String,
    pub agent_name: String,
}

#[derive(Debug)]
pub enum DispatchDecision {
    /// The room is locked; bring up a session for this assignment.
    Accepted(RoomAssignment),
    /// Another live session already serves the room.
    RejectedDuplicate {
        existing_agent_id: String,
        existing_session_id: String,
    },
    /// The job names an agent this process is not bound to. The session
    /// must refuse to switch agents.
    RejectedWrongAgent {
        requested: String,
        configured: String,
    },
}

pub struct DispatchGate {
    binding: BindingConfig,
    registry: Arc<RoomRegistry>,
}

impl DispatchGate {
    pub fn new(binding: BindingConfig, registry: Arc<RoomRegistry>) -> Self {
        Self { binding, registry }
    }

    pub fn accept(&self, req: &JobRequest) -> DispatchDecision {
        if let Some(existing) = self.registry.lookup(&req.room_name) {
            tracing::warn!(
                room = %req.room_name,
                agent_id = %existing.agent_id,
                session_id = %existing.session_id,
                "duplicate dispatch rejected"
            );
            TraceEvent::DispatchRejected {
                room: req.room_name.clone(),
                reason: "duplicate".into(),
            }
            .emit();
            return DispatchDecision::RejectedDuplicate {
                existing_agent_id: existing.agent_id,
                existing_session_id: existing.session_id,
            };
        }

        if req.agent_name != self.binding.agent_name {
            tracing::warn!(
                room = %req.room_name,
                requested = %req.agent_name,
                configured = %self.binding.agent_name,
                "dispatch for wrong agent rejected"
            );
            TraceEvent::DispatchRejected {
                room: req.room_name.clone(),
                reason: "wrong-agent".into(),
            }
            .emit();
            return DispatchDecision::RejectedWrongAgent {
                requested: req.agent_name.clone(),
                configured: self.binding.agent_name.clone(),
            };
        }

        let session_id = Uuid::new_v4().to_string();
        match self
            .registry
            .try_acquire(&req.room_name, &self.binding.agent_id, &session_id)
        {
            Some(assignment) => {
                tracing::info!(
                    room = %assignment.room_name,
                    session_id = %assignment.session_id,
                    "dispatch accepted"
                );
                DispatchDecision::Accepted(assignment)
            }
            None => {
                // Raced with another acceptor between lookup and acquire.
                let existing = self.registry.lookup(&req.room_name);
                TraceEvent::DispatchRejected {
                    room: req.room_name.clone(),
                    reason: "duplicate".into(),
                }
                .emit();
                DispatchDecision::RejectedDuplicate {
                    existing_agent_id: existing
                        .as_ref()
                        .map(|a| a.agent_id.clone())
                        .unwrap_or_default(),
                    existing_session_id: existing
                        .map(|a| a.session_id)
                        .unwrap_or_default(),
                }
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
