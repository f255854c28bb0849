//! Process-wide room registry.
//!
//! Enforces the two assignment invariants: at most one serving agent per
//! room, and at most one live session per agent id. Both mappings live
//! under a single mutex so an acquire updates both or neither.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// "Room X is currently served by agent A in session S."
#[derive(Debug, Clone)]
pub struct RoomAssignment {
    pub room_name: String,
    pub agent_id: String,
    pub session_id: String,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Default)]
struct Maps {
    room_to_assignment: HashMap<String, RoomAssignment>,
    agent_to_session: HashMap<String, String>,
}

/// Process-global assignment registry. Created once at startup and passed
/// by reference into session controllers; never an ambient global.
#[derive(Default)]
pub struct RoomRegistry {
    inner: Mutex<Maps>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim a room for an agent session.
    ///
    /// Fails when the room is already assigned or the agent already has a
    /// live session elsewhere. On success both maps are updated under the
    /// same lock hold.
    pub fn try_acquire(
        &self,
        room_name: &str,
        agent_id: &str,
        session_id: &str,
    ) -> Option<RoomAssignment> {
        let mut maps = self.inner.lock();
        if maps.room_to_assignment.contains_key(room_name) {
            return None;
        }
        if maps.agent_to_session.contains_key(agent_id) {
            return None;
        }

        let assignment = RoomAssignment {
            room_name: room_name.to_owned(),
            agent_id: agent_id.to_owned(),
            session_id: session_id.to_owned(),
            acquired_at: Utc::now(),
        };
        maps.room_to_assignment
            .insert(room_name.to_owned(), assignment.clone());
        maps.agent_to_session
            .insert(agent_id.to_owned(), session_id.to_owned());
        Some(assignment)
    }

    /// Release a room and its agent mapping together.
    pub fn release(&self, room_name: &str) {
        let mut maps = self.inner.lock();
        if let Some(assignment) = maps.room_to_assignment.remove(room_name) {
            maps.agent_to_session.remove(&assignment.agent_id);
        }
    }

    pub fn lookup(&self, room_name: &str) -> Option<RoomAssignment> {
        self.inner.lock().room_to_assignment.get(room_name).cloned()
    }

    /// Number of live assignments (for monitoring and tests).
    pub fn assignment_count(&self) -> usize {
        self.inner.lock().room_to_assignment.len()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_lookup() {
        let reg = RoomRegistry::new();
        let a = reg.try_acquire("room-1", "agent-a", "sess-1").unwrap();
        assert_eq!(a.room_name, "room-1");

        let found = reg.lookup("room-1").unwrap();
        assert_eq!(found.agent_id, "agent-a");
        assert_eq!(found.session_id, "sess-1");
    }

    #[test]
    fn second_claim_on_same_room_fails() {
        let reg = RoomRegistry::new();
        assert!(reg.try_acquire("room-1", "agent-a", "sess-1").is_some());
        assert!(reg.try_acquire("room-1", "agent-b", "sess-2").is_none());
        assert_eq!(reg.assignment_count(), 1);
    }

    #[test]
    fn agent_cannot_hold_two_rooms() {
        let reg = RoomRegistry::new();
        assert!(reg.try_acquire("room-1", "agent-a", "sess-1").is_some());
        assert!(reg.try_acquire("room-2", "agent-a", "sess-2").is_none());
    }

    #[test]
    fn release_frees_both_maps() {
        let reg = RoomRegistry::new();
        reg.try_acquire("room-1", "agent-a", "sess-1").unwrap();
        reg.release("room-1");

        assert!(reg.lookup("room-1").is_none());
        // Agent is free again for a different room.
        assert!(reg.try_acquire("room-2", "agent-a", "sess-2").is_some());
    }

    #[test]
    fn release_unknown_room_is_noop() {
        let reg = RoomRegistry::new();
        reg.release("ghost");
        assert_eq!(reg.assignment_count(), 0);
    }

    #[test]
    fn failed_acquire_leaves_no_partial_state() {
        let reg = RoomRegistry::new();
        reg.try_acquire("room-1", "agent-a", "sess-1").unwrap();

        // agent-b fails on room-1; it must remain free to claim room-2.
        assert!(reg.try_acquire("room-1", "agent-b", "sess-2").is_none());
        assert!(reg.try_acquire("room-2", "agent-b", "sess-3").is_some());
    }
}
