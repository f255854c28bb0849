//! Bounded ring of recent turns.
//!
//! Mutated only by the orchestrator's serialized turn loop; the memory
//! service is the system of record, this ring only feeds the fast path.

use std::collections::VecDeque;

use vl_domain::turn::Turn;
use vl_providers::ChatMessage;

pub struct TurnHistory {
    window: usize,
    turns: VecDeque<Turn>,
}

impl TurnHistory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            turns: VecDeque::with_capacity(window),
        }
    }

    /// Record a completed turn, evicting the oldest past the window.
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() == self.window {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Interleaved user/assistant messages, oldest first, for the fast
    /// path's chat request.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2);
        for turn in &self.turns {
            messages.push(ChatMessage::user(&turn.user_text));
            messages.push(ChatMessage::assistant(&turn.assistant_text));
        }
        messages
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vl_domain::transcript::Role;
    use vl_domain::turn::TurnPath;

    fn turn(n: usize) -> Turn {
        let now = Utc::now();
        Turn {
            user_text: format!("question {n}"),
            assistant_text: format!("answer {n}"),
            started_at: now,
            finished_at: now,
            path: TurnPath::Memory,
            validated: true,
        }
    }

    #[test]
    fn oldest_turn_evicted_at_window() {
        let mut h = TurnHistory::new(3);
        for n in 0..5 {
            h.push(turn(n));
        }
        assert_eq!(h.len(), 3);

        let messages = h.to_messages();
        assert_eq!(messages.len(), 6);
        // Turns 0 and 1 fell out of the window.
        assert_eq!(messages[0].content, "question 2");
        assert_eq!(messages[5].content, "answer 4");
    }

    #[test]
    fn messages_interleave_user_then_assistant() {
        let mut h = TurnHistory::new(10);
        h.push(turn(0));
        let messages = h.to_messages();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn clear_empties_the_ring() {
        let mut h = TurnHistory::new(10);
        h.push(turn(0));
        h.push(turn(1));
        h.clear();
        assert!(h.is_empty());
        assert!(h.to_messages().is_empty());
    }
}
