//! Derived traversal state of a session.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Where a session stands in the routing conversation.
///
/// Derived from the stored record, never stored itself:
/// ```text
/// Traversing ──(no match)──► ClarificationPending ──(user reply)──► Traversing
///      │                                                               │
///      └────────────────────(leaf reached)──────────► Final ◄──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalState {
    /// Ready to classify the next user message
    Traversing,
    /// A clarifying question is waiting for the user
    ClarificationPending,
    /// A leaf department was reached
    Final,
}

impl TraversalState {
    /// Derive the state from a session record.
    pub fn of(session: &Session) -> Self {
        if session.is_final {
            Self::Final
        } else if session.awaiting_user() {
            Self::ClarificationPending
        } else {
            Self::Traversing
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Final
    }
}

impl fmt::Display for TraversalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Traversing => write!(f, "Traversing"),
            Self::ClarificationPending => write!(f, "ClarificationPending"),
            Self::Final => write!(f, "Final"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_agent::Message;

    #[test]
    fn test_state_derivation() {
        let mut session = Session::new("s1");
        assert_eq!(TraversalState::of(&session), TraversalState::Traversing);

        session.history.push(Message::user("my scholarship is late"));
        assert_eq!(TraversalState::of(&session), TraversalState::Traversing);

        session.history.push(Message::assistant("Which scholarship?"));
        assert_eq!(TraversalState::of(&session), TraversalState::ClarificationPending);

        session.is_final = true;
        assert_eq!(TraversalState::of(&session), TraversalState::Final);
        assert!(TraversalState::Final.is_terminal());
    }
}
