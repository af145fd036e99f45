use chrono::{DateTime, Utc};
use docbridge_core::Turn;
use serde::{Deserialize, Serialize};

/// An identifier-keyed history of question/answer turns.
///
/// Identity is the opaque id string alone. No document scoping is
/// enforced, so one conversation may span queries over several documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque conversation identifier.
    pub id: String,
    /// Turns in insertion order.
    pub turns: Vec<Turn>,
    /// When the conversation was created.
    pub created_at: DateTime<Utc>,
    /// When the last turn was appended.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Appends a turn and bumps the update timestamp.
    pub fn push_turn(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    /// Number of turns recorded so far.
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }
}
