use crate::conversation::Conversation;
use docbridge_core::Turn;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory conversation store, the sole owner of all conversations.
///
/// Appends take the write lock, which serializes concurrent appends to the
/// same conversation id; no turn is lost or interleaved. The default store
/// is unbounded; [`ConversationStore::with_capacity`] evicts the
/// least-recently-updated conversation once the bound is reached.
pub struct ConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
    capacity: Option<usize>,
}

impl ConversationStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            capacity: None,
        }
    }

    /// Creates a store holding at most `capacity` conversations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Appends a turn to the conversation, creating it on first use.
    /// Returns the recorded turn.
    pub async fn append(
        &self,
        id: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Turn {
        let turn = Turn::new(question, answer, metadata);
        let mut conversations = self.conversations.write().await;

        if !conversations.contains_key(id) {
            if let Some(capacity) = self.capacity {
                if conversations.len() >= capacity {
                    evict_stalest(&mut conversations);
                }
            }
            conversations.insert(id.to_string(), Conversation::new(id));
        }

        if let Some(conversation) = conversations.get_mut(id) {
            conversation.push_turn(turn.clone());
        }
        turn
    }

    /// Snapshot of the conversation's turns in insertion order. Unknown
    /// ids yield an empty history.
    pub async fn history(&self, id: &str) -> Vec<Turn> {
        self.conversations
            .read()
            .await
            .get(id)
            .map(|c| c.turns.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the conversation, creating an empty one if absent.
    pub async fn get_or_create(&self, id: &str) -> Conversation {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(id.to_string())
            .or_insert_with(|| Conversation::new(id))
            .clone()
    }

    /// Removes the conversation. Clearing an unknown id is a no-op;
    /// returns whether anything was removed.
    pub async fn clear(&self, id: &str) -> bool {
        let removed = self.conversations.write().await.remove(id).is_some();
        debug!(conversation_id = %id, removed, "conversation cleared");
        removed
    }

    /// Number of conversations currently held.
    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    /// True when no conversations are held.
    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn evict_stalest(conversations: &mut HashMap<String, Conversation>) {
    let stalest = conversations
        .values()
        .min_by_key(|c| c.updated_at)
        .map(|c| c.id.clone());
    if let Some(id) = stalest {
        debug!(conversation_id = %id, "evicting stalest conversation");
        conversations.remove(&id);
    }
}
