use crate::backends::CompletionBackend;
use docbridge_core::{DocbridgeError, DocbridgeResult, Turn};
use docbridge_session::ConversationStore;
use docbridge_workspace::StoreGateway;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a successful query.
#[derive(Debug, Clone)]
pub struct QueryReply {
    /// The generated answer.
    pub answer: String,
    /// The conversation the turn was recorded under, minted fresh when
    /// the request carried none.
    pub conversation_id: String,
    /// Provider metadata for this turn.
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Threads a question about a stored document through the completion
/// backend, carrying the conversation history along.
pub struct QueryEngine {
    workspace: Arc<StoreGateway>,
    store: Arc<ConversationStore>,
    backend: Arc<dyn CompletionBackend>,
}

impl QueryEngine {
    /// Creates an engine over the given gateway, store, and backend.
    pub fn new(
        workspace: Arc<StoreGateway>,
        store: Arc<ConversationStore>,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            workspace,
            store,
            backend,
        }
    }

    /// Answers `question` about the document at `document_path`.
    ///
    /// Resolves document bytes through the gateway's fallback cascade; an
    /// unavailable document fails immediately, without retry. On success
    /// the new turn is appended to the conversation before returning.
    pub async fn query(
        &self,
        document_path: &str,
        question: &str,
        conversation_id: Option<String>,
    ) -> DocbridgeResult<QueryReply> {
        let conversation_id = conversation_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let outcome = self.workspace.export(document_path).await;
        let Some(document) = outcome.bytes else {
            warn!(
                path = %document_path,
                attempts = outcome.attempts.len(),
                "document content not found"
            );
            return Err(DocbridgeError::Document(format!(
                "document content not found: {document_path}"
            )));
        };

        let history = self.store.history(&conversation_id).await;
        let completion = self
            .backend
            .complete(&document, question, &history)
            .await?;

        self.store
            .append(
                &conversation_id,
                question,
                &completion.answer,
                completion.metadata.clone(),
            )
            .await;

        info!(
            conversation_id = %conversation_id,
            path = %document_path,
            history_turns = history.len(),
            "query answered"
        );
        Ok(QueryReply {
            answer: completion.answer,
            conversation_id,
            metadata: completion.metadata,
        })
    }

    /// The conversation's turns in submission order.
    pub async fn history(&self, conversation_id: &str) -> Vec<Turn> {
        self.store.history(conversation_id).await
    }

    /// Drops the conversation. Unknown ids are a no-op.
    pub async fn clear(&self, conversation_id: &str) -> bool {
        self.store.clear(conversation_id).await
    }
}
