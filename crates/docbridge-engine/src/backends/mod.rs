pub mod openai;
pub mod serving;

use crate::config::ProviderConfig;
use async_trait::async_trait;
use docbridge_core::{DocbridgeError, DocbridgeResult, Turn};
use std::collections::HashMap;

/// Answer plus provider-reported metadata.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated answer text.
    pub answer: String,
    /// Provider metadata (model id, token usage, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

/// The AI completion capability.
///
/// The history-to-prompt mapping is the backend's concern; callers hand
/// over the document bytes, the question, and the prior turns verbatim.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Produce an answer about `document` given the conversation so far.
    async fn complete(
        &self,
        document: &[u8],
        question: &str,
        history: &[Turn],
    ) -> DocbridgeResult<Completion>;
}

/// Builds the chat-completions message list shared by both HTTP backends:
/// a system message carrying the document text, the replayed history, then
/// the new question.
pub(crate) fn build_messages(
    config: &ProviderConfig,
    document: &[u8],
    question: &str,
    history: &[Turn],
) -> Vec<serde_json::Value> {
    let mut text = String::from_utf8_lossy(document).into_owned();
    if text.len() > config.max_document_chars {
        let mut cut = config.max_document_chars;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }

    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": format!(
            "You answer questions about the document below. \
             Base every answer on its content.\n\n{text}"
        ),
    })];

    let start = history.len().saturating_sub(config.max_history_turns);
    for turn in &history[start..] {
        messages.push(serde_json::json!({"role": "user", "content": turn.question}));
        messages.push(serde_json::json!({"role": "assistant", "content": turn.answer}));
    }

    messages.push(serde_json::json!({"role": "user", "content": question}));
    messages
}

/// Parses an OpenAI-compatible chat completions response body into a
/// [`Completion`], folding the model id and token usage into metadata.
pub(crate) fn parse_chat_response(body: &serde_json::Value) -> DocbridgeResult<Completion> {
    let answer = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            DocbridgeError::Completion("missing content in completion response".to_string())
        })?
        .to_string();

    let mut metadata = HashMap::new();
    if let Some(model) = body["model"].as_str() {
        metadata.insert("model".to_string(), serde_json::json!(model));
    }
    if body["usage"].is_object() {
        metadata.insert("usage".to_string(), body["usage"].clone());
    }

    Ok(Completion { answer, metadata })
}
