use super::{build_messages, parse_chat_response, Completion, CompletionBackend};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use docbridge_core::{DocbridgeError, DocbridgeResult, Turn};

/// OpenAI-compatible completion backend.
///
/// Works with any provider implementing the chat completions API.
pub struct OpenAiBackend {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Creates a backend from a validated [`ProviderConfig`].
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(
        &self,
        document: &[u8],
        question: &str,
        history: &[Turn],
    ) -> DocbridgeResult<Completion> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "messages": build_messages(&self.config, document, question, history),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| DocbridgeError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(DocbridgeError::Completion(format!(
                "completions API error {status}: {resp_body}"
            )));
        }

        parse_chat_response(&resp_body)
    }
}
