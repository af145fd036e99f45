use super::{build_messages, parse_chat_response, Completion, CompletionBackend};
use crate::config::ProviderConfig;
use async_trait::async_trait;
use docbridge_core::{DocbridgeError, DocbridgeResult, Turn};

/// Completion backend hitting a model-serving endpoint inside the
/// connected workspace, authenticated with the workspace token.
pub struct ServingBackend {
    config: ProviderConfig,
    host: String,
    token: String,
    http: reqwest::Client,
}

impl ServingBackend {
    /// Creates a backend for the serving endpoint named by
    /// `config.model_id` on the given workspace.
    pub fn new(config: ProviderConfig, host: impl Into<String>, token: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            config,
            host: host.trim_end_matches('/').to_string(),
            token: token.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CompletionBackend for ServingBackend {
    async fn complete(
        &self,
        document: &[u8],
        question: &str,
        history: &[Turn],
    ) -> DocbridgeResult<Completion> {
        let url = format!(
            "{}/serving-endpoints/{}/invocations",
            self.host, self.config.model_id
        );

        let body = serde_json::json!({
            "messages": build_messages(&self.config, document, question, history),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
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
                "serving endpoint error {status}: {resp_body}"
            )));
        }

        parse_chat_response(&resp_body)
    }
}
