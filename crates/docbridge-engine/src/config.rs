use docbridge_core::{DocbridgeError, DocbridgeResult};
use serde::{Deserialize, Serialize};

/// Supported completion providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// A model-serving endpoint inside the connected workspace.
    Workspace,
    /// An OpenAI-compatible chat completions API.
    OpenAi,
}

/// Configuration for the completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider to talk to.
    pub provider: AiProvider,
    /// Model or serving-endpoint identifier.
    pub model_id: String,
    /// API key for external providers. The workspace provider reuses the
    /// workspace token instead.
    #[serde(default)]
    pub api_key: String,
    /// Override for the provider base URL.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// How many prior turns to replay into the prompt.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
    /// How much document text to inline into the system prompt.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_history_turns() -> usize {
    20
}

fn default_max_document_chars() -> usize {
    24_000
}

impl ProviderConfig {
    /// Checks the config before any remote call is attempted.
    pub fn validate(&self) -> DocbridgeResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(DocbridgeError::Config(
                "model_id must not be empty".to_string(),
            ));
        }
        if self.provider == AiProvider::OpenAi && self.api_key.trim().is_empty() {
            return Err(DocbridgeError::Config(
                "OpenAI API key required".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL for external providers.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                AiProvider::OpenAi => "https://api.openai.com",
                // The workspace provider derives its URL from the
                // connected workspace host.
                AiProvider::Workspace => "",
            }
        }
    }
}
