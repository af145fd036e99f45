//! Query orchestration: resolves document bytes through the store
//! gateway, invokes the configured AI completion backend with accumulated
//! conversation history, and records each turn.

pub mod backends;
pub mod config;
pub mod engine;

pub use backends::openai::OpenAiBackend;
pub use backends::serving::ServingBackend;
pub use backends::{Completion, CompletionBackend};
pub use config::{AiProvider, ProviderConfig};
pub use engine::{QueryEngine, QueryReply};

use docbridge_core::DocbridgeResult;
use std::sync::Arc;

/// Builds the backend named by the config, validating it first.
///
/// `host` and `token` identify the connected workspace; they are only
/// used by the workspace serving provider.
pub fn build_backend(
    config: &ProviderConfig,
    host: &str,
    token: &str,
) -> DocbridgeResult<Arc<dyn CompletionBackend>> {
    config.validate()?;
    Ok(match config.provider {
        AiProvider::Workspace => Arc::new(ServingBackend::new(config.clone(), host, token)),
        AiProvider::OpenAi => Arc::new(OpenAiBackend::new(config.clone())),
    })
}
