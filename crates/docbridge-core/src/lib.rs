//! Core types and error definitions shared across the Docbridge crates.
//!
//! # Main types
//!
//! - [`DocbridgeError`] — Unified error enum for all Docbridge subsystems.
//! - [`DocbridgeResult`] — Convenience alias for `Result<T, DocbridgeError>`.
//! - [`Turn`] — A single question/answer exchange within a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- Error types ---

/// Top-level error type for the Docbridge service.
///
/// Each variant corresponds to a subsystem that can produce errors. All
/// internal faults are converted into structured `{success:false, error}`
/// responses at the HTTP boundary; nothing is retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum DocbridgeError {
    /// An error from the remote workspace API (import, export, list).
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// The referenced document yielded no content after every fallback.
    #[error("Document error: {0}")]
    Document(String),

    /// A remote SQL statement completed in a non-success state.
    #[error("Statement error: {0}")]
    Statement(String),

    /// An error related to conversation storage or lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// An error from the AI completion provider.
    #[error("Completion error: {0}")]
    Completion(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request.
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error from the API gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`DocbridgeError`].
pub type DocbridgeResult<T> = Result<T, DocbridgeError>;

// --- Conversation types ---

/// A single question/answer exchange within a conversation.
///
/// Turns are insertion-ordered and immutable once appended to a
/// conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// The question as submitted by the client.
    pub question: String,
    /// The answer produced by the completion provider.
    pub answer: String,
    /// UTC timestamp of when the turn was recorded.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary key-value metadata attached by the provider (model id,
    /// token usage, ...).
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Turn {
    /// Creates a new turn stamped with the current time.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }
}
