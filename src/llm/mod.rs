//! Hosted model endpoints
//!
//! Thin clients for the two HTTP services the daemon consumes: an
//! OpenAI-compatible chat-completions endpoint for intent classification
//! and an audio-transcriptions endpoint for captured speech.

mod client;

pub use client::GroqClient;

use async_trait::async_trait;

/// Errors from the hosted endpoints
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion contained no choices")]
    EmptyResponse,
}

/// A chat-completion backend usable for classification.
///
/// Kept as a trait so classifier tests can stub the network away.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one system + user exchange and return the raw completion text
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}
