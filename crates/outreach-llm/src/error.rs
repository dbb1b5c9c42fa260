//! Error types for generation adapters.

use thiserror::Error;

/// Errors raised by text-generation adapters and the provider factory.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("{provider} returned status {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered 200 but the payload did not have the
    /// expected shape.
    #[error("{provider} response malformed: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    /// Adapter construction was attempted without the credentials it needs.
    #[error("OPENAI_API_KEY is required when the provider is openai")]
    MissingApiKey,

    /// The configured provider name is not one we know how to build.
    #[error("unsupported LLM provider {0:?}; use \"ollama\", \"openai\", or \"mock\"")]
    UnsupportedProvider(String),

    /// The mock provider was requested outside of tests/dev.
    #[error("mock provider is disabled; set ALLOW_MOCK_LLM=true for tests and dev only")]
    MockDisabled,
}
