//! Text-generation capability for the outreach agent.
//!
//! This crate defines the [`TextGenerator`] trait consumed by the
//! orchestrator, plus the provider adapters that implement it:
//!
//! - [`OllamaGenerator`]: local/remote Ollama `/api/generate`
//! - [`OpenAiGenerator`]: OpenAI-compatible `/chat/completions`
//! - [`MockGenerator`]: deterministic payloads for tests and dev
//!
//! Provider selection is centralized in [`build_generator`] so agent logic
//! never branches on provider names.

use async_trait::async_trait;

mod config;
mod error;
mod factory;
mod mock;
mod ollama;
mod openai;

pub use config::{LlmConfig, LlmProvider};
pub use error::LlmError;
pub use factory::build_generator;
pub use mock::MockGenerator;
pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

/// Result type for generation operations.
pub type LlmResult<T> = std::result::Result<T, LlmError>;

/// Common async interface for all language-model adapters.
///
/// Implementations are cheap to share behind an `Arc<dyn TextGenerator>`;
/// each call is one full (non-streaming) completion.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Generate a text response for the provided system/user prompts.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String>;
}
