//! Runtime configuration for generation adapters.
//!
//! Built once (usually via [`LlmConfig::from_env`]) and passed into
//! [`crate::build_generator`]; never mutated afterwards.

use std::str::FromStr;
use std::time::Duration;

use crate::error::LlmError;

/// Known generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Ollama,
    OpenAi,
    Mock,
}

impl FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" => Ok(LlmProvider::OpenAi),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(LlmError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Immutable adapter configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which adapter [`crate::build_generator`] should construct.
    pub provider: LlmProvider,

    pub ollama_model: String,
    pub ollama_base_url: String,
    pub ollama_max_tokens: u32,
    pub ollama_temperature: f32,
    pub ollama_timeout: Duration,

    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_max_tokens: u32,
    pub openai_temperature: f32,
    pub openai_timeout: Duration,

    /// Guard for [`crate::MockGenerator`]; the factory refuses to build the
    /// mock unless this is set.
    pub allow_mock: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            provider: LlmProvider::Ollama,
            ollama_model: "llama3.2:3b".to_string(),
            ollama_base_url: "http://127.0.0.1:11434".to_string(),
            ollama_max_tokens: 512,
            ollama_temperature: 0.2,
            ollama_timeout: Duration::from_secs(60),
            openai_api_key: String::new(),
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_max_tokens: 512,
            openai_temperature: 0.2,
            openai_timeout: Duration::from_secs(60),
            allow_mock: false,
        }
    }
}

impl LlmConfig {
    /// Build configuration from environment variables, falling back to the
    /// defaults above for anything unset or unparsable.
    ///
    /// Provider selection itself is validated later by the factory so a
    /// typo in `LLM_PROVIDER` surfaces as a clear error instead of a
    /// silent fallback.
    pub fn from_env() -> Result<Self, LlmError> {
        let defaults = LlmConfig::default();
        let provider = match std::env::var("LLM_PROVIDER") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.provider,
        };

        Ok(LlmConfig {
            provider,
            ollama_model: env_string("OLLAMA_MODEL_NAME", defaults.ollama_model),
            ollama_base_url: env_string("OLLAMA_BASE_URL", defaults.ollama_base_url),
            ollama_max_tokens: env_parse("OLLAMA_MAX_TOKENS", defaults.ollama_max_tokens),
            ollama_temperature: env_parse("OLLAMA_TEMPERATURE", defaults.ollama_temperature),
            ollama_timeout: Duration::from_secs_f64(env_parse(
                "OLLAMA_TIMEOUT_SECONDS",
                defaults.ollama_timeout.as_secs_f64(),
            )),
            openai_api_key: env_string("OPENAI_API_KEY", defaults.openai_api_key),
            openai_model: env_string("OPENAI_MODEL_NAME", defaults.openai_model),
            openai_base_url: env_string("OPENAI_BASE_URL", defaults.openai_base_url),
            openai_max_tokens: env_parse("OPENAI_MAX_TOKENS", defaults.openai_max_tokens),
            openai_temperature: env_parse("OPENAI_TEMPERATURE", defaults.openai_temperature),
            openai_timeout: Duration::from_secs_f64(env_parse(
                "OPENAI_TIMEOUT_SECONDS",
                defaults.openai_timeout.as_secs_f64(),
            )),
            allow_mock: env_flag("ALLOW_MOCK_LLM"),
        })
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|raw| {
            matches!(
                raw.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(false)
}
