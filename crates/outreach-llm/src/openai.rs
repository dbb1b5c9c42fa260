//! OpenAI-compatible chat adapter.
//!
//! Works against any endpoint that speaks `/chat/completions`, including
//! self-hosted gateways; only the base URL and key differ.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::LlmError;
use crate::{LlmConfig, LlmResult, TextGenerator};

const PROVIDER: &str = "openai";

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Build a client from the openai section of the configuration.
    ///
    /// The API key must be non-empty.
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let api_key = config.openai_api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(config.openai_timeout)
            .build()?;

        Ok(OpenAiGenerator {
            client,
            api_key,
            model: config.openai_model.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            max_tokens: config.openai_max_tokens,
            temperature: config.openai_temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
        let endpoint = format!("{}/chat/completions", self.base_url);
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt.trim()},
                {"role": "user", "content": user_prompt.trim()},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        debug!(model = %self.model, endpoint = %endpoint, "openai generate");
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response.json().await?;
        chat_content(&body)
    }
}

/// Extract assistant text from a chat-completions response.
///
/// Providers answer with either a plain string `message.content` or a list
/// of typed content parts; both shapes are accepted.
fn chat_content(body: &Value) -> LlmResult<String> {
    let message = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| LlmError::MalformedResponse {
            provider: PROVIDER,
            reason: "missing choices[0].message".to_string(),
        })?;

    match message.get("content") {
        Some(Value::String(text)) => Ok(text.trim().to_string()),
        Some(Value::Array(parts)) => {
            let joined = parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n");
            let joined = joined.trim().to_string();
            if joined.is_empty() {
                Err(LlmError::MalformedResponse {
                    provider: PROVIDER,
                    reason: "content parts held no text".to_string(),
                })
            } else {
                Ok(joined)
            }
        }
        _ => Err(LlmError::MalformedResponse {
            provider: PROVIDER,
            reason: "missing string message.content".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_requires_api_key() {
        let config = LlmConfig::default();
        assert!(matches!(
            OpenAiGenerator::new(&config).unwrap_err(),
            LlmError::MissingApiKey
        ));
    }

    #[test]
    fn chat_content_reads_plain_string() {
        let body = json!({
            "choices": [{"message": {"content": " hello there "}}]
        });
        assert_eq!(chat_content(&body).unwrap(), "hello there");
    }

    #[test]
    fn chat_content_joins_text_parts() {
        let body = json!({
            "choices": [{"message": {"content": [
                {"type": "text", "text": "first"},
                {"type": "image", "url": "ignored"},
                {"type": "text", "text": "second"},
            ]}}]
        });
        assert_eq!(chat_content(&body).unwrap(), "first\nsecond");
    }

    #[test]
    fn chat_content_rejects_empty_choices() {
        let body = json!({"choices": []});
        assert!(chat_content(&body).is_err());
    }

    #[test]
    fn chat_content_rejects_partless_content() {
        let body = json!({
            "choices": [{"message": {"content": [{"type": "image", "url": "x"}]}}]
        });
        assert!(chat_content(&body).is_err());
    }
}
