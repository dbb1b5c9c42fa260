//! Ollama adapter calling `/api/generate` with deterministic settings.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::LlmError;
use crate::{LlmConfig, LlmResult, TextGenerator};

const PROVIDER: &str = "ollama";

/// Client for a local or remote Ollama server.
#[derive(Debug)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
}

impl OllamaGenerator {
    /// Build a client from the ollama section of the configuration.
    pub fn new(config: &LlmConfig) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.ollama_timeout)
            .build()?;

        Ok(OllamaGenerator {
            client,
            model: config.ollama_model.clone(),
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            max_tokens: config.ollama_max_tokens,
            temperature: config.ollama_temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
        let endpoint = format!("{}/api/generate", self.base_url);
        let payload = json!({
            "model": self.model,
            "system": system_prompt.trim(),
            "prompt": user_prompt.trim(),
            "stream": false,
            "options": {
                "num_predict": self.max_tokens,
                "temperature": self.temperature,
            },
        });

        debug!(model = %self.model, endpoint = %endpoint, "ollama generate");
        let response = self.client.post(&endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: Value = response.json().await?;
        response_text(&body)
    }
}

/// Pull the generated text out of an `/api/generate` response body.
fn response_text(body: &Value) -> LlmResult<String> {
    match body.get("response").and_then(Value::as_str) {
        Some(text) => Ok(text.trim().to_string()),
        None => Err(LlmError::MalformedResponse {
            provider: PROVIDER,
            reason: "missing string field 'response'".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_text_extracts_and_trims() {
        let body = json!({"response": "  {\"subject\": \"hi\"}  "});
        assert_eq!(response_text(&body).unwrap(), "{\"subject\": \"hi\"}");
    }

    #[test]
    fn response_text_rejects_missing_field() {
        let body = json!({"done": true});
        let err = response_text(&body).unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse { .. }));
    }

    #[test]
    fn response_text_rejects_non_string_field() {
        let body = json!({"response": 42});
        assert!(response_text(&body).is_err());
    }

    #[test]
    fn new_strips_trailing_slash_from_base_url() {
        let config = LlmConfig {
            ollama_base_url: "http://127.0.0.1:11434/".to_string(),
            ..LlmConfig::default()
        };
        let client = OllamaGenerator::new(&config).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:11434");
    }
}
