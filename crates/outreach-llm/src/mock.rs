//! Deterministic generator for tests and local development.

use async_trait::async_trait;
use serde_json::json;

use crate::{LlmResult, TextGenerator};

/// Returns predictable JSON payloads for each agent stage.
///
/// The stage is recognized from the `keys: …` line every stage prompt
/// carries, so this mock keeps working as prompt wording evolves.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockGenerator;

impl MockGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
        let prompt = format!("{system_prompt}\n{user_prompt}").to_lowercase();

        if prompt.contains("keys: subject, body, call_to_action") {
            return Ok(json!({
                "subject": "Quick idea for your outbound process",
                "body": "Noticed strong product momentum. We can help personalize outbound while keeping volume efficient.",
                "call_to_action": "Open to a 15-minute discussion next week?",
            })
            .to_string());
        }
        if prompt.contains("keys: score, critique") {
            return Ok(json!({"score": 8, "critique": "Good relevance and clarity."}).to_string());
        }
        if prompt.contains("keys: relevance, personalization, tone, clarity, rationale") {
            return Ok(json!({
                "relevance": 8,
                "personalization": 7,
                "tone": 8,
                "clarity": 8,
                "rationale": "Balanced message with clear CTA.",
            })
            .to_string());
        }

        Ok("{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_draft_stage_with_complete_payload() {
        let raw = MockGenerator::new()
            .generate(
                "You are an expert SDR assistant. Return only JSON.",
                "Return ONLY strict JSON with keys: subject, body, call_to_action.",
            )
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("subject").is_some());
        assert!(value.get("body").is_some());
        assert!(value.get("call_to_action").is_some());
    }

    #[tokio::test]
    async fn answers_critique_stage_with_accepting_score() {
        let raw = MockGenerator::new()
            .generate("reviewer", "Return ONLY strict JSON with keys: score, critique.")
            .await
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["score"], 8);
    }

    #[tokio::test]
    async fn falls_back_to_empty_object_for_unknown_stage() {
        let raw = MockGenerator::new().generate("a", "b").await.unwrap();
        assert_eq!(raw, "{}");
    }
}
