//! Structured-output extraction with bounded self-repair.
//!
//! Producers return free text that is supposed to encode a JSON object.
//! This module tolerates the usual formatting noise (markdown fences,
//! prose around the object), validates the required keys for the stage,
//! and, when the payload is still invalid, asks the same generator to
//! repair its own output a bounded number of times.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use outreach_llm::{LlmError, TextGenerator};

/// Default number of self-repair rounds.
pub const DEFAULT_MAX_REPAIR_RETRIES: u32 = 2;

const REPAIR_SYSTEM_PROMPT: &str = "You fix invalid JSON. Return JSON only.";

/// Required-key contract per pipeline stage.
///
/// These key sets are the only contract with the generation capability;
/// no other framing is assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSchema {
    /// Initial draft and rewrites.
    Draft,
    /// Reflection critique.
    Critique,
    /// Final dimension scoring.
    Evaluation,
}

impl StageSchema {
    /// The keys a payload for this stage must contain.
    pub const fn required_keys(self) -> &'static [&'static str] {
        match self {
            StageSchema::Draft => &["subject", "body", "call_to_action"],
            StageSchema::Critique => &["score", "critique"],
            StageSchema::Evaluation => {
                &["relevance", "personalization", "tone", "clarity", "rationale"]
            }
        }
    }
}

/// Validation failures for structured producer output.
#[derive(Debug, Error)]
pub enum StructuredOutputError {
    /// The candidate parsed but is not a JSON object.
    #[error("response is not a JSON object")]
    NotAnObject,

    /// The object is missing required keys.
    #[error("response missing required keys: {}", keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    /// The candidate is not valid JSON at all.
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    /// Every repair round produced invalid output; fatal for the run.
    #[error("could not obtain valid structured output after {attempts} repair attempts")]
    RepairExhausted {
        attempts: u32,
        #[source]
        last: Box<StructuredOutputError>,
    },

    /// A repair-round generation call itself failed.
    #[error(transparent)]
    Generation(#[from] LlmError),
}

/// Remove a wrapping markdown code fence, if present.
///
/// Only the first and last lines are inspected; fences inside the payload
/// are left alone.
fn unwrap_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if lines.first().is_some_and(|line| line.starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.starts_with("```")) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Extract the first balanced `{…}` object from `text`.
///
/// A three-state scanner (normal / in-string / escape-pending) with a
/// depth counter, so braces inside string values and escaped quotes never
/// terminate the object early. When no balanced object completes, the
/// input is returned unchanged; the subsequent JSON parse produces the
/// real error.
fn first_balanced_object(text: &str) -> &str {
    let Some(start) = text.find('{') else {
        return text;
    };

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[start..start + offset + ch.len_utf8()];
                }
            }
            _ => {}
        }
    }
    text
}

/// Parse one candidate and enforce required-key presence.
pub fn validate_candidate(
    candidate: &str,
    required_keys: &[&str],
) -> Result<Map<String, Value>, StructuredOutputError> {
    let unwrapped = unwrap_fences(candidate);
    let isolated = first_balanced_object(&unwrapped).trim();

    let parsed: Value = serde_json::from_str(isolated)?;
    let Value::Object(object) = parsed else {
        return Err(StructuredOutputError::NotAnObject);
    };

    let missing: Vec<String> = required_keys
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(StructuredOutputError::MissingKeys { keys: missing });
    }
    Ok(object)
}

fn repair_prompt(required_keys: &[&str], candidate: &str) -> String {
    format!(
        "Repair this output into valid JSON with exactly these keys: {}.\n\
         Do not add markdown.\n\n\
         Input:\n{candidate}",
        required_keys.join(", "),
    )
}

/// Validate raw producer output against a stage schema, with bounded
/// self-repair.
///
/// A successful first-pass parse makes zero generation calls. Otherwise up
/// to `max_repair_retries` repair rounds run; if all fail, the final
/// validation error is raised and the caller must treat it as fatal for
/// the run.
pub async fn parse_with_repair(
    llm: &dyn TextGenerator,
    raw: &str,
    schema: StageSchema,
    max_repair_retries: u32,
) -> Result<Map<String, Value>, StructuredOutputError> {
    let required_keys = schema.required_keys();

    let mut candidate = raw.to_string();
    let mut last_error = match validate_candidate(&candidate, required_keys) {
        Ok(object) => return Ok(object),
        Err(err) => err,
    };

    for round in 1..=max_repair_retries {
        debug!(round, schema = ?schema, error = %last_error, "repairing structured output");
        candidate = llm
            .generate(REPAIR_SYSTEM_PROMPT, &repair_prompt(required_keys, &candidate))
            .await?;
        match validate_candidate(&candidate, required_keys) {
            Ok(object) => return Ok(object),
            Err(err) => last_error = err,
        }
    }

    Err(StructuredOutputError::RepairExhausted {
        attempts: max_repair_retries,
        last: Box::new(last_error),
    })
}

/// One generation call followed by validation/repair.
pub async fn generate_structured(
    llm: &dyn TextGenerator,
    system_prompt: &str,
    user_prompt: &str,
    schema: StageSchema,
    max_repair_retries: u32,
) -> Result<Map<String, Value>, StructuredOutputError> {
    let raw = llm.generate(system_prompt, user_prompt).await?;
    parse_with_repair(llm, &raw, schema, max_repair_retries).await
}
