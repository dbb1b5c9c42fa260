//! Prompt builders for each pipeline stage.
//!
//! Every prompt states its required JSON keys explicitly; that line is the
//! contract [`crate::structured`] enforces on the way back.

use outreach_research::ResearchContext;

fn bulleted(items: &[String]) -> String {
    items.join("; ")
}

/// System prompt for first-pass email drafting.
pub const GENERATION_SYSTEM_PROMPT: &str = "You are an expert SDR assistant. Return only JSON.";

/// System prompt for quality critique.
pub const REFLECTION_SYSTEM_PROMPT: &str =
    "You are a strict outbound email reviewer. Return only JSON.";

/// System prompt for critique-driven rewriting.
pub const REWRITE_SYSTEM_PROMPT: &str = "You are an SDR copywriter rewriting emails. Return only JSON.";

/// System prompt for final dimension scoring.
pub const EVALUATION_SYSTEM_PROMPT: &str = "You score outbound email quality. Return only JSON.";

/// Build prompt for first-pass email drafting.
pub fn generation_prompt(research: &ResearchContext) -> String {
    format!(
        "You are a senior SDR writing one cold outbound email.\n\
         Return ONLY strict JSON with keys: subject, body, call_to_action.\n\
         Constraints:\n\
         - Body <= 140 words\n\
         - No markdown\n\
         - Concrete and specific, avoid generic buzzwords\n\
         - Include one clear CTA\n\n\
         Company: {}\n\
         Domain: {}\n\
         Summary: {}\n\
         Pain points: {}\n\
         Value props: {}\n",
        research.company_name,
        research.domain,
        research.summary,
        bulleted(&research.pain_points),
        bulleted(&research.value_props),
    )
}

/// Build prompt for quality critique and one scalar score.
pub fn reflection_prompt(
    research: &ResearchContext,
    subject: &str,
    body: &str,
    cta: &str,
) -> String {
    format!(
        "Critique this outbound email as a strict reviewer.\n\
         Return ONLY strict JSON with keys: score, critique.\n\
         Scoring guide (integer 1-10):\n\
         - 1-3: poor fit or unclear\n\
         - 4-6: acceptable but generic or weak\n\
         - 7-8: strong and relevant\n\
         - 9-10: exceptional specificity and clarity\n\
         Use the full range when appropriate; do not default to 7.\n\n\
         Company: {}\n\
         Context: {}\n\
         Subject: {subject}\n\
         Body: {body}\n\
         CTA: {cta}\n",
        research.company_name, research.summary,
    )
}

/// Build prompt for rewriting the draft based on critique.
pub fn rewrite_prompt(
    research: &ResearchContext,
    subject: &str,
    body: &str,
    cta: &str,
    critique: &str,
) -> String {
    format!(
        "Rewrite the outbound email based on the critique below.\n\
         Return ONLY strict JSON with keys: subject, body, call_to_action.\n\
         Constraints:\n\
         - Body <= 140 words\n\
         - No markdown\n\
         - Preserve a clear CTA\n\
         - Improve relevance and specificity, remove fluff\n\n\
         Company: {}\n\
         Summary: {}\n\
         Current subject: {subject}\n\
         Current body: {body}\n\
         Current CTA: {cta}\n\
         Critique: {critique}\n",
        research.company_name, research.summary,
    )
}

/// Build prompt for final structured dimension scoring.
pub fn evaluation_prompt(
    research: &ResearchContext,
    subject: &str,
    body: &str,
    cta: &str,
) -> String {
    format!(
        "Evaluate this outbound email.\n\
         Return ONLY strict JSON with keys: relevance, personalization, tone, clarity, rationale.\n\
         Each score must be an integer 1-10 and use this rubric:\n\
         - relevance: fit to company context/problem\n\
         - personalization: company-specific details vs generic copy\n\
         - tone: professional, concise, credible\n\
         - clarity: message structure and CTA clarity\n\
         Important:\n\
         - Use the full scale; do not cluster scores around 7.\n\
         - If a dimension is weak, score it lower even if others are strong.\n\
         - rationale should briefly justify each sub-score.\n\n\
         Company: {}\n\
         Domain: {}\n\
         Context: {}\n\
         Subject: {subject}\n\
         Body: {body}\n\
         CTA: {cta}\n",
        research.company_name, research.domain, research.summary,
    )
}
