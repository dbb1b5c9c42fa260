//! The run orchestrator.
//!
//! `OutreachAgent` owns flow control, not business data: research →
//! draft → bounded reflection loop → evaluation → one atomic persistence
//! handoff. Each step is delegated to a capability behind a trait; this
//! module only coordinates sequencing, normalization, and failure
//! propagation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use lead_ledger::{LeadStore, NewAgentRun};
use outreach_llm::TextGenerator;
use outreach_research::{normalize_domain, CompanyResearcher, ResearchContext, ResearchError};

use crate::error::AgentError;
use crate::prompts;
use crate::retry::{retry_with_backoff, RetryError};
use crate::score::{normalize_rationale, normalize_score};
use crate::structured::{generate_structured, StageSchema, DEFAULT_MAX_REPAIR_RETRIES};

/// A critique is accepted (and the reflection loop stops) at this score.
const ACCEPTANCE_SCORE: i64 = 7;

/// Immutable run policy, injected into [`OutreachAgent::new`].
#[derive(Debug, Clone)]
pub struct AgentPolicy {
    /// Upper bound on critique-then-rewrite cycles per run.
    pub max_reflection_rounds: u32,
    /// Retry budget for the research step.
    pub research_attempts: u32,
    /// Base backoff delay for research retries.
    pub research_base_delay: Duration,
    /// Self-repair rounds allowed per structured-output call.
    pub max_repair_retries: u32,
}

impl Default for AgentPolicy {
    fn default() -> Self {
        AgentPolicy {
            max_reflection_rounds: 2,
            research_attempts: 3,
            research_base_delay: Duration::from_millis(500),
            max_repair_retries: DEFAULT_MAX_REPAIR_RETRIES,
        }
    }
}

impl AgentPolicy {
    /// Policy from environment variables, defaulting anything unset.
    ///
    /// Only `MAX_REFLECTION_ROUNDS` is operator-tunable; retry and repair
    /// budgets are deployment constants.
    pub fn from_env() -> Self {
        let defaults = AgentPolicy::default();
        let max_reflection_rounds = std::env::var("MAX_REFLECTION_ROUNDS")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(defaults.max_reflection_rounds);
        AgentPolicy {
            max_reflection_rounds,
            ..defaults
        }
    }
}

/// One outbound email draft. Replaced wholesale by each rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub subject: String,
    pub body: String,
    pub call_to_action: String,
}

/// Final quality scores for a persisted draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub relevance: i64,
    pub personalization: i64,
    pub tone: i64,
    pub clarity: i64,
    pub rationale: String,
    /// Unrounded arithmetic mean of the four dimension scores.
    pub overall_score: f64,
}

/// Transient critique outcome; consumed immediately by the loop.
struct Critique {
    score: i64,
    critique: String,
}

/// Normalized output from one completed agent run.
///
/// Constructed once after persistence succeeds and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentRunResult {
    pub lead_id: String,
    pub research_snapshot_id: String,
    pub email_id: String,
    pub research: ResearchContext,
    pub email: Draft,
    /// Count of rewrites actually performed.
    pub reflection_rounds: u32,
    /// Normalized score from the critique that last decided the loop exit.
    pub final_critique_score: i64,
    pub evaluation: Evaluation,
}

/// Deterministic agent orchestrator.
pub struct OutreachAgent {
    llm: Arc<dyn TextGenerator>,
    researcher: Arc<dyn CompanyResearcher>,
    store: Arc<dyn LeadStore>,
    policy: AgentPolicy,
}

impl OutreachAgent {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        researcher: Arc<dyn CompanyResearcher>,
        store: Arc<dyn LeadStore>,
        policy: AgentPolicy,
    ) -> Self {
        OutreachAgent {
            llm,
            researcher,
            store,
            policy,
        }
    }

    /// Run the full agent lifecycle for one domain input.
    ///
    /// Steps:
    /// 1. Validate and normalize the domain (client error, no retries).
    /// 2. Research company context, retried with backoff.
    /// 3. Generate the initial draft.
    /// 4. Reflect and optionally rewrite, up to `max_reflection_rounds`.
    /// 5. Evaluate the final draft on explicit dimensions.
    /// 6. Persist all artifacts as one transactional CRM write.
    pub async fn run(&self, domain_input: &str) -> Result<AgentRunResult, AgentError> {
        let started = Instant::now();

        let domain = normalize_domain(domain_input).map_err(|_| AgentError::InvalidDomain {
            input: domain_input.to_string(),
        })?;
        info!(domain = %domain, "agent run start");

        info!(domain = %domain, "step: research start");
        let research = retry_with_backoff(
            || self.researcher.research(&domain),
            self.policy.research_attempts,
            self.policy.research_base_delay,
        )
        .await
        .map_err(|err| self.research_error(err))?;
        info!(domain = %domain, company = %research.company_name, "step: research done");

        info!(domain = %domain, "step: generate start");
        let mut draft = self.generate_draft(&research).await?;
        info!(domain = %domain, "step: generate done");

        let mut critique_score: i64 = 0;
        let mut reflection_rounds: u32 = 0;
        info!(
            domain = %domain,
            max_rounds = self.policy.max_reflection_rounds,
            "step: reflect start"
        );
        for _ in 0..self.policy.max_reflection_rounds {
            let critique = self.critique_draft(&research, &draft).await?;
            critique_score = critique.score;
            if critique_score >= ACCEPTANCE_SCORE {
                break;
            }
            draft = self
                .rewrite_draft(&research, &draft, &critique.critique)
                .await?;
            reflection_rounds += 1;
        }
        info!(
            domain = %domain,
            rounds = reflection_rounds,
            final_score = critique_score,
            "step: reflect done"
        );

        info!(domain = %domain, "step: evaluate start");
        let evaluation = self.evaluate_draft(&research, &draft).await?;
        info!(
            domain = %domain,
            overall_score = evaluation.overall_score,
            "step: evaluate done"
        );

        info!(domain = %domain, "step: persist start");
        let ids = self
            .store
            .persist_run(NewAgentRun {
                domain: research.domain.clone(),
                company_name: research.company_name.clone(),
                summary: research.summary.clone(),
                pain_points: research.pain_points.clone(),
                value_props: research.value_props.clone(),
                sources: research.sources.clone(),
                raw_excerpt: research.raw_excerpt.clone(),
                subject: draft.subject.clone(),
                body: draft.body.clone(),
                call_to_action: draft.call_to_action.clone(),
                reflection_rounds,
                final_critique_score: critique_score,
                relevance: evaluation.relevance,
                personalization: evaluation.personalization,
                tone: evaluation.tone,
                clarity: evaluation.clarity,
                rationale: evaluation.rationale.clone(),
                overall_score: evaluation.overall_score,
            })
            .await?;
        info!(
            domain = %domain,
            lead_id = %ids.lead_id,
            research_id = %ids.research_snapshot_id,
            email_id = %ids.email_id,
            "step: persist done"
        );

        info!(
            domain = %domain,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "agent run done"
        );

        Ok(AgentRunResult {
            lead_id: ids.lead_id,
            research_snapshot_id: ids.research_snapshot_id,
            email_id: ids.email_id,
            research,
            email: draft,
            reflection_rounds,
            final_critique_score: critique_score,
            evaluation,
        })
    }

    fn research_error(&self, err: RetryError<ResearchError>) -> AgentError {
        match err {
            RetryError::InvalidAttempts(n) => {
                AgentError::Policy(format!("research_attempts must be >= 1, got {n}"))
            }
            RetryError::Exhausted(source) => AgentError::ResearchExhausted {
                attempts: self.policy.research_attempts,
                source,
            },
        }
    }

    /// Generate initial outbound email draft.
    async fn generate_draft(&self, research: &ResearchContext) -> Result<Draft, AgentError> {
        let object = generate_structured(
            self.llm.as_ref(),
            prompts::GENERATION_SYSTEM_PROMPT,
            &prompts::generation_prompt(research),
            StageSchema::Draft,
            self.policy.max_repair_retries,
        )
        .await?;
        Ok(draft_from(&object))
    }

    /// Score and critique the current draft.
    async fn critique_draft(
        &self,
        research: &ResearchContext,
        draft: &Draft,
    ) -> Result<Critique, AgentError> {
        let object = generate_structured(
            self.llm.as_ref(),
            prompts::REFLECTION_SYSTEM_PROMPT,
            &prompts::reflection_prompt(research, &draft.subject, &draft.body, &draft.call_to_action),
            StageSchema::Critique,
            self.policy.max_repair_retries,
        )
        .await?;
        Ok(Critique {
            score: normalize_score(field(&object, "score")),
            critique: text_field(&object, "critique"),
        })
    }

    /// Rewrite the draft using critique feedback.
    async fn rewrite_draft(
        &self,
        research: &ResearchContext,
        draft: &Draft,
        critique: &str,
    ) -> Result<Draft, AgentError> {
        let object = generate_structured(
            self.llm.as_ref(),
            prompts::REWRITE_SYSTEM_PROMPT,
            &prompts::rewrite_prompt(
                research,
                &draft.subject,
                &draft.body,
                &draft.call_to_action,
                critique,
            ),
            StageSchema::Draft,
            self.policy.max_repair_retries,
        )
        .await?;
        Ok(draft_from(&object))
    }

    /// Produce final quality scores and rationale.
    async fn evaluate_draft(
        &self,
        research: &ResearchContext,
        draft: &Draft,
    ) -> Result<Evaluation, AgentError> {
        let object = generate_structured(
            self.llm.as_ref(),
            prompts::EVALUATION_SYSTEM_PROMPT,
            &prompts::evaluation_prompt(research, &draft.subject, &draft.body, &draft.call_to_action),
            StageSchema::Evaluation,
            self.policy.max_repair_retries,
        )
        .await?;

        let relevance = normalize_score(field(&object, "relevance"));
        let personalization = normalize_score(field(&object, "personalization"));
        let tone = normalize_score(field(&object, "tone"));
        let clarity = normalize_score(field(&object, "clarity"));
        let overall_score = (relevance + personalization + tone + clarity) as f64 / 4.0;

        Ok(Evaluation {
            relevance,
            personalization,
            tone,
            clarity,
            rationale: normalize_rationale(field(&object, "rationale")),
            overall_score,
        })
    }
}

fn field<'a>(object: &'a Map<String, Value>, key: &str) -> &'a Value {
    object.get(key).unwrap_or(&Value::Null)
}

/// String coercion for draft fields; non-string values are rendered
/// rather than rejected.
fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn draft_from(object: &Map<String, Value>) -> Draft {
    Draft {
        subject: text_field(object, "subject"),
        body: text_field(object, "body"),
        call_to_action: text_field(object, "call_to_action"),
    }
}
