//! Orchestrator scenario tests with scripted capabilities.
//!
//! The generator is scripted per stage (recognized by system prompt), the
//! researcher is stubbed, and persistence goes to the in-memory ledger, so
//! every control-flow property of the run loop can be pinned exactly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use lead_ledger::fakes::MemoryLeadStore;
use lead_ledger::{
    DimensionTrends, FullRecord, LeadStore, MetricsSummary, NewAgentRun, PersistedIds,
    RecentRecord, RegressionStatus, StorageError, StorageResult,
};
use outreach_agent::{prompts, AgentError, AgentPolicy, OutreachAgent};
use outreach_llm::{LlmError, LlmResult, MockGenerator, TextGenerator};
use outreach_research::{CompanyResearcher, ResearchContext, ResearchError};

// ---------------------------------------------------------------------------
// Scripted capabilities
// ---------------------------------------------------------------------------

/// Stage-aware generator: drafts and evaluations are fixed, critique
/// scores pop from a script, every stage call is counted.
#[derive(Debug)]
struct ScriptedGenerator {
    critique_scores: Mutex<VecDeque<i64>>,
    generation_calls: AtomicU32,
    critique_calls: AtomicU32,
    rewrite_calls: AtomicU32,
    evaluation_calls: AtomicU32,
}

impl ScriptedGenerator {
    fn with_critique_scores(scores: &[i64]) -> Self {
        ScriptedGenerator {
            critique_scores: Mutex::new(scores.iter().copied().collect()),
            generation_calls: AtomicU32::new(0),
            critique_calls: AtomicU32::new(0),
            rewrite_calls: AtomicU32::new(0),
            evaluation_calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system_prompt: &str, _user_prompt: &str) -> LlmResult<String> {
        if system_prompt == prompts::GENERATION_SYSTEM_PROMPT {
            self.generation_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(json!({
                "subject": "Initial subject",
                "body": "Initial body",
                "call_to_action": "Initial CTA",
            })
            .to_string());
        }
        if system_prompt == prompts::REFLECTION_SYSTEM_PROMPT {
            self.critique_calls.fetch_add(1, Ordering::SeqCst);
            let score = self
                .critique_scores
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(8);
            return Ok(json!({"score": score, "critique": "tighten the hook"}).to_string());
        }
        if system_prompt == prompts::REWRITE_SYSTEM_PROMPT {
            let n = self.rewrite_calls.fetch_add(1, Ordering::SeqCst) + 1;
            return Ok(json!({
                "subject": format!("Rewrite {n}"),
                "body": format!("Rewritten body {n}"),
                "call_to_action": "Sharper CTA",
            })
            .to_string());
        }
        if system_prompt == prompts::EVALUATION_SYSTEM_PROMPT {
            self.evaluation_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(json!({
                "relevance": 8,
                "personalization": 7,
                "tone": 8,
                "clarity": 8,
                "rationale": "Balanced message with clear CTA.",
            })
            .to_string());
        }
        Err(LlmError::MalformedResponse {
            provider: "scripted",
            reason: format!("unexpected system prompt: {system_prompt}"),
        })
    }
}

/// Generator whose every output is invalid JSON.
#[derive(Debug)]
struct GarbageGenerator {
    calls: AtomicU32,
}

#[async_trait]
impl TextGenerator for GarbageGenerator {
    async fn generate(&self, _system: &str, _user: &str) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("sorry, no JSON today".to_string())
    }
}

struct StubResearcher;

#[async_trait]
impl CompanyResearcher for StubResearcher {
    async fn research(&self, domain: &str) -> Result<ResearchContext, ResearchError> {
        Ok(ResearchContext {
            domain: domain.to_string(),
            company_name: "Acme".to_string(),
            summary: "Acme appears focused on: widgets".to_string(),
            pain_points: vec!["Likely manual workflows can be automated.".to_string()],
            value_props: vec!["Lift conversion with account-specific outreach.".to_string()],
            sources: vec![format!("https://{domain}")],
            raw_excerpt: "widgets".to_string(),
        })
    }
}

struct FailingResearcher {
    calls: AtomicU32,
}

#[async_trait]
impl CompanyResearcher for FailingResearcher {
    async fn research(&self, _domain: &str) -> Result<ResearchContext, ResearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ResearchError::Backend("upstream timeout".to_string()))
    }
}

/// Ledger that rejects every write.
struct FailingStore;

#[async_trait]
impl LeadStore for FailingStore {
    async fn persist_run(&self, _run: NewAgentRun) -> StorageResult<PersistedIds> {
        Err(StorageError::Backend("connection reset".to_string()))
    }
    async fn metrics_7d(&self) -> StorageResult<MetricsSummary> {
        Err(StorageError::Backend("unsupported".to_string()))
    }
    async fn dimension_trends(&self, _days: u32) -> StorageResult<DimensionTrends> {
        Err(StorageError::Backend("unsupported".to_string()))
    }
    async fn recent_records(&self, _limit: u32) -> StorageResult<Vec<RecentRecord>> {
        Err(StorageError::Backend("unsupported".to_string()))
    }
    async fn full_records(&self, _limit: u32) -> StorageResult<Vec<FullRecord>> {
        Err(StorageError::Backend("unsupported".to_string()))
    }
    async fn regression_status(&self, _threshold: f64) -> StorageResult<RegressionStatus> {
        Err(StorageError::Backend("unsupported".to_string()))
    }
}

fn agent_with(
    generator: Arc<dyn TextGenerator>,
    researcher: Arc<dyn CompanyResearcher>,
    store: Arc<dyn LeadStore>,
) -> OutreachAgent {
    OutreachAgent::new(generator, researcher, store, AgentPolicy::default())
}

// ---------------------------------------------------------------------------
// Reflection loop scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accepted_first_critique_means_zero_rewrites() {
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[8]));
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let result = agent.run("acme.com").await.unwrap();

    assert_eq!(result.reflection_rounds, 0);
    assert_eq!(result.final_critique_score, 8);
    assert_eq!(result.email.subject, "Initial subject");
    assert_eq!(generator.critique_calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.rewrite_calls.load(Ordering::SeqCst), 0);

    let records = store.dump_full().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subject, "Initial subject");
    assert_eq!(records[0].reflection_rounds, 0);
}

#[tokio::test]
async fn low_then_accepted_critique_performs_one_rewrite() {
    // Scores [4, 8]: one rewrite, loop stops on the second critique.
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[4, 8]));
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let result = agent.run("acme.com").await.unwrap();

    assert_eq!(result.reflection_rounds, 1);
    assert_eq!(result.final_critique_score, 8);
    assert_eq!(result.email.subject, "Rewrite 1");
    assert_eq!(generator.critique_calls.load(Ordering::SeqCst), 2);
    assert_eq!(generator.rewrite_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn round_exhaustion_keeps_last_critique_score() {
    // Scores [3, 5]: two rewrites, exit by exhaustion. The second rewrite
    // is persisted without ever being re-scored; the persisted score is
    // the one that triggered it.
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[3, 5]));
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let result = agent.run("acme.com").await.unwrap();

    assert_eq!(result.reflection_rounds, 2);
    assert_eq!(result.final_critique_score, 5);
    assert_eq!(result.email.subject, "Rewrite 2");
    assert_eq!(generator.critique_calls.load(Ordering::SeqCst), 2);
    assert_eq!(generator.rewrite_calls.load(Ordering::SeqCst), 2);

    let records = store.dump_full().unwrap();
    assert_eq!(records[0].subject, "Rewrite 2");
    assert_eq!(records[0].final_critique_score, 5);
    assert_eq!(records[0].reflection_rounds, 2);
}

#[tokio::test]
async fn non_numeric_critique_score_normalizes_to_one_and_rewrites() {
    #[derive(Debug)]
    struct WordScoreGenerator {
        inner: ScriptedGenerator,
    }

    #[async_trait]
    impl TextGenerator for WordScoreGenerator {
        async fn generate(&self, system_prompt: &str, user_prompt: &str) -> LlmResult<String> {
            if system_prompt == prompts::REFLECTION_SYSTEM_PROMPT {
                return Ok(json!({"score": "mediocre", "critique": "vague"}).to_string());
            }
            self.inner.generate(system_prompt, user_prompt).await
        }
    }

    let generator = Arc::new(WordScoreGenerator {
        inner: ScriptedGenerator::with_critique_scores(&[]),
    });
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let result = agent.run("acme.com").await.unwrap();
    assert_eq!(result.final_critique_score, 1);
    assert_eq!(result.reflection_rounds, 2);
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evaluation_mean_is_unrounded() {
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[9]));
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let result = agent.run("acme.com").await.unwrap();

    // Dimensions [8, 7, 8, 8] average to exactly 7.75.
    assert_eq!(result.evaluation.relevance, 8);
    assert_eq!(result.evaluation.personalization, 7);
    assert_eq!(result.evaluation.overall_score, 7.75);
    assert_eq!(generator.evaluation_calls.load(Ordering::SeqCst), 1);

    let records = store.dump_full().unwrap();
    assert_eq!(records[0].overall_score, 7.75);
    assert_eq!(records[0].rationale, "Balanced message with clear CTA.");
}

// ---------------------------------------------------------------------------
// Failure paths: all-or-nothing per run
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_domain_fails_before_any_backend_call() {
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[]));
    let researcher = Arc::new(FailingResearcher {
        calls: AtomicU32::new(0),
    });
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), researcher.clone(), store.clone());

    let err = agent.run("not-a-domain").await.unwrap_err();

    assert!(matches!(err, AgentError::InvalidDomain { ref input } if input == "not-a-domain"));
    assert!(err.is_client_error());
    // No retry attempt was spent on the malformed input.
    assert_eq!(researcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.generation_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.evaluation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn research_exhaustion_spends_exactly_the_retry_budget() {
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[]));
    let researcher = Arc::new(FailingResearcher {
        calls: AtomicU32::new(0),
    });
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), researcher.clone(), store.clone());

    let err = agent.run("acme.com").await.unwrap_err();

    match err {
        AgentError::ResearchExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(source, ResearchError::Backend(msg) if msg == "upstream timeout"));
        }
        other => panic!("expected ResearchExhausted, got {other:?}"),
    }
    assert_eq!(researcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(generator.generation_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.evaluation_count(), 0);
}

#[tokio::test]
async fn unparsable_producer_output_is_fatal_after_bounded_repair() {
    let generator = Arc::new(GarbageGenerator {
        calls: AtomicU32::new(0),
    });
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(generator.clone(), Arc::new(StubResearcher), store.clone());

    let err = agent.run("acme.com").await.unwrap_err();

    assert!(matches!(err, AgentError::StructuredOutput(_)));
    // One draft call plus exactly two repair rounds.
    assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.evaluation_count(), 0);
}

#[tokio::test]
async fn persistence_failure_aborts_the_run_untouched() {
    let generator = Arc::new(ScriptedGenerator::with_critique_scores(&[8]));
    let agent = agent_with(generator, Arc::new(StubResearcher), Arc::new(FailingStore));

    let err = agent.run("acme.com").await.unwrap_err();
    match err {
        AgentError::Persistence(StorageError::Backend(msg)) => {
            assert_eq!(msg, "connection reset");
        }
        other => panic!("expected Persistence, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// End-to-end with the stock mock generator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mock_generator_run_persists_first_pass_draft() {
    let store = Arc::new(MemoryLeadStore::new());
    let agent = agent_with(
        Arc::new(MockGenerator::new()),
        Arc::new(StubResearcher),
        store.clone(),
    );

    let result = agent.run("https://www.acme.com/about").await.unwrap();

    // The mock always critiques at 8, so the first draft survives.
    assert_eq!(result.research.domain, "acme.com");
    assert_eq!(result.reflection_rounds, 0);
    assert_eq!(result.final_critique_score, 8);
    assert!(result.evaluation.overall_score > 0.0);
    assert!(!result.lead_id.is_empty());

    let records = store.dump_full().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].domain, "acme.com");
    assert_eq!(records[0].subject, "Quick idea for your outbound process");
}
