//! Record and payload types for the lead ledger.
//!
//! Four logical record groups make up one persisted run: the lead (keyed by
//! unique domain), the research snapshot, the email, and the evaluation.
//! Row structs here map 1:1 onto table rows; `created_at` is an RFC 3339
//! string so window filters can compare timestamps lexicographically.

use serde::{Deserialize, Serialize};

/// Complete payload for one agent run, handed to
/// [`crate::LeadStore::persist_run`] in a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAgentRun {
    // Research context
    pub domain: String,
    pub company_name: String,
    pub summary: String,
    pub pain_points: Vec<String>,
    pub value_props: Vec<String>,
    pub sources: Vec<String>,
    pub raw_excerpt: String,

    // Final draft
    pub subject: String,
    pub body: String,
    pub call_to_action: String,

    // Reflection outcome
    pub reflection_rounds: u32,
    pub final_critique_score: i64,

    // Evaluation
    pub relevance: i64,
    pub personalization: i64,
    pub tone: i64,
    pub clarity: i64,
    pub rationale: String,
    pub overall_score: f64,
}

/// Identifiers assigned by the ledger for one persisted run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIds {
    pub lead_id: String,
    pub research_snapshot_id: String,
    pub email_id: String,
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRow {
    pub lead_id: String,
    pub domain: String,
    pub company_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSnapshotRow {
    pub snapshot_id: String,
    pub lead_id: String,
    pub summary: String,
    pub pain_points: Vec<String>,
    pub value_props: Vec<String>,
    pub sources: Vec<String>,
    pub raw_excerpt: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRow {
    pub email_id: String,
    pub lead_id: String,
    pub snapshot_id: String,
    pub subject: String,
    pub body: String,
    pub call_to_action: String,
    pub reflection_rounds: u32,
    pub final_critique_score: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRow {
    pub evaluation_id: String,
    pub email_id: String,
    pub relevance: i64,
    pub personalization: i64,
    pub tone: i64,
    pub clarity: i64,
    pub rationale: String,
    pub overall_score: f64,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Reporting types
// ---------------------------------------------------------------------------

/// Evaluation volume and average quality over the trailing 7 days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub evaluations_last_7d: u64,
    pub avg_overall_score_last_7d: f64,
}

/// Rolling per-dimension averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionAverages {
    pub relevance: f64,
    pub personalization: f64,
    pub tone: f64,
    pub clarity: f64,
    pub overall: f64,
}

/// One day of dimension averages for trend rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDimensionRow {
    pub day: String,
    pub samples: u64,
    pub relevance: f64,
    pub personalization: f64,
    pub tone: f64,
    pub clarity: f64,
    pub overall: f64,
}

/// Dimension trend data for quality monitoring views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionTrends {
    pub last_7d: DimensionAverages,
    pub daily: Vec<DailyDimensionRow>,
}

/// Compact recent-run row for summary tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRecord {
    pub lead_id: String,
    pub domain: String,
    pub company_name: String,
    pub research_snapshot_id: String,
    pub email_id: String,
    pub summary: String,
    pub subject: String,
    pub overall_score: f64,
    pub created_at: String,
}

/// Full-fidelity run row for detailed inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullRecord {
    pub lead_id: String,
    pub domain: String,
    pub company_name: String,
    pub research_snapshot_id: String,
    pub email_id: String,
    pub summary: String,
    pub pain_points: Vec<String>,
    pub value_props: Vec<String>,
    pub sources: Vec<String>,
    pub subject: String,
    pub body: String,
    pub call_to_action: String,
    pub reflection_rounds: u32,
    pub final_critique_score: i64,
    pub relevance: i64,
    pub personalization: i64,
    pub tone: i64,
    pub clarity: i64,
    pub rationale: String,
    pub overall_score: f64,
    pub created_at: String,
}

/// Verdict of the quality-regression check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Stable,
    Regressing,
}

/// Recent-vs-baseline comparison of average overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionStatus {
    pub status: QualityStatus,
    pub baseline_avg_overall_score: f64,
    pub recent_avg_overall_score: f64,
    pub delta: f64,
    pub baseline_count: u64,
    pub recent_count: u64,
    pub threshold_drop: f64,
}
