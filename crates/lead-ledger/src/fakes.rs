//! In-memory fake for the [`LeadStore`] trait (testing only).
//!
//! Satisfies the same contract as the SurrealDB backend without any
//! external dependencies; the whole store is one mutex-guarded struct so
//! concurrent runs cannot interleave partial records.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StorageResult;
use crate::records::*;
use crate::reporting;
use crate::store::LeadStore;

#[derive(Debug, Default)]
struct Inner {
    leads: Vec<LeadRow>,
    snapshots: Vec<ResearchSnapshotRow>,
    emails: Vec<EmailRow>,
    evaluations: Vec<EvaluationRow>,
}

/// In-memory CRM store backed by plain vectors.
#[derive(Debug, Default)]
pub struct MemoryLeadStore {
    inner: Mutex<Inner>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted evaluations; convenient for asserting that a
    /// failed run left nothing behind.
    pub fn evaluation_count(&self) -> usize {
        self.inner.lock().unwrap().evaluations.len()
    }

    /// Full records without any window filtering, oldest first.
    pub fn dump_full(&self) -> StorageResult<Vec<FullRecord>> {
        let inner = self.inner.lock().unwrap();
        let (emails, snapshots, leads) = index(&inner);
        reporting::join_full(&inner.evaluations, &emails, &snapshots, &leads)
    }

    fn window(&self, since: &str) -> Vec<EvaluationRow> {
        let inner = self.inner.lock().unwrap();
        inner
            .evaluations
            .iter()
            .filter(|e| e.created_at.as_str() >= since)
            .cloned()
            .collect()
    }
}

fn index(
    inner: &Inner,
) -> (
    HashMap<String, EmailRow>,
    HashMap<String, ResearchSnapshotRow>,
    HashMap<String, LeadRow>,
) {
    let emails = inner
        .emails
        .iter()
        .map(|e| (e.email_id.clone(), e.clone()))
        .collect();
    let snapshots = inner
        .snapshots
        .iter()
        .map(|s| (s.snapshot_id.clone(), s.clone()))
        .collect();
    let leads = inner
        .leads
        .iter()
        .map(|l| (l.lead_id.clone(), l.clone()))
        .collect();
    (emails, snapshots, leads)
}

fn newest_first(mut evals: Vec<EvaluationRow>, limit: usize) -> Vec<EvaluationRow> {
    evals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    evals.truncate(limit);
    evals
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn persist_run(&self, run: NewAgentRun) -> StorageResult<PersistedIds> {
        let now = reporting::now_rfc3339();
        let mut inner = self.inner.lock().unwrap();

        let lead_id = match inner.leads.iter_mut().find(|l| l.domain == run.domain) {
            Some(existing) => {
                existing.company_name = run.company_name.clone();
                existing.lead_id.clone()
            }
            None => {
                let lead_id = Uuid::new_v4().to_string();
                inner.leads.push(LeadRow {
                    lead_id: lead_id.clone(),
                    domain: run.domain.clone(),
                    company_name: run.company_name.clone(),
                    created_at: now.clone(),
                });
                lead_id
            }
        };

        let snapshot_id = Uuid::new_v4().to_string();
        inner.snapshots.push(ResearchSnapshotRow {
            snapshot_id: snapshot_id.clone(),
            lead_id: lead_id.clone(),
            summary: run.summary,
            pain_points: run.pain_points,
            value_props: run.value_props,
            sources: run.sources,
            raw_excerpt: run.raw_excerpt,
            created_at: now.clone(),
        });

        let email_id = Uuid::new_v4().to_string();
        inner.emails.push(EmailRow {
            email_id: email_id.clone(),
            lead_id: lead_id.clone(),
            snapshot_id: snapshot_id.clone(),
            subject: run.subject,
            body: run.body,
            call_to_action: run.call_to_action,
            reflection_rounds: run.reflection_rounds,
            final_critique_score: run.final_critique_score,
            created_at: now.clone(),
        });

        inner.evaluations.push(EvaluationRow {
            evaluation_id: Uuid::new_v4().to_string(),
            email_id: email_id.clone(),
            relevance: run.relevance,
            personalization: run.personalization,
            tone: run.tone,
            clarity: run.clarity,
            rationale: run.rationale,
            overall_score: run.overall_score,
            created_at: now,
        });

        Ok(PersistedIds {
            lead_id,
            research_snapshot_id: snapshot_id,
            email_id,
        })
    }

    async fn metrics_7d(&self) -> StorageResult<MetricsSummary> {
        Ok(reporting::metrics_from(&self.window(&reporting::days_ago(7))))
    }

    async fn dimension_trends(&self, days: u32) -> StorageResult<DimensionTrends> {
        let days = reporting::clamp_days(days);
        let window_7d = self.window(&reporting::days_ago(7));
        let window_days = self.window(&reporting::days_ago(i64::from(days) - 1));
        Ok(reporting::trends_from(&window_7d, &window_days))
    }

    async fn recent_records(&self, limit: u32) -> StorageResult<Vec<RecentRecord>> {
        let limit = reporting::clamp_limit(limit, 1, 100);
        let inner = self.inner.lock().unwrap();
        let evals = newest_first(inner.evaluations.clone(), limit as usize);
        let (emails, snapshots, leads) = index(&inner);
        reporting::join_recent(&evals, &emails, &snapshots, &leads)
    }

    async fn full_records(&self, limit: u32) -> StorageResult<Vec<FullRecord>> {
        let limit = reporting::clamp_limit(limit, 1, 5000);
        let inner = self.inner.lock().unwrap();
        let evals = newest_first(inner.evaluations.clone(), limit as usize);
        let (emails, snapshots, leads) = index(&inner);
        reporting::join_full(&evals, &emails, &snapshots, &leads)
    }

    async fn regression_status(&self, threshold_drop: f64) -> StorageResult<RegressionStatus> {
        let recent_since = reporting::days_ago(7);
        let baseline_since = reporting::days_ago(14);
        let recent = self.window(&recent_since);
        let baseline: Vec<EvaluationRow> = self
            .window(&baseline_since)
            .into_iter()
            .filter(|e| e.created_at.as_str() < recent_since.as_str())
            .collect();
        Ok(reporting::regression_from(&recent, &baseline, threshold_drop))
    }
}
