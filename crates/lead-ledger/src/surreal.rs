//! SurrealDB-backed [`LeadStore`] implementation.
//!
//! Rows are written with app-generated UUID identifiers so the
//! transactional write is a fixed statement list. All four record groups
//! are committed inside one `BEGIN/COMMIT TRANSACTION` block; a failure in
//! any statement aborts the whole write.

use std::collections::HashMap;

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::records::*;
use crate::reporting;
use crate::store::LeadStore;

fn backend(err: surrealdb::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

/// SurrealDB-backed CRM store.
pub struct SurrealLeadStore {
    db: Surreal<Any>,
}

impl SurrealLeadStore {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `outreach/crm`, and runs the schema
    /// initialization.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect("mem://").await
    }

    /// Create from environment variables.
    ///
    /// Uses `SURREALDB_URL` when set, otherwise falls back to local
    /// persistence under `.outreach/db`.
    pub async fn from_env() -> StorageResult<Self> {
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            return Self::connect(&url).await;
        }

        let path = ".outreach/db";
        std::fs::create_dir_all(path).map_err(|e| {
            StorageError::Connection(format!("failed to create database directory {path}: {e}"))
        })?;
        let url = format!("surrealkv://{path}");
        info!("no SURREALDB_URL set, using local persistence: {}", url);
        Self::connect(&url).await
    }

    async fn connect(url: &str) -> StorageResult<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        db.use_ns("outreach")
            .use_db("crm")
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        init_schema(&db).await?;
        info!("SurrealLeadStore connected ({})", url);
        Ok(Self { db })
    }

    // -- private helpers -----------------------------------------------------

    async fn existing_lead_id(&self, domain: &str) -> StorageResult<Option<String>> {
        let domain_owned = domain.to_string();
        let mut res = self
            .db
            .query("SELECT VALUE lead_id FROM leads WHERE domain = $domain")
            .bind(("domain", domain_owned))
            .await
            .map_err(backend)?;
        let ids: Vec<String> = res.take(0).map_err(backend)?;
        Ok(ids.into_iter().next())
    }

    async fn evaluations_since(&self, since: String) -> StorageResult<Vec<EvaluationRow>> {
        let mut res = self
            .db
            .query("SELECT * FROM evaluations WHERE created_at >= $since")
            .bind(("since", since))
            .await
            .map_err(backend)?;
        res.take(0).map_err(backend)
    }

    async fn evaluations_between(
        &self,
        since: String,
        before: String,
    ) -> StorageResult<Vec<EvaluationRow>> {
        let mut res = self
            .db
            .query("SELECT * FROM evaluations WHERE created_at >= $since AND created_at < $before")
            .bind(("since", since))
            .bind(("before", before))
            .await
            .map_err(backend)?;
        res.take(0).map_err(backend)
    }

    async fn latest_evaluations(&self, limit: u32) -> StorageResult<Vec<EvaluationRow>> {
        // `limit` is clamped by the caller; safe to format into the query.
        let sql = format!("SELECT * FROM evaluations ORDER BY created_at DESC LIMIT {limit}");
        let mut res = self.db.query(sql).await.map_err(backend)?;
        res.take(0).map_err(backend)
    }

    /// Load the email/snapshot/lead rows referenced by a page of
    /// evaluations, keyed by their identifiers.
    async fn related_rows(
        &self,
        evals: &[EvaluationRow],
    ) -> StorageResult<(
        HashMap<String, EmailRow>,
        HashMap<String, ResearchSnapshotRow>,
        HashMap<String, LeadRow>,
    )> {
        let email_ids: Vec<String> = evals.iter().map(|e| e.email_id.clone()).collect();
        let mut res = self
            .db
            .query("SELECT * FROM emails WHERE email_id IN $ids")
            .bind(("ids", email_ids))
            .await
            .map_err(backend)?;
        let emails: Vec<EmailRow> = res.take(0).map_err(backend)?;

        let snapshot_ids: Vec<String> = emails.iter().map(|e| e.snapshot_id.clone()).collect();
        let mut res = self
            .db
            .query("SELECT * FROM research_snapshots WHERE snapshot_id IN $ids")
            .bind(("ids", snapshot_ids))
            .await
            .map_err(backend)?;
        let snapshots: Vec<ResearchSnapshotRow> = res.take(0).map_err(backend)?;

        let lead_ids: Vec<String> = emails.iter().map(|e| e.lead_id.clone()).collect();
        let mut res = self
            .db
            .query("SELECT * FROM leads WHERE lead_id IN $ids")
            .bind(("ids", lead_ids))
            .await
            .map_err(backend)?;
        let leads: Vec<LeadRow> = res.take(0).map_err(backend)?;

        Ok((
            emails.into_iter().map(|e| (e.email_id.clone(), e)).collect(),
            snapshots
                .into_iter()
                .map(|s| (s.snapshot_id.clone(), s))
                .collect(),
            leads.into_iter().map(|l| (l.lead_id.clone(), l)).collect(),
        ))
    }
}

#[async_trait]
impl LeadStore for SurrealLeadStore {
    async fn persist_run(&self, run: NewAgentRun) -> StorageResult<PersistedIds> {
        let now = reporting::now_rfc3339();
        let existing = self.existing_lead_id(&run.domain).await?;
        let lead_id = existing
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let snapshot_id = Uuid::new_v4().to_string();
        let email_id = Uuid::new_v4().to_string();

        let snapshot = ResearchSnapshotRow {
            snapshot_id: snapshot_id.clone(),
            lead_id: lead_id.clone(),
            summary: run.summary,
            pain_points: run.pain_points,
            value_props: run.value_props,
            sources: run.sources,
            raw_excerpt: run.raw_excerpt,
            created_at: now.clone(),
        };
        let email = EmailRow {
            email_id: email_id.clone(),
            lead_id: lead_id.clone(),
            snapshot_id: snapshot_id.clone(),
            subject: run.subject,
            body: run.body,
            call_to_action: run.call_to_action,
            reflection_rounds: run.reflection_rounds,
            final_critique_score: run.final_critique_score,
            created_at: now.clone(),
        };
        let evaluation = EvaluationRow {
            evaluation_id: Uuid::new_v4().to_string(),
            email_id: email_id.clone(),
            relevance: run.relevance,
            personalization: run.personalization,
            tone: run.tone,
            clarity: run.clarity,
            rationale: run.rationale,
            overall_score: run.overall_score,
            created_at: now.clone(),
        };

        debug!(domain = %run.domain, lead_id = %lead_id, "persisting agent run");

        // One transaction for all four record groups. The lead statement
        // differs depending on whether the domain is already known.
        let response = if existing.is_some() {
            self.db
                .query(
                    "BEGIN TRANSACTION; \
                     UPDATE leads SET company_name = $company_name WHERE lead_id = $lead_id; \
                     CREATE research_snapshots CONTENT $snapshot; \
                     CREATE emails CONTENT $email; \
                     CREATE evaluations CONTENT $evaluation; \
                     COMMIT TRANSACTION;",
                )
                .bind(("company_name", run.company_name))
                .bind(("lead_id", lead_id.clone()))
                .bind(("snapshot", snapshot))
                .bind(("email", email))
                .bind(("evaluation", evaluation))
                .await
                .map_err(backend)?
        } else {
            let lead = LeadRow {
                lead_id: lead_id.clone(),
                domain: run.domain,
                company_name: run.company_name,
                created_at: now,
            };
            self.db
                .query(
                    "BEGIN TRANSACTION; \
                     CREATE leads CONTENT $lead; \
                     CREATE research_snapshots CONTENT $snapshot; \
                     CREATE emails CONTENT $email; \
                     CREATE evaluations CONTENT $evaluation; \
                     COMMIT TRANSACTION;",
                )
                .bind(("lead", lead))
                .bind(("snapshot", snapshot))
                .bind(("email", email))
                .bind(("evaluation", evaluation))
                .await
                .map_err(backend)?
        };

        response.check().map_err(backend)?;

        Ok(PersistedIds {
            lead_id,
            research_snapshot_id: snapshot_id,
            email_id,
        })
    }

    async fn metrics_7d(&self) -> StorageResult<MetricsSummary> {
        let evals = self.evaluations_since(reporting::days_ago(7)).await?;
        Ok(reporting::metrics_from(&evals))
    }

    async fn dimension_trends(&self, days: u32) -> StorageResult<DimensionTrends> {
        let days = reporting::clamp_days(days);
        let window_7d = self.evaluations_since(reporting::days_ago(7)).await?;
        let window_days = self
            .evaluations_since(reporting::days_ago(i64::from(days) - 1))
            .await?;
        Ok(reporting::trends_from(&window_7d, &window_days))
    }

    async fn recent_records(&self, limit: u32) -> StorageResult<Vec<RecentRecord>> {
        let limit = reporting::clamp_limit(limit, 1, 100);
        let evals = self.latest_evaluations(limit).await?;
        let (emails, snapshots, leads) = self.related_rows(&evals).await?;
        reporting::join_recent(&evals, &emails, &snapshots, &leads)
    }

    async fn full_records(&self, limit: u32) -> StorageResult<Vec<FullRecord>> {
        let limit = reporting::clamp_limit(limit, 1, 5000);
        let evals = self.latest_evaluations(limit).await?;
        let (emails, snapshots, leads) = self.related_rows(&evals).await?;
        reporting::join_full(&evals, &emails, &snapshots, &leads)
    }

    async fn regression_status(&self, threshold_drop: f64) -> StorageResult<RegressionStatus> {
        let recent_since = reporting::days_ago(7);
        let baseline_since = reporting::days_ago(14);
        let recent = self.evaluations_since(recent_since.clone()).await?;
        let baseline = self
            .evaluations_between(baseline_since, recent_since)
            .await?;
        Ok(reporting::regression_from(&recent, &baseline, threshold_drop))
    }
}

/// Initialize all CRM tables.
///
/// Safe to call multiple times (idempotent).
async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("initializing CRM schema");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS leads SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_lead_id ON TABLE leads COLUMNS lead_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_lead_domain ON TABLE leads COLUMNS domain UNIQUE;

        DEFINE TABLE IF NOT EXISTS research_snapshots SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_snapshot_id ON TABLE research_snapshots COLUMNS snapshot_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_snapshot_lead ON TABLE research_snapshots COLUMNS lead_id;

        DEFINE TABLE IF NOT EXISTS emails SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_email_id ON TABLE emails COLUMNS email_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_email_lead ON TABLE emails COLUMNS lead_id;

        DEFINE TABLE IF NOT EXISTS evaluations SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS idx_evaluation_id ON TABLE evaluations COLUMNS evaluation_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_evaluation_email ON TABLE evaluations COLUMNS email_id;
        DEFINE INDEX IF NOT EXISTS idx_evaluation_created_at ON TABLE evaluations COLUMNS created_at;
    "#;

    db.query(sql).await.map_err(backend)?;
    debug!("CRM schema ready");
    Ok(())
}
