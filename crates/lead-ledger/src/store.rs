//! Storage trait for the CRM persistence boundary.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::records::{
    DimensionTrends, FullRecord, MetricsSummary, NewAgentRun, PersistedIds, RecentRecord,
    RegressionStatus,
};

/// CRM persistence boundary for agent runs.
///
/// Guarantees:
/// - `persist_run` is atomic: the lead, research snapshot, email, and
///   evaluation commit together or none of them are visible.
/// - Leads are deduplicated by domain; persisting a second run for the
///   same domain reuses the lead and refreshes its company name.
/// - Reporting methods are read-only and clamp their inputs to sane
///   bounds.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist one complete agent run, returning the created identifiers.
    async fn persist_run(&self, run: NewAgentRun) -> StorageResult<PersistedIds>;

    /// Evaluation volume and average overall score for the last 7 days.
    async fn metrics_7d(&self) -> StorageResult<MetricsSummary>;

    /// Dimension trend data over the last `days` days (clamped to [3, 90]).
    async fn dimension_trends(&self, days: u32) -> StorageResult<DimensionTrends>;

    /// Compact recent-run rows, newest first (limit clamped to [1, 100]).
    async fn recent_records(&self, limit: u32) -> StorageResult<Vec<RecentRecord>>;

    /// Full-fidelity run rows, newest first (limit clamped to [1, 5000]).
    async fn full_records(&self, limit: u32) -> StorageResult<Vec<FullRecord>>;

    /// Compare the recent 7-day quality window against the prior 7 days.
    async fn regression_status(&self, threshold_drop: f64) -> StorageResult<RegressionStatus>;
}
