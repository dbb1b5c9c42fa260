//! Lead Ledger: CRM persistence for outreach agent runs.
//!
//! One agent run produces four logical record groups (lead, research
//! snapshot, outbound email, evaluation) persisted atomically through the
//! [`LeadStore`] trait. Backends:
//!
//! - [`SurrealLeadStore`]: SurrealDB (`mem://` for tests, surrealkv for
//!   local files, ws for a remote server)
//! - [`fakes::MemoryLeadStore`]: in-memory fake for orchestrator tests
//!
//! The ledger also carries the reporting surface used by quality
//! monitoring: rolling metrics, dimension trends, recent/full CRM records,
//! and a regression check of recent versus baseline quality.

mod error;
pub mod fakes;
mod records;
mod reporting;
mod store;
mod surreal;

pub use error::{StorageError, StorageResult};
pub use records::{
    DailyDimensionRow, DimensionAverages, DimensionTrends, EmailRow, EvaluationRow, FullRecord,
    LeadRow, MetricsSummary, NewAgentRun, PersistedIds, QualityStatus, RecentRecord,
    RegressionStatus, ResearchSnapshotRow,
};
pub use store::LeadStore;
pub use surreal::SurrealLeadStore;
