//! Pure aggregation logic shared by every [`crate::LeadStore`] backend.
//!
//! Backends fetch raw rows for a time window; everything window-shaped or
//! statistical happens here so the fake and the SurrealDB implementation
//! cannot drift apart.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, Utc};

use crate::error::{StorageError, StorageResult};
use crate::records::{
    DailyDimensionRow, DimensionAverages, DimensionTrends, EmailRow, EvaluationRow, FullRecord,
    LeadRow, MetricsSummary, QualityStatus, RecentRecord, RegressionStatus, ResearchSnapshotRow,
};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn clamp_days(days: u32) -> u32 {
    days.clamp(3, 90)
}

pub(crate) fn clamp_limit(limit: u32, min: u32, max: u32) -> u32 {
    limit.clamp(min, max)
}

/// RFC 3339 timestamp `days` days before now; comparable lexicographically
/// against stored `created_at` values.
pub(crate) fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339()
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

fn mean<I: Iterator<Item = f64>>(values: I, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

pub(crate) fn metrics_from(evals: &[EvaluationRow]) -> MetricsSummary {
    MetricsSummary {
        evaluations_last_7d: evals.len() as u64,
        avg_overall_score_last_7d: round2(mean(
            evals.iter().map(|e| e.overall_score),
            evals.len(),
        )),
    }
}

pub(crate) fn averages_from(evals: &[EvaluationRow]) -> DimensionAverages {
    let n = evals.len();
    DimensionAverages {
        relevance: round2(mean(evals.iter().map(|e| e.relevance as f64), n)),
        personalization: round2(mean(evals.iter().map(|e| e.personalization as f64), n)),
        tone: round2(mean(evals.iter().map(|e| e.tone as f64), n)),
        clarity: round2(mean(evals.iter().map(|e| e.clarity as f64), n)),
        overall: round2(mean(evals.iter().map(|e| e.overall_score), n)),
    }
}

/// Group evaluations by calendar day (ascending) and average per day.
pub(crate) fn daily_from(evals: &[EvaluationRow]) -> Vec<DailyDimensionRow> {
    let mut by_day: BTreeMap<String, Vec<&EvaluationRow>> = BTreeMap::new();
    for eval in evals {
        let day = eval.created_at.get(..10).unwrap_or(&eval.created_at);
        by_day.entry(day.to_string()).or_default().push(eval);
    }

    by_day
        .into_iter()
        .map(|(day, rows)| {
            let n = rows.len();
            DailyDimensionRow {
                day,
                samples: n as u64,
                relevance: round2(mean(rows.iter().map(|e| e.relevance as f64), n)),
                personalization: round2(mean(rows.iter().map(|e| e.personalization as f64), n)),
                tone: round2(mean(rows.iter().map(|e| e.tone as f64), n)),
                clarity: round2(mean(rows.iter().map(|e| e.clarity as f64), n)),
                overall: round2(mean(rows.iter().map(|e| e.overall_score), n)),
            }
        })
        .collect()
}

pub(crate) fn trends_from(window_7d: &[EvaluationRow], window_days: &[EvaluationRow]) -> DimensionTrends {
    DimensionTrends {
        last_7d: averages_from(window_7d),
        daily: daily_from(window_days),
    }
}

/// Classify quality as stable or regressing.
///
/// Regression requires both windows to hold at least 3 samples and the
/// recent average to drop by at least `threshold_drop`.
pub(crate) fn regression_from(
    recent: &[EvaluationRow],
    baseline: &[EvaluationRow],
    threshold_drop: f64,
) -> RegressionStatus {
    let recent_avg = mean(recent.iter().map(|e| e.overall_score), recent.len());
    let baseline_avg = mean(baseline.iter().map(|e| e.overall_score), baseline.len());
    let delta = recent_avg - baseline_avg;
    let enough_data = recent.len() >= 3 && baseline.len() >= 3;
    let threshold = threshold_drop.abs();
    let status = if enough_data && delta <= -threshold {
        QualityStatus::Regressing
    } else {
        QualityStatus::Stable
    };

    RegressionStatus {
        status,
        baseline_avg_overall_score: round2(baseline_avg),
        recent_avg_overall_score: round2(recent_avg),
        delta: round2(delta),
        baseline_count: baseline.len() as u64,
        recent_count: recent.len() as u64,
        threshold_drop: threshold,
    }
}

// ---------------------------------------------------------------------------
// App-side joins (document store, no SQL joins)
// ---------------------------------------------------------------------------

fn related<'a, T>(
    map: &'a HashMap<String, T>,
    key: &str,
    what: &str,
) -> StorageResult<&'a T> {
    map.get(key)
        .ok_or_else(|| StorageError::Inconsistent(format!("{what} missing for id {key}")))
}

pub(crate) fn join_recent(
    evals: &[EvaluationRow],
    emails: &HashMap<String, EmailRow>,
    snapshots: &HashMap<String, ResearchSnapshotRow>,
    leads: &HashMap<String, LeadRow>,
) -> StorageResult<Vec<RecentRecord>> {
    evals
        .iter()
        .map(|eval| {
            let email = related(emails, &eval.email_id, "email")?;
            let snapshot = related(snapshots, &email.snapshot_id, "research snapshot")?;
            let lead = related(leads, &email.lead_id, "lead")?;
            Ok(RecentRecord {
                lead_id: lead.lead_id.clone(),
                domain: lead.domain.clone(),
                company_name: lead.company_name.clone(),
                research_snapshot_id: snapshot.snapshot_id.clone(),
                email_id: email.email_id.clone(),
                summary: snapshot.summary.clone(),
                subject: email.subject.clone(),
                overall_score: eval.overall_score,
                created_at: eval.created_at.clone(),
            })
        })
        .collect()
}

pub(crate) fn join_full(
    evals: &[EvaluationRow],
    emails: &HashMap<String, EmailRow>,
    snapshots: &HashMap<String, ResearchSnapshotRow>,
    leads: &HashMap<String, LeadRow>,
) -> StorageResult<Vec<FullRecord>> {
    evals
        .iter()
        .map(|eval| {
            let email = related(emails, &eval.email_id, "email")?;
            let snapshot = related(snapshots, &email.snapshot_id, "research snapshot")?;
            let lead = related(leads, &email.lead_id, "lead")?;
            Ok(FullRecord {
                lead_id: lead.lead_id.clone(),
                domain: lead.domain.clone(),
                company_name: lead.company_name.clone(),
                research_snapshot_id: snapshot.snapshot_id.clone(),
                email_id: email.email_id.clone(),
                summary: snapshot.summary.clone(),
                pain_points: snapshot.pain_points.clone(),
                value_props: snapshot.value_props.clone(),
                sources: snapshot.sources.clone(),
                subject: email.subject.clone(),
                body: email.body.clone(),
                call_to_action: email.call_to_action.clone(),
                reflection_rounds: email.reflection_rounds,
                final_critique_score: email.final_critique_score,
                relevance: eval.relevance,
                personalization: eval.personalization,
                tone: eval.tone,
                clarity: eval.clarity,
                rationale: eval.rationale.clone(),
                overall_score: eval.overall_score,
                created_at: eval.created_at.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(created_at: &str, overall: f64) -> EvaluationRow {
        EvaluationRow {
            evaluation_id: format!("eval-{created_at}-{overall}"),
            email_id: "email-1".to_string(),
            relevance: 8,
            personalization: 7,
            tone: 8,
            clarity: 8,
            rationale: "solid".to_string(),
            overall_score: overall,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn metrics_over_empty_window_are_zero() {
        let summary = metrics_from(&[]);
        assert_eq!(summary.evaluations_last_7d, 0);
        assert_eq!(summary.avg_overall_score_last_7d, 0.0);
    }

    #[test]
    fn metrics_average_is_rounded_to_two_decimals() {
        let rows = vec![
            eval("2026-08-01T10:00:00+00:00", 7.0),
            eval("2026-08-02T10:00:00+00:00", 8.0),
            eval("2026-08-03T10:00:00+00:00", 8.5),
        ];
        let summary = metrics_from(&rows);
        assert_eq!(summary.evaluations_last_7d, 3);
        assert_eq!(summary.avg_overall_score_last_7d, 7.83);
    }

    #[test]
    fn daily_rows_group_by_calendar_day_ascending() {
        let rows = vec![
            eval("2026-08-02T09:00:00+00:00", 6.0),
            eval("2026-08-01T10:00:00+00:00", 8.0),
            eval("2026-08-02T18:00:00+00:00", 8.0),
        ];
        let daily = daily_from(&rows);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].day, "2026-08-01");
        assert_eq!(daily[0].samples, 1);
        assert_eq!(daily[1].day, "2026-08-02");
        assert_eq!(daily[1].samples, 2);
        assert_eq!(daily[1].overall, 7.0);
    }

    #[test]
    fn regression_requires_enough_samples() {
        let recent = vec![eval("2026-08-05T00:00:00+00:00", 5.0)];
        let baseline = vec![
            eval("2026-07-29T00:00:00+00:00", 9.0),
            eval("2026-07-29T01:00:00+00:00", 9.0),
            eval("2026-07-29T02:00:00+00:00", 9.0),
        ];
        let status = regression_from(&recent, &baseline, 0.5);
        assert_eq!(status.status, QualityStatus::Stable);
    }

    #[test]
    fn regression_detected_on_sufficient_drop() {
        let recent: Vec<_> = (0..3)
            .map(|i| eval(&format!("2026-08-0{}T00:00:00+00:00", i + 3), 6.0))
            .collect();
        let baseline: Vec<_> = (0..3)
            .map(|i| eval(&format!("2026-07-2{}T00:00:00+00:00", i + 5), 8.0))
            .collect();
        let status = regression_from(&recent, &baseline, 0.5);
        assert_eq!(status.status, QualityStatus::Regressing);
        assert_eq!(status.delta, -2.0);
        assert_eq!(status.recent_count, 3);
        assert_eq!(status.baseline_count, 3);
    }

    #[test]
    fn small_drop_below_threshold_stays_stable() {
        let recent: Vec<_> = (0..3)
            .map(|i| eval(&format!("2026-08-0{}T00:00:00+00:00", i + 3), 7.8)).collect();
        let baseline: Vec<_> = (0..3)
            .map(|i| eval(&format!("2026-07-2{}T00:00:00+00:00", i + 5), 8.0)).collect();
        let status = regression_from(&recent, &baseline, 0.5);
        assert_eq!(status.status, QualityStatus::Stable);
    }

    #[test]
    fn join_surfaces_missing_related_rows() {
        let evals = vec![eval("2026-08-01T00:00:00+00:00", 8.0)];
        let err = join_recent(&evals, &HashMap::new(), &HashMap::new(), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StorageError::Inconsistent(_)));
    }

    #[test]
    fn clamps_follow_reporting_bounds() {
        assert_eq!(clamp_days(1), 3);
        assert_eq!(clamp_days(14), 14);
        assert_eq!(clamp_days(365), 90);
        assert_eq!(clamp_limit(0, 1, 100), 1);
        assert_eq!(clamp_limit(5000, 1, 100), 100);
    }
}
