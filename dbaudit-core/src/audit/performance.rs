//! Query latency auditor.
//!
//! Times a fixed set of representative queries, including full
//! materialization of the result set. The score is a coarse linear
//! heuristic (`100 - mean ms`), not a latency objective.

use super::describe;
use crate::catalog::BenchmarkQuery;
use crate::models::{PerformanceAuditResult, QueryOutcome, QueryStatus, clamp_score, mean};
use crate::session::AuditSession;
use std::collections::BTreeMap;
use std::time::Instant;

/// Times every benchmark query. Errored queries are recorded with their
/// error and left out of the mean; when none succeeds the score is 0.
pub async fn audit_performance(
    session: &dyn AuditSession,
    queries: &[BenchmarkQuery],
) -> PerformanceAuditResult {
    let mut warnings = Vec::new();
    let mut outcomes = BTreeMap::new();
    let mut timings = Vec::with_capacity(queries.len());

    tracing::info!("Auditing performance ({} queries)", queries.len());

    for query in queries {
        let start = Instant::now();
        let outcome = match session.fetch_rows(query.sql).await {
            Ok(rows) => {
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                let status = QueryStatus::classify(elapsed_ms);
                tracing::info!(
                    "  {}: {:.2}ms ({} rows, {:?})",
                    query.name,
                    elapsed_ms,
                    rows.len(),
                    status
                );
                timings.push(elapsed_ms);
                QueryOutcome::Timed {
                    time_ms: round_ms(elapsed_ms),
                    status,
                }
            }
            Err(e) => {
                let error = describe(&e);
                let warning = format!("Query {} failed: {}", query.name, error);
                tracing::warn!("{}", warning);
                warnings.push(warning);
                QueryOutcome::Failed { error }
            }
        };
        outcomes.insert(query.name.to_string(), outcome);
    }

    let average_time_ms = mean(&timings);
    let score = performance_score(average_time_ms);

    match average_time_ms {
        Some(avg) => tracing::info!("Performance score: {:.1}/100 (mean {:.2}ms)", score, avg),
        None => tracing::warn!("Performance score: 0/100 (no query succeeded)"),
    }

    PerformanceAuditResult {
        queries: outcomes,
        average_time_ms: average_time_ms.map(round_ms),
        score,
        warnings,
    }
}

/// `max(0, 100 - mean_ms)`, or 0 when there is no mean.
pub fn performance_score(average_time_ms: Option<f64>) -> f64 {
    average_time_ms.map_or(0.0, |avg| clamp_score(100.0 - avg))
}

fn round_ms(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LISTING_BENCHMARKS;
    use crate::session::MemorySession;
    use std::time::Duration;

    #[test]
    fn test_performance_score() {
        assert_eq!(performance_score(None), 0.0);
        assert_eq!(performance_score(Some(12.5)), 87.5);
        assert_eq!(performance_score(Some(250.0)), 0.0);
    }

    #[test]
    fn test_round_ms() {
        assert_eq!(round_ms(12.3456), 12.35);
        assert_eq!(round_ms(0.0), 0.0);
    }

    #[tokio::test]
    async fn test_every_query_timed() {
        let mut session = MemorySession::new();
        for query in LISTING_BENCHMARKS {
            session = session.with_rows(query.sql, vec![]);
        }

        let result = audit_performance(&session, LISTING_BENCHMARKS).await;
        assert_eq!(result.queries.len(), 4);
        assert!(result.warnings.is_empty());
        for outcome in result.queries.values() {
            assert!(matches!(
                outcome,
                QueryOutcome::Timed {
                    status: QueryStatus::Fast,
                    ..
                }
            ));
        }
        assert!(result.score > 90.0 && result.score <= 100.0);
    }

    #[tokio::test]
    async fn test_failed_query_excluded_from_mean() {
        let session = MemorySession::new()
            .with_rows(LISTING_BENCHMARKS[0].sql, vec![])
            .with_rows(LISTING_BENCHMARKS[1].sql, vec![])
            .with_rows(LISTING_BENCHMARKS[2].sql, vec![])
            .with_failure(LISTING_BENCHMARKS[3].sql, "canceling statement due to statement timeout");

        let result = audit_performance(&session, LISTING_BENCHMARKS).await;

        assert_eq!(result.queries.len(), 4);
        let failed = &result.queries["listings_join"];
        assert_eq!(failed.time_ms(), None);
        assert!(matches!(failed, QueryOutcome::Failed { error } if error.contains("statement timeout")));
        assert_eq!(result.warnings.len(), 1);

        let successful: Vec<f64> = result.queries.values().filter_map(QueryOutcome::time_ms).collect();
        assert_eq!(successful.len(), 3);
        assert!(result.average_time_ms.is_some());
        assert!(result.score > 90.0);
    }

    #[tokio::test]
    async fn test_no_successful_query_scores_zero() {
        let session = MemorySession::new();
        let result = audit_performance(&session, LISTING_BENCHMARKS).await;
        assert_eq!(result.average_time_ms, None);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.warnings.len(), 4);
    }

    #[tokio::test]
    async fn test_slow_query_classified() {
        let query = BenchmarkQuery {
            name: "slow_scan",
            sql: "SELECT * FROM listings",
        };
        let session = MemorySession::new()
            .with_rows(query.sql, vec![])
            .with_latency(query.sql, Duration::from_millis(150));

        let result = audit_performance(&session, &[query]).await;
        let outcome = &result.queries["slow_scan"];
        assert!(matches!(
            outcome,
            QueryOutcome::Timed {
                status: QueryStatus::Slow,
                ..
            }
        ));
        assert!(outcome.time_ms().is_some_and(|ms| ms >= 150.0));
        assert_eq!(result.score, 0.0);
    }
}
