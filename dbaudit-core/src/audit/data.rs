//! Data quality auditor.
//!
//! Three signals, each collected check by check:
//! - row volume per expected table (`-1` when a table cannot be counted)
//! - validity check sets for tables that hold rows
//! - orphaned child rows per checked relationship
//!
//! A failed count or check never stops the remaining ones.

use super::describe;
use crate::catalog::{
    ORPHAN_PENALTY, POINTS_PER_RECORD, QualityCheckSet, RelationshipCheck, TableSpec,
};
use crate::error::DbAuditError;
use crate::models::{DataAuditResult, clamp_score, mean};
use crate::session::{AuditSession, fetch_count};
use crate::Result;
use std::collections::BTreeMap;

/// Sentinel recorded for a table whose row count could not be read.
pub const UNCOUNTED: i64 = -1;

/// Audits row volume, validity and referential integrity.
pub async fn audit_data(
    session: &dyn AuditSession,
    tables: &[TableSpec],
    checks: &[QualityCheckSet],
    relationships: &[RelationshipCheck],
) -> DataAuditResult {
    let mut warnings = Vec::new();

    tracing::info!("Auditing data quality ({} tables)", tables.len());

    let mut table_counts = BTreeMap::new();
    for table in tables {
        let count = match fetch_count(session, table.count_sql).await {
            Ok(count) => {
                tracing::info!("  {:15} {:4} records", table.name, count);
                count
            }
            Err(e) => {
                let warning = format!("Failed to count rows in {}: {}", table.name, describe(&e));
                tracing::warn!("{}", warning);
                warnings.push(warning);
                UNCOUNTED
            }
        };
        table_counts.insert(table.name.to_string(), count);
    }

    let mut quality = BTreeMap::new();
    let mut quality_scores = Vec::new();
    for set in checks {
        let rows = table_counts.get(set.table).copied().unwrap_or(UNCOUNTED);
        if rows <= 0 {
            tracing::debug!("Skipping validity checks for {} (no rows)", set.table);
            continue;
        }

        let score = match run_check_set(session, set).await {
            Ok(invalid) => {
                let score = quality_score(set.penalty, invalid);
                tracing::info!("  {} data quality: {}/100 ({} invalid)", set.table, score, invalid);
                score
            }
            Err(e) => {
                let warning = format!("Validity checks failed for {}: {}", set.table, describe(&e));
                tracing::warn!("{}", warning);
                warnings.push(warning);
                0
            }
        };
        quality.insert(set.table.to_string(), score);
        quality_scores.push(score);
    }

    let mut orphan_counts = BTreeMap::new();
    for relationship in relationships {
        match count_orphans(session, relationship).await {
            Ok(orphans) => {
                if orphans > 0 {
                    tracing::warn!("  Orphaned rows for {}: {}", relationship.label(), orphans);
                }
                orphan_counts.insert(relationship.label(), orphans);
            }
            Err(e) => {
                let warning = format!(
                    "Skipped integrity check {}: {}",
                    relationship.label(),
                    describe(&e)
                );
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    let total_records: i64 = table_counts.values().filter(|&&c| c > 0).sum();
    let scores: Vec<f64> = quality_scores.iter().map(|&s| f64::from(s)).collect();
    let quality_average = mean(&scores).unwrap_or(0.0);
    let integrity_score = integrity_score(orphan_counts.values().copied());
    let count_score = count_score(total_records);
    let score = clamp_score((count_score + quality_average + f64::from(integrity_score)) / 3.0);

    tracing::info!("Data score: {:.1}/100", score);

    DataAuditResult {
        table_counts,
        quality,
        quality_scores,
        quality_average,
        orphan_counts,
        integrity_score,
        total_records,
        count_score,
        score,
        warnings,
    }
}

/// `max(0, 100 - penalty * invalid)`.
pub fn quality_score(penalty: u32, invalid: i64) -> u32 {
    let deducted = i64::from(penalty).saturating_mul(invalid.max(0));
    u32::try_from((100 - deducted).clamp(0, 100)).unwrap_or(0)
}

/// Starts at 100 and loses a fixed penalty per orphaned row, floored at 0.
pub fn integrity_score(orphans: impl IntoIterator<Item = i64>) -> u32 {
    let total: i64 = orphans.into_iter().map(|o| o.max(0)).sum();
    quality_score(ORPHAN_PENALTY, total)
}

/// `min(100, 2 * total_records)`.
pub fn count_score(total_records: i64) -> f64 {
    (f64::from(POINTS_PER_RECORD) * total_records.max(0) as f64).min(100.0)
}

/// Runs every check of a set; any failure fails the whole set.
async fn run_check_set(session: &dyn AuditSession, set: &QualityCheckSet) -> Result<i64> {
    let mut invalid = 0i64;
    for check in set.checks {
        let count = fetch_count(session, check.sql).await.map_err(|e| {
            DbAuditError::data_check_failed(set.table, format!("{} check", check.column), e)
        })?;
        tracing::debug!("  {}.{}: {} invalid", set.table, check.column, count);
        invalid = invalid.saturating_add(count);
    }
    Ok(invalid)
}

async fn count_orphans(session: &dyn AuditSession, relationship: &RelationshipCheck) -> Result<i64> {
    fetch_count(session, relationship.sql).await.map_err(|e| {
        DbAuditError::data_check_failed(
            relationship.child,
            format!("orphan check on {}", relationship.foreign_key),
            e,
        )
    })
}
