//! Schema completeness auditor.
//!
//! Compares the live column inventory of the audited namespace against the
//! compiled-in expected schema, then scores indexes, foreign keys and enum
//! types. Every introspection query is independent: a failure degrades that
//! metric to "0 found" and the remaining metrics are still collected.

use super::describe;
use crate::catalog::{
    COLUMNS_SQL, ENUM_TYPE_SUFFIXES, ENUM_TYPES_SQL, EXTRA_COLUMN_PENALTY, ExpectedSchema,
    FOREIGN_KEYS_SQL, INDEXES_SQL, MISSING_COLUMN_PENALTY, POINTS_PER_ENUM_TYPE,
    POINTS_PER_FOREIGN_KEY, POINTS_PER_INDEX, TableSpec,
};
use crate::error::DbAuditError;
use crate::models::{
    ColumnDescriptor, ForeignKeyInfo, IndexInfo, SchemaAuditResult, TableAuditResult, clamp_score,
};
use crate::session::{AuditSession, RowExt};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Audits schema completeness. Never fails; see the module docs.
pub async fn audit_schema(
    session: &dyn AuditSession,
    expected: &ExpectedSchema,
) -> SchemaAuditResult {
    let mut warnings = Vec::new();

    tracing::info!("Auditing schema completeness ({} expected tables)", expected.len());

    let columns = match collect_columns(session).await {
        Ok(columns) => {
            tracing::debug!("Collected {} live columns", columns.len());
            columns
        }
        Err(e) => {
            let warning = format!("Failed to collect columns: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };

    let live = group_columns(&columns);
    let mut tables = BTreeMap::new();
    for table in expected.tables {
        let result = score_table(table, live.get(table.name));
        if result.exists {
            tracing::info!(
                "  {:15} {:3}/100 ({} columns, {} missing, {} extra)",
                table.name,
                result.score,
                result.column_count,
                result.missing_columns.len(),
                result.extra_columns.len()
            );
        } else {
            tracing::info!("  {:15} missing", table.name);
        }
        tables.insert(table.name.to_string(), result);
    }

    let indexes = match collect_indexes(session).await {
        Ok(indexes) => indexes,
        Err(e) => {
            let warning = format!("Failed to collect indexes: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };

    let foreign_keys = match collect_foreign_keys(session).await {
        Ok(foreign_keys) => foreign_keys,
        Err(e) => {
            let warning = format!("Failed to collect foreign keys: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };

    let enum_types = match collect_enum_types(session).await {
        Ok(enum_types) => enum_types,
        Err(e) => {
            let warning = format!("Failed to collect enum types: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };

    let table_scores: Vec<f64> = tables.values().map(|t| f64::from(t.score)).collect();
    let table_score = crate::models::mean(&table_scores).unwrap_or(0.0);
    let index_score = capped_points(indexes.len(), POINTS_PER_INDEX);
    let constraint_score = capped_points(foreign_keys.len(), POINTS_PER_FOREIGN_KEY);
    let type_score = capped_points(enum_types.len(), POINTS_PER_ENUM_TYPE);
    let score = clamp_score((table_score + index_score + constraint_score + type_score) / 4.0);

    tracing::info!(
        "  Indexes: {}, foreign keys: {}, enum types: {}",
        indexes.len(),
        foreign_keys.len(),
        enum_types.len()
    );
    tracing::info!("Schema score: {:.1}/100", score);

    SchemaAuditResult {
        tables,
        index_count: indexes.len(),
        indexes,
        foreign_key_count: foreign_keys.len(),
        foreign_keys,
        enum_type_count: enum_types.len(),
        enum_types,
        table_score,
        index_score,
        constraint_score,
        type_score,
        score,
        warnings,
    }
}

/// Scores one expected table against its live column set.
///
/// `live` is `None` when the table does not exist.
pub fn score_table(table: &TableSpec, live: Option<&BTreeSet<String>>) -> TableAuditResult {
    let Some(live) = live else {
        return TableAuditResult::missing();
    };

    let expected: BTreeSet<String> = table.columns.iter().map(|c| (*c).to_string()).collect();
    let missing_columns: BTreeSet<String> = expected.difference(live).cloned().collect();
    let extra_columns: BTreeSet<String> = live.difference(&expected).cloned().collect();

    let penalty = MISSING_COLUMN_PENALTY.saturating_mul(count_u32(missing_columns.len()))
        .saturating_add(EXTRA_COLUMN_PENALTY.saturating_mul(count_u32(extra_columns.len())));

    TableAuditResult {
        exists: true,
        column_count: live.len(),
        missing_columns,
        extra_columns,
        score: 100u32.saturating_sub(penalty),
    }
}

/// `min(100, points * count)`.
pub fn capped_points(count: usize, points: u32) -> f64 {
    (f64::from(points) * count as f64).min(100.0)
}

/// Whether an enum name follows the application's naming convention.
pub fn is_application_enum(name: &str) -> bool {
    ENUM_TYPE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn group_columns(columns: &[ColumnDescriptor]) -> BTreeMap<&str, BTreeSet<String>> {
    let mut grouped: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for column in columns {
        grouped
            .entry(column.table.as_str())
            .or_default()
            .insert(column.column.clone());
    }
    grouped
}

async fn collect_columns(session: &dyn AuditSession) -> Result<Vec<ColumnDescriptor>> {
    let rows = session
        .fetch_rows(COLUMNS_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("column inventory", e))?;

    rows.iter()
        .map(|row| {
            Ok(ColumnDescriptor {
                table: row.get_text("table_name")?.to_string(),
                column: row.get_text("column_name")?.to_string(),
                data_type: row.get_optional_text("data_type").unwrap_or_default().to_string(),
                nullable: row.get_optional_text("is_nullable") == Some("YES"),
            })
        })
        .collect()
}

async fn collect_indexes(session: &dyn AuditSession) -> Result<Vec<IndexInfo>> {
    let rows = session
        .fetch_rows(INDEXES_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("index inventory", e))?;

    rows.iter()
        .map(|row| {
            Ok(IndexInfo {
                name: row.get_text("index_name")?.to_string(),
                table: row.get_text("table_name")?.to_string(),
            })
        })
        .collect()
}

async fn collect_foreign_keys(session: &dyn AuditSession) -> Result<Vec<ForeignKeyInfo>> {
    let rows = session
        .fetch_rows(FOREIGN_KEYS_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("foreign key inventory", e))?;

    let mut seen = BTreeSet::new();
    let mut foreign_keys = Vec::new();
    for row in &rows {
        let table = row.get_text("table_name")?;
        let constraint = row.get_text("constraint_name")?;
        if seen.insert((table, constraint)) {
            foreign_keys.push(ForeignKeyInfo {
                table: table.to_string(),
                constraint: constraint.to_string(),
            });
        }
    }
    Ok(foreign_keys)
}

async fn collect_enum_types(session: &dyn AuditSession) -> Result<Vec<String>> {
    let rows = session
        .fetch_rows(ENUM_TYPES_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("enum type inventory", e))?;

    let mut names = BTreeSet::new();
    for row in &rows {
        let name = row.get_text("type_name")?;
        if is_application_enum(name) {
            names.insert(name.to_string());
        } else {
            tracing::trace!("Ignoring enum type '{}'", name);
        }
    }
    Ok(names.into_iter().collect())
}
