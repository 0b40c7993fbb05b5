//! Report fixtures shared by unit tests.

use crate::models::*;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, BTreeSet};

pub(crate) fn fixed_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_default()
}

pub(crate) fn schema_result(score: f64) -> SchemaAuditResult {
    let mut tables = BTreeMap::new();
    tables.insert(
        "users".to_string(),
        TableAuditResult {
            exists: true,
            column_count: 6,
            missing_columns: BTreeSet::new(),
            extra_columns: ["phone".to_string()].into_iter().collect(),
            score: 95,
        },
    );
    tables.insert("news".to_string(), TableAuditResult::missing());

    SchemaAuditResult {
        tables,
        index_count: 1,
        indexes: vec![IndexInfo {
            name: "idx_listings_district".to_string(),
            table: "listings".to_string(),
        }],
        foreign_key_count: 1,
        foreign_keys: vec![ForeignKeyInfo {
            table: "listings".to_string(),
            constraint: "listings_user_id_fkey".to_string(),
        }],
        enum_type_count: 1,
        enum_types: vec!["listing_type".to_string()],
        table_score: 47.5,
        index_score: 10.0,
        constraint_score: 15.0,
        type_score: 20.0,
        score,
        warnings: vec![],
    }
}

pub(crate) fn data_result(score: f64) -> DataAuditResult {
    DataAuditResult {
        table_counts: [("users", 3), ("listings", 0), ("news", -1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        quality: [("users".to_string(), 100)].into_iter().collect(),
        quality_scores: vec![100],
        quality_average: 100.0,
        orphan_counts: [("listings.user_id -> users".to_string(), 0)]
            .into_iter()
            .collect(),
        integrity_score: 100,
        total_records: 3,
        count_score: 6.0,
        score,
        warnings: vec!["Failed to count rows in news: relation \"news\" does not exist".to_string()],
    }
}

pub(crate) fn performance_result(score: f64) -> PerformanceAuditResult {
    let mut queries = BTreeMap::new();
    queries.insert(
        "users_count".to_string(),
        QueryOutcome::Timed {
            time_ms: 12.5,
            status: QueryStatus::Fast,
        },
    );
    queries.insert(
        "listings_join".to_string(),
        QueryOutcome::Failed {
            error: "relation \"listings\" does not exist".to_string(),
        },
    );

    PerformanceAuditResult {
        queries,
        average_time_ms: Some(12.5),
        score,
        warnings: vec![],
    }
}

pub(crate) fn security_result(score: f64) -> SecurityAuditResult {
    SecurityAuditResult {
        policy_count: 0,
        policies: vec![],
        role_distribution: [("user".to_string(), 3)].into_iter().collect(),
        score,
        warnings: vec![],
    }
}

pub(crate) fn with_scores(schema: f64, data: f64, performance: f64, security: f64) -> AuditReport {
    AuditReport::assemble(
        schema_result(schema),
        data_result(data),
        performance_result(performance),
        security_result(security),
        fixed_timestamp(),
    )
}

pub(crate) fn sample_report() -> AuditReport {
    with_scores(23.125, 35.333333333333336, 87.5, 70.0)
}
