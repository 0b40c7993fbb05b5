//! Audit result models.
//!
//! Every result type is serializable and built once per run. Maps are
//! `BTreeMap` and sets are `BTreeSet` so the persisted report is
//! byte-for-byte reproducible for identical inputs.
//!
//! All scores live in `[0, 100]`; the helpers in this module clamp at every
//! site that produces one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Report format version written to and expected in every report.
pub const FORMAT_VERSION: &str = "1.0";

/// Clamps a score into `[0, 100]`. NaN collapses to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// One row of live column introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub table: String,
    pub column: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Comparison of one expected table against the live catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAuditResult {
    pub exists: bool,
    pub column_count: usize,
    pub missing_columns: BTreeSet<String>,
    pub extra_columns: BTreeSet<String>,
    /// 0..=100
    pub score: u32,
}

impl TableAuditResult {
    /// Result for an expected table that is absent from the database.
    pub fn missing() -> Self {
        Self {
            exists: false,
            column_count: 0,
            missing_columns: BTreeSet::new(),
            extra_columns: BTreeSet::new(),
            score: 0,
        }
    }
}

/// A non-primary-key index found in the audited namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub table: String,
}

/// A foreign key constraint found in the audited namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub table: String,
    pub constraint: String,
}

/// Schema completeness results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaAuditResult {
    pub tables: BTreeMap<String, TableAuditResult>,
    pub index_count: usize,
    pub indexes: Vec<IndexInfo>,
    pub foreign_key_count: usize,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub enum_type_count: usize,
    pub enum_types: Vec<String>,
    pub table_score: f64,
    pub index_score: f64,
    pub constraint_score: f64,
    pub type_score: f64,
    pub score: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl SchemaAuditResult {
    /// Number of expected tables that exist.
    pub fn working_tables(&self) -> usize {
        self.tables.values().filter(|t| t.exists).count()
    }
}

/// Data volume, validity and referential integrity results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAuditResult {
    /// Rows per table; `-1` when the table could not be counted.
    pub table_counts: BTreeMap<String, i64>,
    /// Per-table validity scores, keyed by table.
    pub quality: BTreeMap<String, u32>,
    /// The same scores in evaluation order.
    pub quality_scores: Vec<u32>,
    pub quality_average: f64,
    /// Orphaned rows per checked relationship.
    pub orphan_counts: BTreeMap<String, i64>,
    pub integrity_score: u32,
    pub total_records: i64,
    pub count_score: f64,
    pub score: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl DataAuditResult {
    /// Tables with at least one row.
    pub fn tables_with_data(&self) -> usize {
        self.table_counts.values().filter(|&&c| c > 0).count()
    }

    /// Tables that were counted and are empty.
    pub fn empty_tables(&self) -> Vec<&str> {
        self.table_counts
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Latency class of a timed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Fast,
    Slow,
    VerySlow,
}

impl QueryStatus {
    /// Classifies an elapsed time in milliseconds.
    pub fn classify(time_ms: f64) -> Self {
        if time_ms < crate::catalog::FAST_QUERY_MS {
            Self::Fast
        } else if time_ms < crate::catalog::SLOW_QUERY_MS {
            Self::Slow
        } else {
            Self::VerySlow
        }
    }
}

/// Outcome of one benchmark query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Timed { time_ms: f64, status: QueryStatus },
    Failed { error: String },
}

impl QueryOutcome {
    /// Elapsed time, if the query ran.
    pub fn time_ms(&self) -> Option<f64> {
        match self {
            Self::Timed { time_ms, .. } => Some(*time_ms),
            Self::Failed { .. } => None,
        }
    }
}

/// Query timing results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAuditResult {
    pub queries: BTreeMap<String, QueryOutcome>,
    /// Mean over successful queries; `None` when none succeeded.
    pub average_time_ms: Option<f64>,
    pub score: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// A row-level access policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInfo {
    pub table: String,
    pub policy: String,
    pub command: String,
}

/// Access policy and role results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAuditResult {
    pub policy_count: usize,
    pub policies: Vec<PolicyInfo>,
    pub role_distribution: BTreeMap<String, i64>,
    pub score: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Letter grade for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl Grade {
    /// Maps an overall score to its grade; lower bounds are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::APlus
        } else if score >= 80.0 {
            Self::A
        } else if score >= 70.0 {
            Self::BPlus
        } else if score >= 60.0 {
            Self::B
        } else {
            Self::C
        }
    }

    /// Grade as printed, e.g. `B+`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Human-readable status label carried with the grade.
    pub fn status(self) -> &'static str {
        match self {
            Self::APlus => "EXCELLENT - Production Ready",
            Self::A => "VERY GOOD - Minor improvements needed",
            Self::BPlus => "GOOD - Some improvements needed",
            Self::B => "FAIR - Significant improvements needed",
            Self::C => "POOR - Major fixes required",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four audited areas, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditArea {
    Schema,
    Data,
    Performance,
    Security,
}

impl AuditArea {
    /// Every area, in report order.
    pub const ALL: [Self; 4] = [Self::Schema, Self::Data, Self::Performance, Self::Security];

    /// Section title for the area.
    pub fn label(self) -> &'static str {
        match self {
            Self::Schema => "Schema Completeness",
            Self::Data => "Data Quality",
            Self::Performance => "Performance",
            Self::Security => "Security",
        }
    }
}

/// A remediation suggestion for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub area: AuditArea,
    pub message: String,
}

/// The complete result of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub format_version: String,
    pub timestamp: DateTime<Utc>,
    pub schema: SchemaAuditResult,
    pub data: DataAuditResult,
    pub performance: PerformanceAuditResult,
    pub security: SecurityAuditResult,
    pub overall_score: f64,
    pub grade: Grade,
    pub status: String,
    pub recommendations: Vec<Recommendation>,
    pub passing: bool,
}

impl AuditReport {
    /// Score of one area.
    pub fn area_score(&self, area: AuditArea) -> f64 {
        match area {
            AuditArea::Schema => self.schema.score,
            AuditArea::Data => self.data.score,
            AuditArea::Performance => self.performance.score,
            AuditArea::Security => self.security.score,
        }
    }

    /// Warnings from every auditor, prefixed with the area they came from.
    pub fn warnings(&self) -> Vec<String> {
        let sources = [
            (AuditArea::Schema, &self.schema.warnings),
            (AuditArea::Data, &self.data.warnings),
            (AuditArea::Performance, &self.performance.warnings),
            (AuditArea::Security, &self.security.warnings),
        ];
        sources
            .iter()
            .flat_map(|(area, warnings)| {
                warnings
                    .iter()
                    .map(move |w| format!("{}: {}", area.label(), w))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
