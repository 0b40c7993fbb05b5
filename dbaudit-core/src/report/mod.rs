//! Report generation and persistence.
//!
//! [`generate_report`] combines the four auditor results into the immutable
//! [`AuditReport`]; [`save_report`] and [`load_report`] move it to and from
//! the well-known report file.

mod persist;

pub use persist::{DEFAULT_REPORT_PATH, load_report, save_report, to_pretty_json};

use crate::catalog::{PASSING_SCORE, RECOMMENDATION_THRESHOLD};
use crate::models::{
    AuditArea, AuditReport, DataAuditResult, FORMAT_VERSION, Grade, PerformanceAuditResult,
    Recommendation, SchemaAuditResult, SecurityAuditResult, clamp_score,
};
use chrono::{DateTime, Utc};

/// Fixed remediation suggestions per area.
pub fn remediation(area: AuditArea) -> [&'static str; 2] {
    match area {
        AuditArea::Schema => [
            "Add missing indexes for better performance",
            "Implement Row Level Security (RLS) policies",
        ],
        AuditArea::Data => [
            "Add more sample data for testing",
            "Implement data validation constraints",
        ],
        AuditArea::Performance => ["Optimize slow queries", "Add database connection pooling"],
        AuditArea::Security => [
            "Implement RLS policies for all tables",
            "Add authentication middleware",
        ],
    }
}

/// Builds the report, stamped with the current time.
pub fn generate_report(
    schema: SchemaAuditResult,
    data: DataAuditResult,
    performance: PerformanceAuditResult,
    security: SecurityAuditResult,
) -> AuditReport {
    AuditReport::assemble(schema, data, performance, security, Utc::now())
}

/// Unweighted mean of exactly four sub-scores, clamped to `[0, 100]`.
pub fn overall_score(schema: f64, data: f64, performance: f64, security: f64) -> f64 {
    clamp_score((schema + data + performance + security) / 4.0)
}

/// Two suggestions for every area scoring below the threshold, in area
/// order.
pub fn recommendations(scores: [(AuditArea, f64); 4]) -> Vec<Recommendation> {
    scores
        .iter()
        .filter(|(_, score)| *score < RECOMMENDATION_THRESHOLD)
        .flat_map(|(area, _)| {
            remediation(*area).into_iter().map(|message| Recommendation {
                area: *area,
                message: message.to_string(),
            })
        })
        .collect()
}

impl AuditReport {
    /// Builds the report for a given timestamp. Pure: identical inputs give
    /// identical reports.
    pub fn assemble(
        schema: SchemaAuditResult,
        data: DataAuditResult,
        performance: PerformanceAuditResult,
        security: SecurityAuditResult,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let overall_score =
            overall_score(schema.score, data.score, performance.score, security.score);
        let grade = Grade::from_score(overall_score);
        let recommendations = recommendations([
            (AuditArea::Schema, schema.score),
            (AuditArea::Data, data.score),
            (AuditArea::Performance, performance.score),
            (AuditArea::Security, security.score),
        ]);

        tracing::info!(
            "Overall score {:.1}/100, grade {} ({})",
            overall_score,
            grade,
            grade.status()
        );

        Self {
            format_version: FORMAT_VERSION.to_string(),
            timestamp,
            schema,
            data,
            performance,
            security,
            overall_score,
            grade,
            status: grade.status().to_string(),
            recommendations,
            passing: overall_score >= PASSING_SCORE,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures;
