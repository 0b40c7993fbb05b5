//! Console rendering for audit results and the compiled-in catalog.
//!
//! Everything here returns a `String`; the binary decides whether to print
//! it. Log lines go to stderr, these summaries go to stdout.

use dbaudit_core::{AuditArea, AuditCatalog, AuditReport};
use serde::Serialize;

const RULE_WIDTH: usize = 60;

/// Renders the end-of-run summary.
pub fn render_report(report: &AuditReport) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        rule.clone(),
        "LISTING DATABASE AUDIT REPORT".to_string(),
        rule.clone(),
        format!(
            "Audit Date: {}",
            report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        String::new(),
        "AUDIT SCORES:".to_string(),
    ];

    for area in AuditArea::ALL {
        lines.push(format!(
            "  {:<20}: {:6.1}/100",
            area.label(),
            report.area_score(area)
        ));
    }
    lines.push(format!("  {}", "-".repeat(31)));
    lines.push(format!("  {:<20}: {:6.1}/100", "OVERALL SCORE", report.overall_score));
    lines.push(String::new());
    lines.push(format!("GRADE: {}", report.grade));
    lines.push(format!("STATUS: {}", report.status));
    lines.push(String::new());

    let schema = &report.schema;
    let data = &report.data;
    lines.push("DETAILED FINDINGS:".to_string());
    lines.push(String::new());
    lines.push("Schema Analysis:".to_string());
    lines.push(format!("   Tables: {} defined", schema.tables.len()));
    lines.push(format!("   Indexes: {} performance indexes", schema.index_count));
    lines.push(format!("   Foreign Keys: {} relationships", schema.foreign_key_count));
    lines.push(format!("   Custom Types: {} enums", schema.enum_type_count));
    lines.push(String::new());
    lines.push("Data Analysis:".to_string());
    lines.push(format!("   Total Records: {}", data.total_records));
    lines.push(format!(
        "   Tables with Data: {}/{}",
        data.tables_with_data(),
        data.table_counts.len()
    ));
    lines.push(format!("   Data Quality: {:.1}%", data.quality_average));

    let warnings = report.warnings();
    if !warnings.is_empty() {
        lines.push(String::new());
        lines.push(format!("DEGRADED CHECKS ({}):", warnings.len()));
        lines.extend(warnings.iter().map(|w| format!("   ! {}", w)));
    }

    lines.push(String::new());
    lines.push("RECOMMENDATIONS:".to_string());
    if report.recommendations.is_empty() {
        lines.push("   Database is in excellent condition!".to_string());
        lines.push("   Ready for production deployment".to_string());
    } else {
        lines.extend(
            report
                .recommendations
                .iter()
                .map(|r| format!("   - {}", r.message)),
        );
    }
    lines.push(rule);

    lines.join("\n")
}

/// Serializable view of the catalog for `catalog --json`.
#[derive(Debug, Serialize)]
pub struct CatalogSummary {
    pub tables: Vec<TableSummary>,
    pub quality_checks: Vec<QualitySummary>,
    pub relationships: Vec<String>,
    pub benchmarks: Vec<&'static str>,
}

/// An expected table and its required columns.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// One quality check set: the table, its per-row penalty and the column rules.
#[derive(Debug, Serialize)]
pub struct QualitySummary {
    pub table: &'static str,
    pub penalty: u32,
    pub checks: Vec<RuleSummary>,
}

/// A column and the condition its values must meet.
#[derive(Debug, Serialize)]
pub struct RuleSummary {
    pub column: &'static str,
    pub rule: &'static str,
}

impl std::fmt::Display for RuleSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.column, self.rule)
    }
}

impl From<&AuditCatalog> for CatalogSummary {
    fn from(catalog: &AuditCatalog) -> Self {
        Self {
            tables: catalog
                .expected
                .tables
                .iter()
                .map(|t| TableSummary {
                    name: t.name,
                    columns: t.columns,
                })
                .collect(),
            quality_checks: catalog
                .quality_checks
                .iter()
                .map(|set| QualitySummary {
                    table: set.table,
                    penalty: set.penalty,
                    checks: set
                        .checks
                        .iter()
                        .map(|c| RuleSummary {
                            column: c.column,
                            rule: c.kind.rule(),
                        })
                        .collect(),
                })
                .collect(),
            relationships: catalog.relationships.iter().map(|r| r.label()).collect(),
            benchmarks: catalog.benchmarks.iter().map(|b| b.name).collect(),
        }
    }
}

/// Renders the catalog as an indented listing.
pub fn render_catalog(catalog: &AuditCatalog) -> String {
    let summary = CatalogSummary::from(catalog);
    let mut lines = vec![format!("Expected tables ({}):", summary.tables.len())];
    lines.extend(
        summary
            .tables
            .iter()
            .map(|t| format!("  {:<16} {}", t.name, t.columns.join(", "))),
    );

    lines.push(String::new());
    lines.push("Quality checks:".to_string());
    lines.extend(summary.quality_checks.iter().map(|q| {
        format!(
            "  {:<16} -{} per invalid row ({})",
            q.table,
            q.penalty,
            q.checks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }));

    lines.push(String::new());
    lines.push("Referential integrity:".to_string());
    lines.extend(summary.relationships.iter().map(|r| format!("  {}", r)));

    lines.push(String::new());
    lines.push("Benchmark queries:".to_string());
    lines.extend(summary.benchmarks.iter().map(|b| format!("  {}", b)));

    lines.join("\n")
}

/// Renders the catalog as pretty JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_catalog_json(catalog: &AuditCatalog) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&CatalogSummary::from(catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbaudit_core::catalog::{
        COLUMNS_SQL, ENUM_TYPES_SQL, FOREIGN_KEYS_SQL, INDEXES_SQL, LISTING_BENCHMARKS,
        LISTING_QUALITY_CHECKS, LISTING_RELATIONSHIPS, LISTING_TABLES, POLICIES_SQL, ROLE_DISTRIBUTION_SQL,
    };
    use dbaudit_core::{AuditPipeline, MemorySession};
    use serde_json::{Value, json};

    async fn audit(session: &MemorySession) -> AuditReport {
        let catalog = AuditCatalog::listings();
        let mut pipeline = AuditPipeline::new(&catalog);
        pipeline.attach(session);
        pipeline.run().await.unwrap()
    }

    /// Every table present, three users, nothing else.
    fn sparse_database() -> MemorySession {
        let columns: Vec<Value> = LISTING_TABLES
            .iter()
            .flat_map(|table| {
                table.columns.iter().map(move |column| {
                    json!({
                        "table_name": table.name,
                        "column_name": column,
                        "data_type": "text",
                        "is_nullable": "YES",
                    })
                })
            })
            .collect();

        let mut session = MemorySession::new()
            .with_json_rows(COLUMNS_SQL, columns)
            .with_json_rows(
                INDEXES_SQL,
                vec![json!({"index_name": "idx_listings_type", "table_name": "listings"})],
            )
            .with_rows(FOREIGN_KEYS_SQL, vec![])
            .with_rows(ENUM_TYPES_SQL, vec![])
            .with_rows(POLICIES_SQL, vec![])
            .with_rows(ROLE_DISTRIBUTION_SQL, vec![]);
        // Two benchmarks reuse the table count statements; script them first
        // so the counts below take precedence.
        for query in LISTING_BENCHMARKS {
            session = session.with_rows(query.sql, vec![]);
        }
        for table in LISTING_TABLES {
            let count = if table.name == "users" { 3 } else { 0 };
            session = session.with_count(table.count_sql, count);
        }
        for check in LISTING_QUALITY_CHECKS.iter().flat_map(|set| set.checks) {
            session = session.with_count(check.sql, 0);
        }
        for relationship in LISTING_RELATIONSHIPS {
            session = session.with_count(relationship.sql, 0);
        }
        session
    }

    #[tokio::test]
    async fn test_report_summary_sections() {
        let report = audit(&sparse_database()).await;
        let text = render_report(&report);

        assert!(text.starts_with(&"=".repeat(RULE_WIDTH)));
        assert!(text.contains("  Schema Completeness :"));
        assert!(text.contains("  Security            :   70.0/100"));
        assert!(text.contains(&format!("GRADE: {}", report.grade)));
        assert!(text.contains("   Tables: 8 defined"));
        assert!(text.contains("   Indexes: 1 performance indexes"));
        assert!(text.contains("   Total Records: 3"));
        assert!(text.contains("   Tables with Data: 1/8"));
        assert!(text.contains("RECOMMENDATIONS:"));
        for recommendation in &report.recommendations {
            assert!(text.contains(&recommendation.message));
        }
        assert!(!text.contains("excellent condition"));
    }

    #[tokio::test]
    async fn test_degraded_checks_listed() {
        let report = audit(&MemorySession::new()).await;
        let text = render_report(&report);

        assert!(text.contains("DEGRADED CHECKS"));
        assert!(text.contains("   Tables with Data: 0/8"));
    }

    #[tokio::test]
    async fn test_clean_report_has_no_degraded_section() {
        let report = audit(&sparse_database()).await;
        assert!(report.warnings().is_empty());
        assert!(!render_report(&report).contains("DEGRADED CHECKS"));
    }

    #[test]
    fn test_catalog_listing() {
        let text = render_catalog(&AuditCatalog::listings());

        assert!(text.starts_with("Expected tables (8):"));
        assert!(text.contains("  users "));
        assert!(text.contains("listings.user_id -> users"));
        assert!(text.contains("  listings_join"));
        assert!(text.contains("-20 per invalid row (email not empty, full_name not empty)"));
        assert!(text.contains("-10 per invalid row (title not empty, price > 0, area > 0)"));
    }

    #[test]
    fn test_catalog_json() {
        let json = render_catalog_json(&AuditCatalog::listings()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tables"].as_array().unwrap().len(), 8);
        assert_eq!(value["benchmarks"][0], "users_count");
        assert_eq!(value["quality_checks"][1]["penalty"], 10);
        assert_eq!(value["quality_checks"][1]["checks"][1]["column"], "price");
        assert_eq!(value["quality_checks"][1]["checks"][1]["rule"], "> 0");
    }
}
