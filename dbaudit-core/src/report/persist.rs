//! Reading and writing the report file.

use crate::error::DbAuditError;
use crate::models::AuditReport;
use crate::validation::{parse_report, validate_report_json};
use crate::Result;
use std::path::Path;

/// Well-known report location, relative to the working directory.
pub const DEFAULT_REPORT_PATH: &str = "database_audit_report.json";

/// Serializes a report as pretty-printed JSON.
pub fn to_pretty_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(|e| DbAuditError::Serialization {
        context: "audit report".to_string(),
        source: e,
    })
}

/// Validates the report and writes it, replacing any previous file.
///
/// # Errors
/// Returns `DbAuditError::Validation` if the report does not pass
/// validation and `DbAuditError::ReportWrite` if the file cannot be written.
pub async fn save_report(report: &AuditReport, output_path: &Path) -> Result<()> {
    let json_value = serde_json::to_value(report).map_err(|e| DbAuditError::Serialization {
        context: "audit report".to_string(),
        source: e,
    })?;
    validate_report_json(&json_value)?;
    tracing::debug!("Report validation passed");

    let json_data = to_pretty_json(report)?;
    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| DbAuditError::ReportWrite {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    tracing::info!("Report saved to {}", output_path.display());
    Ok(())
}

/// Reads and validates a persisted report.
///
/// # Errors
/// Returns `DbAuditError::Io` if the file cannot be read and
/// `DbAuditError::Validation` if its content is not a valid report.
pub async fn load_report(input_path: &Path) -> Result<AuditReport> {
    let json_data = tokio::fs::read_to_string(input_path)
        .await
        .map_err(|e| DbAuditError::Io {
            context: format!("Failed to read {}", input_path.display()),
            source: e,
        })?;

    let report = parse_report(&json_data)?;
    tracing::debug!("Loaded report from {}", input_path.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::sample_report;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_REPORT_PATH);
        let report = sample_report();

        save_report(&report, &path).await.unwrap();
        let loaded = load_report(&path).await.unwrap();

        assert_eq!(loaded.grade, report.grade);
        assert_eq!(loaded.timestamp, report.timestamp);
        assert_eq!(loaded.data.table_counts, report.data.table_counts);
        assert_eq!(loaded.performance.queries, report.performance.queries);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "stale content that is much longer than nothing").unwrap();

        save_report(&sample_report(), &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with('{'));
        assert!(!written.contains("stale"));
    }

    #[tokio::test]
    async fn test_unwritable_path_is_report_write_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("report.json");

        let err = save_report(&sample_report(), &path).await.unwrap_err();
        assert!(matches!(err, DbAuditError::ReportWrite { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_report_with_leaked_credentials_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = sample_report();
        report
            .data
            .warnings
            .push("could not reach postgres://admin:hunter2@db/app".to_string());

        let err = save_report(&report, &path).await.unwrap_err();
        assert!(matches!(err, DbAuditError::Validation { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "{\"format_version\": \"1.0\"}").unwrap();

        let err = load_report(&path).await.unwrap_err();
        assert!(matches!(err, DbAuditError::Validation { .. }));

        let err = load_report(&dir.path().join("absent.json")).await.unwrap_err();
        assert!(matches!(err, DbAuditError::Io { .. }));
    }
}
