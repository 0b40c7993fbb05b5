//! The audit workflow around the core pipeline.
//!
//! The collector owns the two fatal steps: opening the session and
//! persisting the report. The session is closed on every exit path.

use dbaudit_core::{
    AuditCatalog, AuditPipeline, AuditReport, AuditSession, Result, save_report,
};
use std::path::Path;
use tracing::error;

#[cfg(feature = "postgresql")]
use dbaudit_core::{PostgresSession, error::redact_database_url};
#[cfg(feature = "postgresql")]
use tracing::info;

/// Runs the pipeline on an open session and writes the report.
///
/// The session is closed whether or not the run succeeds.
///
/// # Errors
/// Returns `DbAuditError::ReportWrite` or a validation error if the report
/// cannot be persisted.
pub async fn audit_and_save(
    session: &dyn AuditSession,
    catalog: &AuditCatalog,
    output_path: &Path,
) -> Result<AuditReport> {
    let outcome = run_and_save(session, catalog, output_path).await;
    session.close().await;
    outcome
}

async fn run_and_save(
    session: &dyn AuditSession,
    catalog: &AuditCatalog,
    output_path: &Path,
) -> Result<AuditReport> {
    let mut pipeline = AuditPipeline::new(catalog);
    pipeline.attach(session);
    let report = pipeline.run().await?;

    save_report(&report, output_path).await.map_err(|e| {
        error!("Failed to save audit report: {}", e);
        e
    })?;

    Ok(report)
}

/// Connects to the live database and runs the full audit.
///
/// # Errors
/// Returns `DbAuditError::Connection` or `DbAuditError::Configuration` if
/// the session cannot be opened, and the errors of [`audit_and_save`].
#[cfg(feature = "postgresql")]
pub async fn audit_database(database_url: &str, output_path: &Path) -> Result<AuditReport> {
    info!("Starting database audit...");
    info!("Target: {}", redact_database_url(database_url));
    info!("Output: {}", output_path.display());

    let session = PostgresSession::connect(database_url).await.map_err(|e| {
        error!("Failed to open audit session: {}", e);
        e
    })?;

    audit_and_save(&session, &AuditCatalog::listings(), output_path).await
}

/// Tests database connection without auditing anything.
#[cfg(feature = "postgresql")]
pub async fn test_connection(database_url: &str) -> Result<()> {
    info!("Testing database connection...");
    info!("Target: {}", redact_database_url(database_url));

    let session = PostgresSession::connect(database_url).await?;
    let outcome = session.test_connection().await;
    let target = session.config().to_string();
    session.close().await;

    outcome.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;

    info!("✓ Connection test successful");
    println!("Connection to {} successful", target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbaudit_core::{DbAuditError, load_report};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_report_written_and_session_closed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database_audit_report.json");
        let session = dbaudit_core::MemorySession::new();

        let report = audit_and_save(&session, &AuditCatalog::listings(), &path)
            .await
            .unwrap();

        assert!(session.is_closed());
        let loaded = load_report(&path).await.unwrap();
        assert_eq!(loaded.grade, report.grade);
        assert_eq!(loaded.recommendations, report.recommendations);
    }

    #[tokio::test]
    async fn test_unwritable_report_is_fatal_and_session_closed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("report.json");
        let session = dbaudit_core::MemorySession::new();

        let err = audit_and_save(&session, &AuditCatalog::listings(), &path)
            .await
            .unwrap_err();

        assert!(matches!(err, DbAuditError::ReportWrite { .. }));
        assert!(err.is_fatal());
        assert!(session.is_closed());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_existing_report_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("database_audit_report.json");
        std::fs::write(&path, "stale").unwrap();

        let session = dbaudit_core::MemorySession::new();
        audit_and_save(&session, &AuditCatalog::listings(), &path)
            .await
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with('{'));
        assert!(written.contains("\"format_version\": \"1.0\""));
    }
}
