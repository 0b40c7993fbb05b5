//! The four auditors and the linear pipeline that runs them.
//!
//! Each auditor is an async function of `(session, compiled-in catalog)`
//! that always returns its result: failures inside an auditor are logged,
//! recorded as warnings and degrade only the affected metric. The pipeline
//! composes the four results into one [`AuditReport`].
//!
//! # Module Structure
//! - `schema`: table, column, index, foreign key and enum completeness
//! - `data`: row volume, validity checks, referential integrity
//! - `performance`: benchmark query timing
//! - `security`: access policies and role distribution

/// Row volume, validity and orphan checks.
pub mod data;
/// Benchmark query timing.
pub mod performance;
/// Expected tables, indexes, foreign keys and enum types.
pub mod schema;
/// Access policies and role distribution.
pub mod security;

pub use data::audit_data;
pub use performance::audit_performance;
pub use schema::audit_schema;
pub use security::audit_security;

use crate::catalog::AuditCatalog;
use crate::error::DbAuditError;
use crate::models::AuditReport;
use crate::session::AuditSession;
use crate::{Result, report};
use serde::{Deserialize, Serialize};

/// Where a pipeline run currently is. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Disconnected,
    Connected,
    SchemaAudited,
    DataAudited,
    PerformanceAudited,
    SecurityAudited,
    Reported,
}

impl std::fmt::Display for AuditStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::SchemaAudited => "schema audited",
            Self::DataAudited => "data audited",
            Self::PerformanceAudited => "performance audited",
            Self::SecurityAudited => "security audited",
            Self::Reported => "reported",
        };
        f.write_str(name)
    }
}

/// Runs the auditors in order over one session.
///
/// # Example
/// ```rust
/// use dbaudit_core::audit::{AuditPipeline, AuditStage};
/// use dbaudit_core::catalog::AuditCatalog;
/// use dbaudit_core::session::MemorySession;
///
/// # async fn example() -> dbaudit_core::Result<()> {
/// let catalog = AuditCatalog::listings();
/// let session = MemorySession::new();
///
/// let mut pipeline = AuditPipeline::new(&catalog);
/// pipeline.attach(&session);
/// let report = pipeline.run().await?;
///
/// assert_eq!(pipeline.stage(), AuditStage::Reported);
/// assert!(report.overall_score <= 100.0);
/// # Ok(())
/// # }
/// ```
pub struct AuditPipeline<'a> {
    catalog: &'a AuditCatalog,
    session: Option<&'a dyn AuditSession>,
    stage: AuditStage,
}

impl<'a> AuditPipeline<'a> {
    /// Creates a disconnected pipeline over the given catalog.
    pub fn new(catalog: &'a AuditCatalog) -> Self {
        Self {
            catalog,
            session: None,
            stage: AuditStage::Disconnected,
        }
    }

    /// Hands the pipeline its open session.
    pub fn attach(&mut self, session: &'a dyn AuditSession) {
        if self.stage == AuditStage::Disconnected {
            self.session = Some(session);
            self.advance(AuditStage::Connected);
        } else {
            tracing::warn!("Session already attached (stage: {})", self.stage);
        }
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> AuditStage {
        self.stage
    }

    /// Runs all four auditors and builds the report.
    ///
    /// # Errors
    /// Returns `DbAuditError::Configuration` if no session is attached or the
    /// pipeline already ran. Auditor failures never surface here.
    pub async fn run(&mut self) -> Result<AuditReport> {
        let session = match (self.session, self.stage) {
            (Some(session), AuditStage::Connected) => session,
            (None, _) => {
                return Err(DbAuditError::configuration(
                    "audit pipeline has no open session",
                ));
            }
            (Some(_), stage) => {
                return Err(DbAuditError::configuration(format!(
                    "audit pipeline cannot run from stage '{}'",
                    stage
                )));
            }
        };

        let schema = audit_schema(session, &self.catalog.expected).await;
        self.advance(AuditStage::SchemaAudited);

        let data = audit_data(
            session,
            self.catalog.expected.tables,
            self.catalog.quality_checks,
            self.catalog.relationships,
        )
        .await;
        self.advance(AuditStage::DataAudited);

        let performance = audit_performance(session, self.catalog.benchmarks).await;
        self.advance(AuditStage::PerformanceAudited);

        let security = audit_security(session).await;
        self.advance(AuditStage::SecurityAudited);

        let report = report::generate_report(schema, data, performance, security);
        self.advance(AuditStage::Reported);

        Ok(report)
    }

    fn advance(&mut self, next: AuditStage) {
        debug_assert!(next > self.stage, "pipeline stages only move forward");
        tracing::debug!("Audit stage: {} -> {}", self.stage, next);
        self.stage = next;
    }
}

/// Renders an error with its whole source chain, e.g.
/// `Introspection failed: index inventory: permission denied`.
pub(crate) fn describe(error: &DbAuditError) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let message = cause.to_string();
        if parts.last().is_none_or(|last| !last.ends_with(&message)) {
            parts.push(message);
        }
        source = cause.source();
    }
    parts.join(": ")
}
