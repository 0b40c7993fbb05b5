//! Core of the dbaudit database auditor.
//!
//! This crate holds everything one audit run needs: the compiled-in catalog
//! of expectations, the session seam, the four auditors, report generation
//! and persistence, and the completion analysis used by the post-processor.
//!
//! # Security Guarantees
//! - Sessions are forced read-only; no auditor issues DDL or DML
//! - Only compiled-in statements are sent to the database
//! - Connection strings are redacted in errors and logs and rejected in reports
//!
//! # Architecture
//! - `AuditSession` trait abstracts "execute query, get rows"
//! - Each auditor is fail-soft: failures degrade one metric and become warnings
//! - The report is an immutable value assembled from four independent results

/// Completion analysis of a saved report.
pub mod analysis;
/// The four auditors and the pipeline that runs them.
pub mod audit;
/// Compiled-in expectations and scoring weights.
pub mod catalog;
/// Error types.
pub mod error;
/// Tracing setup.
pub mod logging;
/// Audit result and report types.
pub mod models;
/// Scoring, grading and report persistence.
pub mod report;
/// Database session abstraction.
pub mod session;
/// Report schema validation.
pub mod validation;

// Re-export commonly used types
pub use analysis::CompletionAnalysis;
pub use audit::{AuditPipeline, AuditStage};
pub use catalog::AuditCatalog;
pub use error::{DbAuditError, Result};
pub use models::{AuditArea, AuditReport, Grade, Recommendation};
pub use report::{DEFAULT_REPORT_PATH, generate_report, load_report, save_report};
pub use session::{AuditSession, ConnectionConfig, MemorySession};

#[cfg(feature = "postgresql")]
pub use session::PostgresSession;

pub use validation::{ValidationError, initialize_report_validator, validate_report_json};
