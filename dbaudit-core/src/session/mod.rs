//! Database session seam used by every auditor.
//!
//! The auditors only ever need "execute a query, get rows back". That is the
//! whole `AuditSession` contract, which keeps each auditor testable against
//! the scripted [`MemorySession`] and runnable against a live
//! [`PostgresSession`].
//!
//! # Module Structure
//! - `config`: connection string parsing and validation
//! - `memory`: scripted in-memory session
//! - `postgres`: live PostgreSQL session (feature `postgresql`)

mod config;
mod memory;
#[cfg(feature = "postgresql")]
mod postgres;

pub use config::ConnectionConfig;
pub use memory::MemorySession;
#[cfg(feature = "postgresql")]
pub use postgres::PostgresSession;

use crate::{Result, error::DbAuditError};
use async_trait::async_trait;
use serde_json::Value;

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// A single open database session.
///
/// # Contract
/// - Statements run in auto-commit mode; no auditor opens a transaction.
/// - `fetch_rows` fully materializes the result set before returning.
/// - Implementations never include credentials in returned errors.
#[async_trait]
pub trait AuditSession: Send + Sync {
    /// Executes a compiled-in statement and returns every row.
    ///
    /// # Errors
    /// Returns `DbAuditError::QueryExecution` if the statement fails.
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>>;

    /// Releases the session. Safe to call more than once.
    async fn close(&self);
}

/// Typed access to JSON row values with consistent error context.
pub trait RowExt {
    /// Reads a text column.
    fn get_text(&self, field: &str) -> Result<&str>;

    /// Reads a text column that may be NULL.
    fn get_optional_text(&self, field: &str) -> Option<&str>;

    /// Reads an integer column.
    fn get_i64(&self, field: &str) -> Result<i64>;
}

impl RowExt for Row {
    fn get_text(&self, field: &str) -> Result<&str> {
        self.get(field).and_then(Value::as_str).ok_or_else(|| {
            DbAuditError::unexpected_rows(format!("column '{}' is missing or not text", field))
        })
    }

    fn get_optional_text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn get_i64(&self, field: &str) -> Result<i64> {
        self.get(field).and_then(Value::as_i64).ok_or_else(|| {
            DbAuditError::unexpected_rows(format!("column '{}' is missing or not an integer", field))
        })
    }
}

/// Runs a single-value `COUNT(*)` statement and returns the count.
///
/// The count is read from the first column of the first row, whatever its
/// name.
pub async fn fetch_count(session: &dyn AuditSession, sql: &str) -> Result<i64> {
    let rows = session.fetch_rows(sql).await?;
    rows.first()
        .and_then(|row| row.values().next())
        .and_then(Value::as_i64)
        .ok_or_else(|| DbAuditError::unexpected_rows("count statement returned no integer value"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows must be objects"),
        }
    }

    #[test]
    fn test_row_ext_reads_typed_values() {
        let r = row(json!({"table_name": "users", "count": 4, "role": null}));
        assert_eq!(r.get_text("table_name").unwrap(), "users");
        assert_eq!(r.get_i64("count").unwrap(), 4);
        assert_eq!(r.get_optional_text("role"), None);
        assert!(r.get_text("count").is_err());
        assert!(r.get_i64("missing").is_err());
    }

    #[tokio::test]
    async fn test_fetch_count_reads_first_value() {
        let session = MemorySession::new().with_count("SELECT COUNT(*) AS count FROM users", 12);
        let count = fetch_count(&session, "SELECT COUNT(*) AS count FROM users")
            .await
            .unwrap();
        assert_eq!(count, 12);
    }

    #[tokio::test]
    async fn test_fetch_count_rejects_empty_result() {
        let session = MemorySession::new().with_rows("SELECT 1", vec![]);
        assert!(fetch_count(&session, "SELECT 1").await.is_err());
    }
}
