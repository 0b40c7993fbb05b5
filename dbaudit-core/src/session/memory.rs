//! Scripted in-memory session.
//!
//! Responses are keyed by the exact statement text. Any statement without a
//! scripted response fails, so an empty `MemorySession` behaves like a
//! database on which every introspection call is denied.

use super::{AuditSession, Row};
use crate::{Result, error::DbAuditError, error::Message};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Rows(Vec<Row>),
    Failure(String),
}

/// Session whose answers are fixed in advance.
///
/// # Example
/// ```rust
/// use dbaudit_core::session::{AuditSession, MemorySession};
/// use serde_json::json;
///
/// # async fn example() -> dbaudit_core::Result<()> {
/// let session = MemorySession::new()
///     .with_count("SELECT COUNT(*) AS count FROM users", 3)
///     .with_failure("SELECT * FROM pg_policies", "permission denied");
///
/// let rows = session.fetch_rows("SELECT COUNT(*) AS count FROM users").await?;
/// assert_eq!(rows[0]["count"], json!(3));
/// assert!(session.fetch_rows("SELECT * FROM pg_policies").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemorySession {
    responses: HashMap<String, Scripted>,
    latency: HashMap<String, Duration>,
    executed: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl MemorySession {
    /// An empty session: every statement fails until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the rows returned for a statement.
    pub fn with_rows(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.responses
            .insert(normalize(sql), Scripted::Rows(rows));
        self
    }

    /// Scripts rows given as JSON objects. Non-object values are ignored.
    pub fn with_json_rows(self, sql: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.with_rows(sql, rows)
    }

    /// Scripts a single `{"count": n}` row.
    pub fn with_count(self, sql: &str, count: i64) -> Self {
        self.with_json_rows(sql, vec![serde_json::json!({ "count": count })])
    }

    /// Scripts a failure for a statement.
    pub fn with_failure(mut self, sql: &str, message: &str) -> Self {
        self.responses
            .insert(normalize(sql), Scripted::Failure(message.to_string()));
        self
    }

    /// Delays the response to a statement, simulating a slow query.
    pub fn with_latency(mut self, sql: &str, latency: Duration) -> Self {
        self.latency.insert(normalize(sql), latency);
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl AuditSession for MemorySession {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let key = normalize(sql);

        if self.is_closed() {
            return Err(DbAuditError::query_failed(
                "session is closed",
                Message(key),
            ));
        }

        if let Ok(mut executed) = self.executed.lock() {
            executed.push(key.clone());
        }

        if let Some(latency) = self.latency.get(&key) {
            tokio::time::sleep(*latency).await;
        }

        match self.responses.get(&key) {
            Some(Scripted::Rows(rows)) => Ok(rows.clone()),
            Some(Scripted::Failure(message)) => Err(DbAuditError::query_failed(
                "scripted failure",
                Message(message.clone()),
            )),
            None => Err(DbAuditError::query_failed(
                "no scripted response",
                Message(key),
            )),
        }
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
