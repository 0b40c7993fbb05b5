//! Connection string parsing and validation.
//!
//! # Security
//! `ConnectionConfig` intentionally does NOT store passwords. The raw
//! connection string is handed straight to the driver and never kept.

use crate::{Result, error::DbAuditError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const DEFAULT_PORT: u16 = 5432;
const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection parameters extracted from the connection string.
///
/// # Example
/// ```rust
/// use dbaudit_core::session::ConnectionConfig;
///
/// let config = ConnectionConfig::parse("postgres://auditor@db.example.com/listings").unwrap();
/// assert_eq!(config.port, Some(5432));
/// assert!(config.read_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Port number
    pub port: Option<u16>,
    /// Database name
    pub database: Option<String>,
    /// Username (password handled separately)
    pub username: Option<String>,
    /// Time allowed to establish the session
    pub connect_timeout: Duration,
    /// Per-statement timeout set on the session
    pub statement_timeout: Duration,
    /// Whether the session is forced read-only
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            statement_timeout: Duration::from_secs(30),
            read_only: true,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
    }
}

impl ConnectionConfig {
    /// Parses and validates a PostgreSQL connection URL.
    ///
    /// Recognized query parameters: `connect_timeout` (seconds) and
    /// `statement_timeout` (milliseconds). Others are left to the driver.
    ///
    /// # Errors
    /// Returns `DbAuditError::Configuration` if the URL is malformed, uses a
    /// non-postgres scheme, has no host, or asks for a timeout above 300 s.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let url = Url::parse(connection_string).map_err(|e| {
            DbAuditError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(DbAuditError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DbAuditError::configuration("Connection string must specify a host"))?;

        let mut config = Self {
            host: host.to_string(),
            port: Some(url.port().unwrap_or(DEFAULT_PORT)),
            ..Self::default()
        };

        let database = url.path().trim_start_matches('/');
        if !database.is_empty() {
            config.database = Some(database.to_string());
        }

        if !url.username().is_empty() {
            config.username = Some(url.username().to_string());
        }

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "connect_timeout" => {
                    config.connect_timeout = parse_timeout(&value, Duration::from_secs)?;
                }
                "statement_timeout" => {
                    config.statement_timeout = parse_timeout(&value, Duration::from_millis)?;
                }
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates connection parameters.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(DbAuditError::configuration("host cannot be empty"));
        }

        if self.port == Some(0) {
            return Err(DbAuditError::configuration("port must be greater than 0"));
        }

        if self.connect_timeout.is_zero() || self.statement_timeout.is_zero() {
            return Err(DbAuditError::configuration("timeouts must be greater than 0"));
        }

        if self.connect_timeout > MAX_TIMEOUT || self.statement_timeout > MAX_TIMEOUT {
            return Err(DbAuditError::configuration(
                "timeouts should not exceed 300 seconds",
            ));
        }

        Ok(())
    }
}

fn parse_timeout(value: &str, unit: fn(u64) -> Duration) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(unit)
        .map_err(|_| DbAuditError::configuration(format!("Invalid timeout value: {}", value)))
}
