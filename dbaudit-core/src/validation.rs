//! JSON Schema validation for the persisted audit report.
//!
//! Every report is checked before it is written and again when it is read
//! back by the post-processor, so a report on disk always has the shape the
//! readers expect.
//!
//! # Security Guarantees
//! - Rejects any string that embeds a connection string with credentials
//! - Rejects `password=` style key/value fragments
//! - Validates format version compatibility
//!
//! # Example
//! ```rust
//! use dbaudit_core::validation::validate_report_json;
//! use serde_json::json;
//!
//! let tampered = json!({"format_version": "2.0"});
//! assert!(validate_report_json(&tampered).is_err());
//! ```

use jsonschema::Validator;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Report validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// The document does not match the report schema
    #[error("Report validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// Potential credential exposure
    #[error("Security validation failed: {reason}")]
    SecurityViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Supported format versions
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Embedded JSON Schema for the v1.0 report
const REPORT_SCHEMA_V1_0: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "dbaudit Database Audit Report v1.0",
  "type": "object",
  "required": [
    "format_version", "timestamp", "schema", "data", "performance", "security",
    "overall_score", "grade", "status", "recommendations", "passing"
  ],
  "$defs": {
    "score": { "type": "number", "minimum": 0, "maximum": 100 },
    "warnings": { "type": "array", "items": { "type": "string" } }
  },
  "properties": {
    "format_version": { "type": "string", "pattern": "^1\\.0$" },
    "timestamp": { "type": "string", "minLength": 1 },
    "schema": {
      "type": "object",
      "required": ["tables", "index_count", "foreign_key_count", "enum_type_count", "score"],
      "properties": {
        "tables": {
          "type": "object",
          "additionalProperties": {
            "type": "object",
            "required": ["exists", "column_count", "missing_columns", "extra_columns", "score"],
            "properties": {
              "exists": { "type": "boolean" },
              "column_count": { "type": "integer", "minimum": 0 },
              "missing_columns": { "type": "array", "items": { "type": "string" } },
              "extra_columns": { "type": "array", "items": { "type": "string" } },
              "score": { "type": "integer", "minimum": 0, "maximum": 100 }
            }
          }
        },
        "index_count": { "type": "integer", "minimum": 0 },
        "foreign_key_count": { "type": "integer", "minimum": 0 },
        "enum_type_count": { "type": "integer", "minimum": 0 },
        "table_score": { "$ref": "#/$defs/score" },
        "index_score": { "$ref": "#/$defs/score" },
        "constraint_score": { "$ref": "#/$defs/score" },
        "type_score": { "$ref": "#/$defs/score" },
        "score": { "$ref": "#/$defs/score" },
        "warnings": { "$ref": "#/$defs/warnings" }
      }
    },
    "data": {
      "type": "object",
      "required": ["table_counts", "quality_scores", "integrity_score", "score"],
      "properties": {
        "table_counts": {
          "type": "object",
          "additionalProperties": { "type": "integer", "minimum": -1 }
        },
        "quality_scores": {
          "type": "array",
          "items": { "type": "integer", "minimum": 0, "maximum": 100 }
        },
        "quality_average": { "$ref": "#/$defs/score" },
        "integrity_score": { "type": "integer", "minimum": 0, "maximum": 100 },
        "count_score": { "$ref": "#/$defs/score" },
        "score": { "$ref": "#/$defs/score" },
        "warnings": { "$ref": "#/$defs/warnings" }
      }
    },
    "performance": {
      "type": "object",
      "required": ["queries", "score"],
      "properties": {
        "queries": {
          "type": "object",
          "additionalProperties": {
            "oneOf": [
              {
                "type": "object",
                "required": ["time_ms", "status"],
                "properties": {
                  "time_ms": { "type": "number", "minimum": 0 },
                  "status": { "enum": ["fast", "slow", "very_slow"] }
                }
              },
              {
                "type": "object",
                "required": ["error"],
                "properties": { "error": { "type": "string" } }
              }
            ]
          }
        },
        "average_time_ms": { "type": ["number", "null"], "minimum": 0 },
        "score": { "$ref": "#/$defs/score" },
        "warnings": { "$ref": "#/$defs/warnings" }
      }
    },
    "security": {
      "type": "object",
      "required": ["policy_count", "role_distribution", "score"],
      "properties": {
        "policy_count": { "type": "integer", "minimum": 0 },
        "role_distribution": {
          "type": "object",
          "additionalProperties": { "type": "integer", "minimum": 0 }
        },
        "score": { "$ref": "#/$defs/score" },
        "warnings": { "$ref": "#/$defs/warnings" }
      }
    },
    "overall_score": { "$ref": "#/$defs/score" },
    "grade": { "enum": ["A+", "A", "B+", "B", "C"] },
    "status": { "type": "string", "minLength": 1 },
    "recommendations": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["area", "message"],
        "properties": {
          "area": { "enum": ["schema", "data", "performance", "security"] },
          "message": { "type": "string", "minLength": 1 }
        }
      }
    },
    "passing": { "type": "boolean" }
  }
}"##;

/// Connection string with an inline password, e.g. `postgres://u:p@host`.
const CONNECTION_STRING_PATTERN: &str =
    r"(?i)\b(postgres|postgresql|mysql|mongodb|sqlserver)://[^\s/@:]+:[^\s@]+@";

/// Key/value credential fragments.
const CREDENTIAL_FRAGMENTS: &[&str] = &["password=", "pwd=", "secret=", "api_key=", "apikey="];

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

static CONNECTION_STRING_REGEX: OnceLock<std::result::Result<Regex, regex::Error>> =
    OnceLock::new();

/// Compiles the embedded report schema and caches it.
///
/// Validation functions call this lazily; calling it at startup only moves
/// the cost up front.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_report_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = report_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    // Another caller may have won the race; either instance is equivalent.
    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

fn compiled_schema() -> Result<&'static Validator, ValidationError> {
    initialize_report_validator()?;
    COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Report validator could not be initialized".to_string(),
        })
}

/// Validates a report document.
///
/// Checks, in order: format version, JSON Schema structure (required
/// sections, score ranges, grade and status values) and credential leaks.
///
/// # Errors
/// Returns the first category of problem found.
pub fn validate_report_json(json_value: &Value) -> Result<(), ValidationError> {
    validate_format_version(json_value)?;

    let schema = compiled_schema()?;
    if let Err(validation_error) = schema.validate(json_value) {
        return Err(ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec![validation_error.to_string()],
        });
    }

    validate_no_credentials(json_value, "")?;

    Ok(())
}

fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(Value::as_str)
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}

fn connection_string_regex() -> Result<&'static Regex, ValidationError> {
    CONNECTION_STRING_REGEX
        .get_or_init(|| Regex::new(CONNECTION_STRING_PATTERN))
        .as_ref()
        .map_err(|e| ValidationError::SchemaCompilation {
            message: format!("Connection string pattern error: {}", e),
        })
}

/// Walks every string (keys included) looking for credentials.
fn validate_no_credentials(value: &Value, path: &str) -> Result<(), ValidationError> {
    match value {
        Value::String(s) => check_text(s, path)?,
        Value::Object(obj) => {
            for (key, val) in obj {
                let new_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                check_text(key, &new_path)?;
                validate_no_credentials(val, &new_path)?;
            }
        }
        Value::Array(arr) => {
            for (index, item) in arr.iter().enumerate() {
                validate_no_credentials(item, &format!("{}[{}]", path, index))?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn check_text(text: &str, path: &str) -> Result<(), ValidationError> {
    if connection_string_regex()?.is_match(text) {
        return Err(ValidationError::SecurityViolation {
            reason: format!("Connection string with credentials found at path '{}'", path),
        });
    }

    let lower = text.to_lowercase();
    if let Some(fragment) = CREDENTIAL_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Err(ValidationError::SecurityViolation {
            reason: format!(
                "Potential credential found at path '{}': contains '{}'",
                path, fragment
            ),
        });
    }

    Ok(())
}

/// Parses, validates and deserializes a report document.
///
/// # Errors
/// Returns validation errors for malformed JSON, schema violations, or
/// credential leaks.
pub fn parse_report(json_str: &str) -> Result<crate::models::AuditReport, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;

    validate_report_json(&json_value)?;

    let report = serde_json::from_value(json_value)?;
    Ok(report)
}

/// The embedded report schema as a JSON value.
pub fn report_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(REPORT_SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}
