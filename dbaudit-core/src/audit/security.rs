//! Access policy auditor.
//!
//! Presence of row-level policies is the only scored signal. The role
//! distribution is informational.

use super::describe;
use crate::catalog::{POLICIES_SQL, ROLE_DISTRIBUTION_SQL, SECURITY_BASE_SCORE, SECURITY_POLICY_BONUS};
use crate::error::DbAuditError;
use crate::models::{PolicyInfo, SecurityAuditResult};
use crate::session::{AuditSession, RowExt};
use crate::Result;
use std::collections::BTreeMap;

/// Role label used for users whose role is NULL.
pub const UNKNOWN_ROLE: &str = "unknown";

/// Counts access policies and tallies users per role.
///
/// Never fails: a failed statement leaves its metric empty and adds a warning.
pub async fn audit_security(session: &dyn AuditSession) -> SecurityAuditResult {
    let mut warnings = Vec::new();

    tracing::info!("Auditing security");

    let policies = match collect_policies(session).await {
        Ok(policies) => {
            tracing::info!("  Access policies: {}", policies.len());
            policies
        }
        Err(e) => {
            let warning = format!("Failed to enumerate access policies: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            Vec::new()
        }
    };

    let role_distribution = match collect_role_distribution(session).await {
        Ok(roles) => {
            for (role, count) in &roles {
                tracing::info!("  {}: {} users", role, count);
            }
            roles
        }
        Err(e) => {
            let warning = format!("Failed to read role distribution: {}", describe(&e));
            tracing::warn!("{}", warning);
            warnings.push(warning);
            BTreeMap::new()
        }
    };

    let score = security_score(policies.len());
    tracing::info!("Security score: {:.1}/100", score);

    SecurityAuditResult {
        policy_count: policies.len(),
        policies,
        role_distribution,
        score,
        warnings,
    }
}

/// Base score, plus the policy bonus when at least one policy exists.
pub fn security_score(policy_count: usize) -> f64 {
    if policy_count > 0 {
        SECURITY_BASE_SCORE + SECURITY_POLICY_BONUS
    } else {
        SECURITY_BASE_SCORE
    }
}

async fn collect_policies(session: &dyn AuditSession) -> Result<Vec<PolicyInfo>> {
    let rows = session
        .fetch_rows(POLICIES_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("policy catalog", e))?;

    rows.iter()
        .map(|row| {
            Ok(PolicyInfo {
                table: row.get_text("table_name")?.to_string(),
                policy: row.get_text("policy_name")?.to_string(),
                command: row.get_optional_text("command").unwrap_or("ALL").to_string(),
            })
        })
        .collect()
}

async fn collect_role_distribution(session: &dyn AuditSession) -> Result<BTreeMap<String, i64>> {
    let rows = session
        .fetch_rows(ROLE_DISTRIBUTION_SQL)
        .await
        .map_err(|e| DbAuditError::introspection_failed("role distribution", e))?;

    let mut roles = BTreeMap::new();
    for row in &rows {
        let role = row.get_optional_text("role").unwrap_or(UNKNOWN_ROLE);
        let count = row.get_i64("count")?;
        let total = roles.entry(role.to_string()).or_insert(0_i64);
        *total = total.saturating_add(count);
    }
    Ok(roles)
}
