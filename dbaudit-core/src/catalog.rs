//! Compiled-in audit catalog for the listing database.
//!
//! Everything the auditors send to the database is declared here as a
//! `&'static str`. No statement is ever assembled from runtime input, so the
//! only table names that reach SQL are the ones listed in this file.
//!
//! The scoring weights used by the auditors live next to them as named
//! constants; they are a fixed legacy contract, tunable but not derived from
//! any model.

/// One expected table: its name, the columns that must be present, and the
/// row count statement for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub count_sql: &'static str,
}

/// Static mapping from table name to required column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedSchema {
    pub tables: &'static [TableSpec],
}

impl ExpectedSchema {
    /// Looks up an expected table by name.
    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Names of all expected tables, in catalog order.
    pub fn table_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.iter().map(|t| t.name)
    }

    /// Number of expected tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no table is expected at all.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// How a validity check penalises invalid rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Required text field is NULL or empty
    RequiredText,
    /// Required numeric field is zero or negative
    PositiveNumber,
}

impl CheckKind {
    /// Condition a valid row satisfies, as shown in the catalog listing.
    pub fn rule(self) -> &'static str {
        match self {
            Self::RequiredText => "not empty",
            Self::PositiveNumber => "> 0",
        }
    }

    /// SQL fragment the invalid-row count must filter on.
    pub fn invalid_filter(self, column: &str) -> String {
        match self {
            Self::RequiredText => format!("{column} IS NULL OR {column} = ''"),
            Self::PositiveNumber => format!("{column} <= 0"),
        }
    }
}

/// A single `COUNT(*)` of invalid rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityCheck {
    /// Column under test.
    pub column: &'static str,
    /// What makes a value invalid.
    pub kind: CheckKind,
    /// `SELECT COUNT(*) AS count` of the invalid rows.
    pub sql: &'static str,
}

/// A batch of validity checks run against one table. The batch yields one
/// quality score: `max(0, 100 - penalty * invalid_rows)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityCheckSet {
    pub table: &'static str,
    pub penalty: u32,
    pub checks: &'static [ValidityCheck],
}

/// A child → parent foreign key whose orphans are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipCheck {
    pub child: &'static str,
    pub foreign_key: &'static str,
    pub parent: &'static str,
    pub sql: &'static str,
}

impl RelationshipCheck {
    /// Stable label used as the key in the report, e.g. `listings.user_id -> users`.
    pub fn label(&self) -> String {
        format!("{}.{} -> {}", self.child, self.foreign_key, self.parent)
    }
}

/// A representative query timed by the performance auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

/// Everything one audit run needs besides the session.
#[derive(Debug, Clone, Copy)]
pub struct AuditCatalog {
    pub expected: ExpectedSchema,
    pub quality_checks: &'static [QualityCheckSet],
    pub relationships: &'static [RelationshipCheck],
    pub benchmarks: &'static [BenchmarkQuery],
}

impl AuditCatalog {
    /// The catalog for the real-estate listing schema.
    pub const fn listings() -> Self {
        Self {
            expected: LISTING_SCHEMA,
            quality_checks: LISTING_QUALITY_CHECKS,
            relationships: LISTING_RELATIONSHIPS,
            benchmarks: LISTING_BENCHMARKS,
        }
    }
}

impl Default for AuditCatalog {
    fn default() -> Self {
        Self::listings()
    }
}

// Scoring weights.
/// Points lost per missing column.
pub const MISSING_COLUMN_PENALTY: u32 = 20;
/// Points lost per unexpected column.
pub const EXTRA_COLUMN_PENALTY: u32 = 5;
/// Index score per non-primary index, capped at 100.
pub const POINTS_PER_INDEX: u32 = 10;
/// Constraint score per foreign key, capped at 100.
pub const POINTS_PER_FOREIGN_KEY: u32 = 15;
/// Type score per application enum, capped at 100.
pub const POINTS_PER_ENUM_TYPE: u32 = 20;
/// Volume score per row, capped at 100.
pub const POINTS_PER_RECORD: u32 = 2;
/// Integrity points lost per orphaned row.
pub const ORPHAN_PENALTY: u32 = 10;
/// Security score with no access policies.
pub const SECURITY_BASE_SCORE: f64 = 70.0;
/// Added once any access policy exists.
pub const SECURITY_POLICY_BONUS: f64 = 30.0;
/// Queries faster than this are `fast`.
pub const FAST_QUERY_MS: f64 = 100.0;
/// Queries slower than this are `slow`.
pub const SLOW_QUERY_MS: f64 = 1000.0;
/// Minimum overall score that passes.
pub const PASSING_SCORE: f64 = 80.0;
/// Areas scoring below this get a recommendation.
pub const RECOMMENDATION_THRESHOLD: f64 = 90.0;

/// Name suffixes that mark an enum as one of the application's own types.
pub const ENUM_TYPE_SUFFIXES: &[&str] = &["_type", "_status", "_role"];

/// Namespace every introspection query is scoped to.
pub const AUDITED_SCHEMA: &str = "public";

/// Live columns of every audited table.
pub const COLUMNS_SQL: &str = "SELECT table_name, column_name, data_type, is_nullable \
     FROM information_schema.columns \
     WHERE table_schema = 'public' \
     ORDER BY table_name, ordinal_position";

/// Indexes other than primary keys.
pub const INDEXES_SQL: &str = "SELECT indexname AS index_name, tablename AS table_name \
     FROM pg_indexes \
     WHERE schemaname = 'public' AND indexname NOT LIKE '%\\_pkey' \
     ORDER BY tablename, indexname";

/// Foreign key constraints.
pub const FOREIGN_KEYS_SQL: &str = "SELECT table_name, constraint_name \
     FROM information_schema.table_constraints \
     WHERE constraint_type = 'FOREIGN KEY' AND table_schema = 'public' \
     ORDER BY table_name, constraint_name";

/// Enum types; filtered by suffix afterwards.
pub const ENUM_TYPES_SQL: &str = "SELECT t.typname AS type_name \
     FROM pg_type t \
     JOIN pg_namespace n ON n.oid = t.typnamespace \
     WHERE t.typtype = 'e' AND n.nspname = 'public' \
     ORDER BY t.typname";

/// Row-level access policies.
pub const POLICIES_SQL: &str = "SELECT tablename AS table_name, policyname AS policy_name, cmd AS command \
     FROM pg_policies \
     WHERE schemaname = 'public' \
     ORDER BY tablename, policyname";

/// Users per role; NULL roles come back as a NULL key.
pub const ROLE_DISTRIBUTION_SQL: &str =
    "SELECT role::text AS role, COUNT(*) AS count FROM users GROUP BY role ORDER BY role";

/// The eight tables of the listing schema.
pub const LISTING_TABLES: &[TableSpec] = &[
    TableSpec {
        name: "users",
        columns: &["id", "email", "full_name", "role", "created_at"],
        count_sql: "SELECT COUNT(*) AS count FROM users",
    },
    TableSpec {
        name: "listings",
        columns: &["id", "user_id", "type", "title", "price", "area", "district"],
        count_sql: "SELECT COUNT(*) AS count FROM listings",
    },
    TableSpec {
        name: "favorites",
        columns: &["id", "user_id", "listing_id"],
        count_sql: "SELECT COUNT(*) AS count FROM favorites",
    },
    TableSpec {
        name: "conversations",
        columns: &["id", "listing_id", "user_id", "broker_id"],
        count_sql: "SELECT COUNT(*) AS count FROM conversations",
    },
    TableSpec {
        name: "messages",
        columns: &["id", "conversation_id", "sender_id", "content"],
        count_sql: "SELECT COUNT(*) AS count FROM messages",
    },
    TableSpec {
        name: "contact_history",
        columns: &["id", "listing_id", "broker_id", "contact_type"],
        count_sql: "SELECT COUNT(*) AS count FROM contact_history",
    },
    TableSpec {
        name: "news",
        columns: &["id", "title", "content", "category"],
        count_sql: "SELECT COUNT(*) AS count FROM news",
    },
    TableSpec {
        name: "view_history",
        columns: &["id", "user_id", "listing_id"],
        count_sql: "SELECT COUNT(*) AS count FROM view_history",
    },
];

/// Expected schema built from `LISTING_TABLES`.
pub const LISTING_SCHEMA: ExpectedSchema = ExpectedSchema {
    tables: LISTING_TABLES,
};

/// Validity checks for users and listings.
pub const LISTING_QUALITY_CHECKS: &[QualityCheckSet] = &[
    QualityCheckSet {
        table: "users",
        penalty: 20,
        checks: &[
            ValidityCheck {
                column: "email",
                kind: CheckKind::RequiredText,
                sql: "SELECT COUNT(*) AS count FROM users WHERE email IS NULL OR email = ''",
            },
            ValidityCheck {
                column: "full_name",
                kind: CheckKind::RequiredText,
                sql: "SELECT COUNT(*) AS count FROM users WHERE full_name IS NULL OR full_name = ''",
            },
        ],
    },
    // More checks per table here, so each invalid row costs less.
    QualityCheckSet {
        table: "listings",
        penalty: 10,
        checks: &[
            ValidityCheck {
                column: "title",
                kind: CheckKind::RequiredText,
                sql: "SELECT COUNT(*) AS count FROM listings WHERE title IS NULL OR title = ''",
            },
            ValidityCheck {
                column: "price",
                kind: CheckKind::PositiveNumber,
                sql: "SELECT COUNT(*) AS count FROM listings WHERE price <= 0",
            },
            ValidityCheck {
                column: "area",
                kind: CheckKind::PositiveNumber,
                sql: "SELECT COUNT(*) AS count FROM listings WHERE area <= 0",
            },
        ],
    },
];

/// Relationships checked for orphans.
pub const LISTING_RELATIONSHIPS: &[RelationshipCheck] = &[
    RelationshipCheck {
        child: "listings",
        foreign_key: "user_id",
        parent: "users",
        sql: "SELECT COUNT(*) AS count FROM listings l \
              LEFT JOIN users u ON l.user_id = u.id \
              WHERE u.id IS NULL",
    },
    RelationshipCheck {
        child: "favorites",
        foreign_key: "listing_id",
        parent: "listings",
        sql: "SELECT COUNT(*) AS count FROM favorites f \
              LEFT JOIN listings l ON f.listing_id = l.id \
              WHERE l.id IS NULL",
    },
    RelationshipCheck {
        child: "favorites",
        foreign_key: "user_id",
        parent: "users",
        sql: "SELECT COUNT(*) AS count FROM favorites f \
              LEFT JOIN users u ON f.user_id = u.id \
              WHERE u.id IS NULL",
    },
    RelationshipCheck {
        child: "messages",
        foreign_key: "conversation_id",
        parent: "conversations",
        sql: "SELECT COUNT(*) AS count FROM messages m \
              LEFT JOIN conversations c ON m.conversation_id = c.id \
              WHERE c.id IS NULL",
    },
];

/// Queries timed by the performance audit.
pub const LISTING_BENCHMARKS: &[BenchmarkQuery] = &[
    BenchmarkQuery {
        name: "users_count",
        sql: "SELECT COUNT(*) AS count FROM users",
    },
    BenchmarkQuery {
        name: "listings_count",
        sql: "SELECT COUNT(*) AS count FROM listings",
    },
    BenchmarkQuery {
        name: "listings_filter",
        sql: "SELECT * FROM listings WHERE type = 'nha' LIMIT 10",
    },
    BenchmarkQuery {
        name: "listings_join",
        sql: "SELECT l.*, u.full_name AS owner_name FROM listings l \
              JOIN users u ON l.user_id = u.id LIMIT 10",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_listing_schema_has_eight_tables() {
        assert_eq!(LISTING_SCHEMA.len(), 8);
        assert!(LISTING_SCHEMA.table("users").is_some());
        assert!(LISTING_SCHEMA.table("payments").is_none());
    }

    #[test]
    fn test_table_names_are_unique() {
        let names: HashSet<_> = LISTING_SCHEMA.table_names().collect();
        assert_eq!(names.len(), LISTING_SCHEMA.len());
    }

    #[test]
    fn test_count_statements_target_their_own_table() {
        for table in LISTING_TABLES {
            assert!(
                table.count_sql.ends_with(&format!("FROM {}", table.name)),
                "count statement for {} targets another table",
                table.name
            );
        }
    }

    #[test]
    fn test_quality_checks_reference_catalog_tables() {
        for set in LISTING_QUALITY_CHECKS {
            let table = LISTING_SCHEMA.table(set.table).unwrap();
            for check in set.checks {
                assert!(table.columns.contains(&check.column));
                assert!(check.sql.contains(&format!("FROM {}", set.table)));
            }
        }
    }

    #[test]
    fn test_quality_checks_filter_by_their_kind() {
        for set in LISTING_QUALITY_CHECKS {
            for check in set.checks {
                let filter = check.kind.invalid_filter(check.column);
                assert!(
                    check.sql.ends_with(&format!("WHERE {}", filter)),
                    "{}.{} does not count {:?} violations: {}",
                    set.table,
                    check.column,
                    check.kind,
                    check.sql
                );
            }
        }
    }

    #[test]
    fn test_check_kind_rules() {
        assert_eq!(CheckKind::RequiredText.rule(), "not empty");
        assert_eq!(CheckKind::PositiveNumber.rule(), "> 0");
        assert_eq!(CheckKind::PositiveNumber.invalid_filter("price"), "price <= 0");
    }

    #[test]
    fn test_relationship_labels() {
        let labels: Vec<_> = LISTING_RELATIONSHIPS.iter().map(|r| r.label()).collect();
        assert_eq!(labels[0], "listings.user_id -> users");
        assert_eq!(labels.iter().collect::<HashSet<_>>().len(), labels.len());
    }

    #[test]
    fn test_benchmark_names_are_unique() {
        let names: HashSet<_> = LISTING_BENCHMARKS.iter().map(|b| b.name).collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_introspection_scoped_to_audited_schema() {
        let scoped = format!("= '{}'", AUDITED_SCHEMA);
        for sql in [COLUMNS_SQL, INDEXES_SQL, FOREIGN_KEYS_SQL, ENUM_TYPES_SQL, POLICIES_SQL] {
            assert!(sql.contains(&scoped), "unscoped statement: {}", sql);
        }
    }

    #[test]
    fn test_catalog_statements_are_read_only() {
        let catalog = AuditCatalog::listings();
        let statements = LISTING_TABLES
            .iter()
            .map(|t| t.count_sql)
            .chain(catalog.quality_checks.iter().flat_map(|s| s.checks.iter().map(|c| c.sql)))
            .chain(catalog.relationships.iter().map(|r| r.sql))
            .chain(catalog.benchmarks.iter().map(|b| b.sql));

        for sql in statements {
            assert!(sql.starts_with("SELECT "), "not a SELECT: {}", sql);
            assert!(!sql.contains(';'));
        }
    }
}
