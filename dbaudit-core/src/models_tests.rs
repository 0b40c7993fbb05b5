//! Tests for the audit result models.

use super::*;

#[test]
fn test_clamp_score() {
    assert_eq!(clamp_score(-5.0), 0.0);
    assert_eq!(clamp_score(150.0), 100.0);
    assert_eq!(clamp_score(42.5), 42.5);
    assert_eq!(clamp_score(f64::NAN), 0.0);
}

#[test]
fn test_mean() {
    assert_eq!(mean(&[]), None);
    assert_eq!(mean(&[10.0, 20.0, 30.0]), Some(20.0));
}

#[test]
fn test_grade_boundaries_are_lower_inclusive() {
    assert_eq!(Grade::from_score(100.0), Grade::APlus);
    assert_eq!(Grade::from_score(90.0), Grade::APlus);
    assert_eq!(Grade::from_score(89.99), Grade::A);
    assert_eq!(Grade::from_score(80.0), Grade::A);
    assert_eq!(Grade::from_score(70.0), Grade::BPlus);
    assert_eq!(Grade::from_score(60.0), Grade::B);
    assert_eq!(Grade::from_score(59.99), Grade::C);
    assert_eq!(Grade::from_score(0.0), Grade::C);
}

#[test]
fn test_grade_labels() {
    assert_eq!(Grade::APlus.to_string(), "A+");
    assert_eq!(Grade::BPlus.as_str(), "B+");
    assert_eq!(Grade::C.status(), "POOR - Major fixes required");
    assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
    assert_eq!(serde_json::from_str::<Grade>("\"B+\"").unwrap(), Grade::BPlus);
}

#[test]
fn test_query_status_thresholds() {
    assert_eq!(QueryStatus::classify(0.4), QueryStatus::Fast);
    assert_eq!(QueryStatus::classify(99.99), QueryStatus::Fast);
    assert_eq!(QueryStatus::classify(100.0), QueryStatus::Slow);
    assert_eq!(QueryStatus::classify(999.0), QueryStatus::Slow);
    assert_eq!(QueryStatus::classify(1000.0), QueryStatus::VerySlow);
}

#[test]
fn test_query_outcome_shapes() {
    let timed = QueryOutcome::Timed {
        time_ms: 12.5,
        status: QueryStatus::Fast,
    };
    let failed = QueryOutcome::Failed {
        error: "relation \"listings\" does not exist".to_string(),
    };

    assert_eq!(
        serde_json::to_value(&timed).unwrap(),
        serde_json::json!({"time_ms": 12.5, "status": "fast"})
    );
    assert_eq!(
        serde_json::to_value(&failed).unwrap(),
        serde_json::json!({"error": "relation \"listings\" does not exist"})
    );

    let parsed: QueryOutcome =
        serde_json::from_value(serde_json::json!({"time_ms": 300.0, "status": "slow"})).unwrap();
    assert_eq!(parsed.time_ms(), Some(300.0));
    let parsed: QueryOutcome =
        serde_json::from_value(serde_json::json!({"error": "timeout"})).unwrap();
    assert_eq!(parsed.time_ms(), None);
}

#[test]
fn test_missing_table_result() {
    let result = TableAuditResult::missing();
    assert!(!result.exists);
    assert_eq!(result.score, 0);
    assert_eq!(result.column_count, 0);
}

#[test]
fn test_data_result_helpers() {
    let data = DataAuditResult {
        table_counts: [("users", 3), ("news", 0), ("favorites", -1), ("listings", 0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        quality: BTreeMap::new(),
        quality_scores: vec![],
        quality_average: 0.0,
        orphan_counts: BTreeMap::new(),
        integrity_score: 100,
        total_records: 3,
        count_score: 6.0,
        score: 35.3,
        warnings: vec![],
    };

    assert_eq!(data.tables_with_data(), 1);
    assert_eq!(data.empty_tables(), vec!["listings", "news"]);
}

#[test]
fn test_audit_area_order() {
    let labels: Vec<_> = AuditArea::ALL.iter().map(|a| a.label()).collect();
    assert_eq!(
        labels,
        vec!["Schema Completeness", "Data Quality", "Performance", "Security"]
    );
}
