//! Completion analysis of a persisted audit report.
//!
//! Turns a report into a completion tier, a verdict per area and an ordered
//! roadmap of remaining work with a rough effort estimate. Everything here
//! is a pure function of the report.

use crate::models::{AuditArea, AuditReport, QueryOutcome};
use serde::{Deserialize, Serialize};

/// The analysis never claims more than this until every area is clean.
pub const COMPLETION_CAP: f64 = 95.0;
/// Effort estimate per roadmap item.
pub const HOURS_PER_ITEM: u32 = 2;
/// Index count below which more indexes are suggested.
pub const INDEX_TARGET: usize = 20;
/// Record count below which more sample data is suggested.
pub const SAMPLE_DATA_TARGET: i64 = 50;
/// Queries slower than this are named in the roadmap.
pub const ROADMAP_SLOW_QUERY_MS: f64 = 50.0;

/// Completion band for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTier {
    ProductionReady,
    LightTuning,
    NeedsImprovement,
    NeedsRework,
}

impl CompletionTier {
    /// Bands at 90, 80 and 70; anything lower needs rework.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::ProductionReady
        } else if score >= 80.0 {
            Self::LightTuning
        } else if score >= 70.0 {
            Self::NeedsImprovement
        } else {
            Self::NeedsRework
        }
    }

    /// Rough completion estimate, e.g. `85%+ complete`.
    pub fn completion(self) -> &'static str {
        match self {
            Self::ProductionReady => "95%+ complete",
            Self::LightTuning => "85%+ complete",
            Self::NeedsImprovement => "75%+ complete",
            Self::NeedsRework => "< 70% complete",
        }
    }

    /// One-line next step for the tier.
    pub fn advice(self) -> &'static str {
        match self {
            Self::ProductionReady => "ready for production",
            Self::LightTuning => "needs light tuning",
            Self::NeedsImprovement => "needs improvement",
            Self::NeedsRework => "needs significant rework",
        }
    }
}

/// Final assessment of the capped completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    VeryGood,
    Good,
    NeedsWork,
}

impl Assessment {
    /// Classifies the capped completion percentage with the same 90/80/70 bands.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::Excellent
        } else if percentage >= 80.0 {
            Self::VeryGood
        } else if percentage >= 70.0 {
            Self::Good
        } else {
            Self::NeedsWork
        }
    }

    /// Label printed in the final assessment line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - ready for production",
            Self::VeryGood => "Very Good - needs light tuning",
            Self::Good => "Good - needs further improvement",
            Self::NeedsWork => "Needs Work - significant changes required",
        }
    }
}

/// How one area scored relative to its thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Strong,
    Adequate,
    Weak,
}

/// One figure shown under an area, e.g. `Indexes: 7`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaFact {
    pub label: String,
    pub value: String,
}

impl AreaFact {
    fn new(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Per-area breakdown: score, verdict and supporting figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAnalysis {
    pub area: AuditArea,
    pub title: String,
    pub score: f64,
    pub verdict: Verdict,
    pub message: String,
    pub facts: Vec<AreaFact>,
}

/// Roadmap priority; orders high before deferrable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Deferrable,
}

/// Remediation steps the roadmap can propose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapKind {
    AddIndexes,
    PopulateTables,
    AddSampleData,
    OptimizeQueries,
    ImplementRls,
    AddAuthMiddleware,
    SetupAuditLogging,
}

impl RoadmapKind {
    /// Security work is high priority, filling in data can wait.
    pub fn priority(self) -> Priority {
        match self {
            Self::ImplementRls | Self::AddAuthMiddleware => Priority::High,
            Self::PopulateTables | Self::AddSampleData => Priority::Deferrable,
            Self::AddIndexes | Self::OptimizeQueries | Self::SetupAuditLogging => Priority::Normal,
        }
    }
}

/// A proposed step with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub kind: RoadmapKind,
    pub description: String,
    pub priority: Priority,
}

impl RoadmapItem {
    fn new(kind: RoadmapKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            priority: kind.priority(),
        }
    }
}

/// Result of analysing one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionAnalysis {
    pub overall_score: f64,
    pub tier: CompletionTier,
    pub areas: Vec<AreaAnalysis>,
    pub roadmap: Vec<RoadmapItem>,
    pub estimated_hours: u32,
    pub completion_percentage: f64,
    pub assessment: Assessment,
    pub passing: bool,
}

impl CompletionAnalysis {
    /// Derives tier, area breakdown, roadmap and assessment from a report.
    pub fn from_report(report: &AuditReport) -> Self {
        let completion_percentage = report.overall_score.min(COMPLETION_CAP);
        let roadmap = roadmap(report);
        let estimated_hours = HOURS_PER_ITEM.saturating_mul(u32::try_from(roadmap.len()).unwrap_or(u32::MAX));

        Self {
            overall_score: report.overall_score,
            tier: CompletionTier::from_score(report.overall_score),
            areas: AuditArea::ALL
                .iter()
                .map(|&area| analyse_area(report, area))
                .collect(),
            roadmap,
            estimated_hours,
            completion_percentage,
            assessment: Assessment::from_percentage(completion_percentage),
            passing: completion_percentage >= crate::catalog::PASSING_SCORE,
        }
    }

    /// Number of high priority roadmap items.
    pub fn high_priority(&self) -> usize {
        self.count_priority(Priority::High)
    }

    /// Number of roadmap items that can wait.
    pub fn deferrable(&self) -> usize {
        self.count_priority(Priority::Deferrable)
    }

    fn count_priority(&self, priority: Priority) -> usize {
        self.roadmap.iter().filter(|i| i.priority == priority).count()
    }
}

fn verdict(score: f64, strong: f64, adequate: f64) -> Verdict {
    if score >= strong {
        Verdict::Strong
    } else if score >= adequate {
        Verdict::Adequate
    } else {
        Verdict::Weak
    }
}

fn analyse_area(report: &AuditReport, area: AuditArea) -> AreaAnalysis {
    let score = report.area_score(area);
    let (verdict, message, facts) = match area {
        AuditArea::Schema => {
            let schema = &report.schema;
            let verdict = verdict(score, 90.0, 80.0);
            let message = match verdict {
                Verdict::Strong => "Schema is complete and well structured",
                Verdict::Adequate => "Schema is good; a few more indexes would help",
                Verdict::Weak => "Schema needs more work",
            };
            let facts = vec![
                AreaFact::new(
                    "Tables",
                    format!("{}/{} working", schema.working_tables(), schema.tables.len()),
                ),
                AreaFact::new("Foreign keys", schema.foreign_key_count),
                AreaFact::new("Indexes", schema.index_count),
                AreaFact::new("Enum types", schema.enum_type_count),
            ];
            (verdict, message, facts)
        }
        AuditArea::Data => {
            let data = &report.data;
            let verdict = verdict(score, 80.0, 60.0);
            let message = match verdict {
                Verdict::Strong => "Data quality is high",
                Verdict::Adequate => "More test data is needed",
                Verdict::Weak => "Tables need to be populated",
            };
            let mut facts = vec![
                AreaFact::new("Total records", data.total_records),
                AreaFact::new(
                    "Tables with data",
                    format!("{}/{}", data.tables_with_data(), data.table_counts.len()),
                ),
            ];
            facts.extend(
                data.table_counts
                    .iter()
                    .map(|(table, count)| AreaFact::new(table, count)),
            );
            (verdict, message, facts)
        }
        AuditArea::Performance => {
            let performance = &report.performance;
            let verdict = verdict(score, 90.0, 70.0);
            let message = match verdict {
                Verdict::Strong => "Performance is very good",
                Verdict::Adequate => "Performance is stable",
                Verdict::Weak => "Performance needs tuning",
            };
            let mut facts = vec![AreaFact::new(
                "Average query time",
                performance
                    .average_time_ms
                    .map_or_else(|| "n/a".to_string(), |ms| format!("{:.2}ms", ms)),
            )];
            facts.extend(performance.queries.iter().map(|(name, outcome)| {
                let value = match outcome {
                    QueryOutcome::Timed { time_ms, .. } => format!("{:.2}ms", time_ms),
                    QueryOutcome::Failed { error } => format!("error: {}", error),
                };
                AreaFact::new(name, value)
            }));
            (verdict, message, facts)
        }
        AuditArea::Security => {
            let security = &report.security;
            let verdict = verdict(score, 90.0, 70.0);
            let message = match verdict {
                Verdict::Strong => "Security is strong",
                Verdict::Adequate => "Basic security; row-level policies needed",
                Verdict::Weak => "Security needs strengthening",
            };
            let mut facts = vec![
                AreaFact::new("RLS policies", security.policy_count),
                AreaFact::new("User role types", security.role_distribution.len()),
            ];
            facts.extend(
                security
                    .role_distribution
                    .iter()
                    .map(|(role, count)| AreaFact::new(role, format!("{} users", count))),
            );
            (verdict, message, facts)
        }
    };

    AreaAnalysis {
        area,
        title: area.label().to_string(),
        score,
        verdict,
        message: message.to_string(),
        facts,
    }
}

fn roadmap(report: &AuditReport) -> Vec<RoadmapItem> {
    let mut items = Vec::new();

    if report.schema.score < 95.0 && report.schema.index_count < INDEX_TARGET {
        items.push(RoadmapItem::new(
            RoadmapKind::AddIndexes,
            "Add indexes for frequently used queries",
        ));
    }

    if report.data.score < 90.0 {
        let empty = report.data.empty_tables();
        if !empty.is_empty() {
            items.push(RoadmapItem::new(
                RoadmapKind::PopulateTables,
                format!("Populate data for: {}", empty.join(", ")),
            ));
        }
        if report.data.total_records < SAMPLE_DATA_TARGET {
            items.push(RoadmapItem::new(
                RoadmapKind::AddSampleData,
                "Add sample data for complete testing",
            ));
        }
    }

    if report.performance.score < 95.0 {
        let slow: Vec<&str> = report
            .performance
            .queries
            .iter()
            .filter(|(_, outcome)| outcome.time_ms().is_some_and(|ms| ms > ROADMAP_SLOW_QUERY_MS))
            .map(|(name, _)| name.as_str())
            .collect();
        if !slow.is_empty() {
            items.push(RoadmapItem::new(
                RoadmapKind::OptimizeQueries,
                format!("Optimize queries: {}", slow.join(", ")),
            ));
        }
    }

    if report.security.score < 90.0 {
        if report.security.policy_count == 0 {
            items.push(RoadmapItem::new(
                RoadmapKind::ImplementRls,
                "Implement Row Level Security (RLS) policies",
            ));
        }
        items.push(RoadmapItem::new(
            RoadmapKind::AddAuthMiddleware,
            "Add authentication middleware",
        ));
        items.push(RoadmapItem::new(
            RoadmapKind::SetupAuditLogging,
            "Set up audit logging",
        ));
    }

    items
}
