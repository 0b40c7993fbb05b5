//! Text, Markdown and JSON renderings of a completion analysis.

use askama::Template;
use dbaudit_core::{
    AuditReport, CompletionAnalysis,
    analysis::{AreaAnalysis, AreaFact, Priority},
};

const RULE_WIDTH: usize = 60;

fn priority_label(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "high priority",
        Priority::Normal => "normal",
        Priority::Deferrable => "can wait",
    }
}

/// Plain-text rendering for the terminal.
pub fn render_text(report: &AuditReport, analysis: &CompletionAnalysis) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = vec![
        "LISTING DATABASE COMPLETION ANALYSIS".to_string(),
        rule.clone(),
        format!("Overall score: {:.1}/100 (grade {})", analysis.overall_score, report.grade),
        String::new(),
        format!(
            "Status: {} ({})",
            analysis.tier.completion(),
            analysis.tier.advice()
        ),
        String::new(),
        "DETAILED ANALYSIS:".to_string(),
    ];

    for (position, area) in (1..).zip(&analysis.areas) {
        lines.push(String::new());
        lines.push(format!("{}. {}", position, area.title.to_uppercase()));
        lines.push(format!("   Score: {:.1}/100", area.score));
        lines.extend(area.facts.iter().map(|f| format!("   {}: {}", f.label, f.value)));
        lines.push(format!("   {}", area.message));
    }

    lines.push(String::new());
    lines.push("ROADMAP".to_string());
    lines.push("=".repeat(40));
    if analysis.roadmap.is_empty() {
        lines.push("Every area is complete.".to_string());
        lines.push("Ready for production.".to_string());
    } else {
        lines.push("Remaining tasks:".to_string());
        lines.extend((1..).zip(&analysis.roadmap).map(|(i, item)| {
            format!("   {}. {} [{}]", i, item.description, priority_label(item.priority))
        }));
        lines.push(String::new());
        lines.push("Estimated effort:".to_string());
        lines.push(format!("   - Total: ~{} hours", analysis.estimated_hours));
        lines.push(format!("   - High priority: {} tasks", analysis.high_priority()));
        lines.push(format!("   - Can wait: {} tasks", analysis.deferrable()));
    }

    lines.push(String::new());
    lines.push(rule);
    lines.push(format!(
        "Conclusion: database {:.0}% complete",
        analysis.completion_percentage
    ));
    lines.push(format!("Assessment: {}", analysis.assessment.label()));

    lines.join("\n")
}

struct AreaView<'a> {
    title: &'a str,
    score: String,
    message: &'a str,
    facts: &'a [AreaFact],
}

impl<'a> From<&'a AreaAnalysis> for AreaView<'a> {
    fn from(area: &'a AreaAnalysis) -> Self {
        Self {
            title: &area.title,
            score: format!("{:.1}", area.score),
            message: &area.message,
            facts: &area.facts,
        }
    }
}

struct RoadmapView<'a> {
    description: &'a str,
    priority: &'static str,
}

#[derive(Template)]
#[template(path = "analysis.md", escape = "none")]
struct MarkdownAnalysis<'a> {
    generated: String,
    overall_score: String,
    grade: &'static str,
    completion: &'static str,
    advice: &'static str,
    areas: Vec<AreaView<'a>>,
    roadmap: Vec<RoadmapView<'a>>,
    estimated_hours: u32,
    high_priority: usize,
    deferrable: usize,
    completion_percentage: String,
    assessment: &'static str,
}

/// Markdown rendering, suitable for committing next to the schema.
///
/// # Errors
/// Returns an error if the template fails to render.
pub fn render_markdown(
    report: &AuditReport,
    analysis: &CompletionAnalysis,
) -> askama::Result<String> {
    MarkdownAnalysis {
        generated: report.timestamp.format("%Y-%m-%d %H:%M UTC").to_string(),
        overall_score: format!("{:.1}", analysis.overall_score),
        grade: report.grade.as_str(),
        completion: analysis.tier.completion(),
        advice: analysis.tier.advice(),
        areas: analysis.areas.iter().map(AreaView::from).collect(),
        roadmap: analysis
            .roadmap
            .iter()
            .map(|item| RoadmapView {
                description: &item.description,
                priority: priority_label(item.priority),
            })
            .collect(),
        estimated_hours: analysis.estimated_hours,
        high_priority: analysis.high_priority(),
        deferrable: analysis.deferrable(),
        completion_percentage: format!("{:.0}", analysis.completion_percentage),
        assessment: analysis.assessment.label(),
    }
    .render()
}

/// JSON rendering of the analysis alone.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json(analysis: &CompletionAnalysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}
