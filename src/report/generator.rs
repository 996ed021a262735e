//! Markdown and JSON report generation.
//!
//! This module renders a final valuation report for humans (Markdown) or
//! machines (JSON).

use crate::analysis::aggregator::ranked_scores;
use crate::models::{
    AnalystKind, CompsReport, FailureCause, FinalReport, Findings, PartialReport, ReportMetadata,
};
use anyhow::Result;
use std::collections::BTreeMap;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &FinalReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("# DomainLens Report: {}\n\n", report.domain_name));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_score_section(report.composite_score, &report.scores));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_deep_dive_section(&report.deep_dive));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Weights Version:** `{}`\n", metadata.weights_version));
    section.push_str(&format!("- **Narrator Model:** `{}`\n", metadata.narrator_model));
    section.push_str(&format!(
        "- **Analysts Succeeded:** {}\n",
        metadata.analysts_succeeded
    ));
    if metadata.analysts_failed > 0 {
        section.push_str(&format!(
            "- **Analysts Failed:** {}\n",
            metadata.analysts_failed
        ));
    }
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Badge for a 0-100 score.
fn score_badge(score: f64) -> &'static str {
    if score >= 75.0 {
        "🟢"
    } else if score >= 50.0 {
        "🟡"
    } else if score >= 25.0 {
        "🟠"
    } else {
        "🔴"
    }
}

/// Generate the composite score and the per-score table.
fn generate_score_section(composite: u8, scores: &BTreeMap<String, f64>) -> String {
    let mut section = String::new();

    section.push_str("## Score\n\n");
    section.push_str(&format!(
        "### {} Composite Score: **{} / 100**\n\n",
        score_badge(f64::from(composite)),
        composite
    ));

    if !scores.is_empty() {
        section.push_str("| Score | Value |\n");
        section.push_str("|:---|:---:|\n");
        for (name, value) in ranked_scores(scores) {
            section.push_str(&format!(
                "| {} | {} {:.0} |\n",
                name.replace('_', " "),
                score_badge(value),
                value
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the executive summary section.
fn generate_summary_section(summary: &str) -> String {
    format!("## Executive Summary\n\n{}\n\n", summary.trim())
}

/// Generate one section per analyst.
fn generate_deep_dive_section(deep_dive: &BTreeMap<String, PartialReport>) -> String {
    let mut section = String::new();

    section.push_str("## Deep Dive\n\n");

    // Roster order reads better than alphabetical.
    let mut entries: Vec<(&String, &PartialReport)> = deep_dive.iter().collect();
    entries.sort_by_key(|(name, _)| {
        AnalystKind::from_name(name)
            .map(|k| k as usize)
            .unwrap_or(usize::MAX)
    });

    for (name, partial) in entries {
        section.push_str(&generate_partial_block(name, partial));
    }

    section
}

/// Generate the block for one partial report.
fn generate_partial_block(report_name: &str, partial: &PartialReport) -> String {
    let mut block = String::new();

    let title = AnalystKind::from_name(report_name)
        .map(|k| k.title())
        .unwrap_or(report_name);

    match partial {
        PartialReport::Success { findings, .. } => {
            block.push_str(&format!("### ✅ {}\n\n", title));

            let kind = findings.kind();
            for field in kind.score_fields() {
                if let Some(value) = findings.score(field.name) {
                    block.push_str(&format!(
                        "- **{}:** {} / {}\n",
                        field.name.replace('_', " "),
                        value,
                        field.max
                    ));
                }
            }
            if let Findings::LiveMomentum(momentum) = findings {
                block.push_str(&format!("- **State:** {:?}\n", momentum.momentum_state));
            }
            if !kind.score_fields().is_empty() {
                block.push('\n');
            }

            for (label, text) in findings.narrative() {
                if !text.is_empty() {
                    block.push_str(&format!("**{}:** {}\n\n", label, text));
                }
            }

            if let Findings::ComparableSales(comps) = findings {
                block.push_str(&generate_comps_table(comps));
            }
        }
        PartialReport::Failure { cause, reason, .. } => {
            let badge = match cause {
                FailureCause::NoData => "⚪ **NO DATA**",
                FailureCause::Rejected => "❌ **FAILED**",
            };
            block.push_str(&format!("### {} {}\n\n", badge, title));
            block.push_str(&format!("> {}\n\n", reason));
        }
    }

    block
}

/// Generate the comparable sales table.
fn generate_comps_table(comps: &CompsReport) -> String {
    if comps.comparable_sales.is_empty() {
        return String::new();
    }

    let mut table = String::new();
    table.push_str("| Domain | Price (USD) | Date |\n");
    table.push_str("|:---|---:|:---|\n");
    for sale in &comps.comparable_sales {
        table.push_str(&format!(
            "| {} | ${:.0} | {} |\n",
            sale.domain, sale.price_usd, sale.date
        ));
    }
    table.push('\n');
    table
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by DomainLens. Scores are computed from analyst findings; the summary is model-written.*\n"
        .to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &FinalReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
