//! Weighted aggregation of partial reports into the final report.
//!
//! The numeric results are computed here. The narrator only writes prose
//! around them, and its failure is the one error that aborts a run.

use super::weights::WeightTable;
use crate::error::AggregationError;
use crate::models::{FinalReport, PartialReport, ReportMetadata, Subject};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Everything the narrator gets to see.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub subject: &'a Subject,
    pub partials: &'a BTreeMap<String, PartialReport>,
    pub scores: &'a BTreeMap<String, f64>,
    pub composite_score: u8,
}

/// Writes the executive summary for a set of partial reports.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Model identifier recorded in report metadata.
    fn model(&self) -> &str;

    async fn narrate(&self, request: &NarrativeRequest<'_>) -> Result<String, AggregationError>;
}

/// Combine partial reports into a final report.
pub async fn aggregate(
    subject: &Subject,
    partials: BTreeMap<String, PartialReport>,
    table: &WeightTable,
    narrator: &dyn Narrator,
) -> Result<FinalReport, AggregationError> {
    let scores = table.scores(&partials);
    let composite_score = table.composite(&scores);
    let (analysts_succeeded, analysts_failed) = count_outcomes(&partials);

    debug!("Computed scores for {}: {:?}", subject, scores);
    info!(
        "Composite score for {} is {} ({} succeeded, {} failed)",
        subject, composite_score, analysts_succeeded, analysts_failed
    );

    let request = NarrativeRequest {
        subject,
        partials: &partials,
        scores: &scores,
        composite_score,
    };
    let summary = narrator.narrate(&request).await?;

    if summary.trim().is_empty() {
        return Err(AggregationError::Format("summary is empty".to_string()));
    }

    Ok(FinalReport {
        domain_name: subject.id().to_string(),
        composite_score,
        summary,
        scores,
        deep_dive: partials,
        metadata: ReportMetadata {
            analysis_date: Utc::now(),
            weights_version: table.version().to_string(),
            narrator_model: narrator.model().to_string(),
            analysts_succeeded,
            analysts_failed,
            duration_seconds: 0.0,
        },
    })
}

/// Count successful and failed partial reports.
pub fn count_outcomes(partials: &BTreeMap<String, PartialReport>) -> (usize, usize) {
    let succeeded = partials.values().filter(|p| p.is_success()).count();
    (succeeded, partials.len() - succeeded)
}

/// Failed reports, keyed by report name.
pub fn failed_reports(partials: &BTreeMap<String, PartialReport>) -> Vec<(&str, &PartialReport)> {
    partials
        .iter()
        .filter(|(_, p)| !p.is_success())
        .map(|(name, p)| (name.as_str(), p))
        .collect()
}

/// Scores sorted from strongest to weakest.
pub fn ranked_scores(scores: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, f64)> = scores.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}


#[cfg(test)]
mod tests {
    use super::testing::StubNarrator;
    use super::*;
    use crate::analysis::weights::WeightEntry;
    use crate::analysts::testing::findings_with;
    use crate::models::{AnalystKind, FailureCause};

    fn table() -> WeightTable {
        WeightTable::new(
            "test",
            vec![
                WeightEntry::new("seo_authority", "web2_report", "seo_authority_score", 0.5),
                WeightEntry::new("traffic", "web2_report", "traffic_score", 0.25),
                WeightEntry::new("on_chain_health", "on_chain_report", "on_chain_health_score", 0.25),
            ],
            &[AnalystKind::Web2Authority, AnalystKind::OnChain],
        )
        .unwrap()
    }

    fn partials() -> BTreeMap<String, PartialReport> {
        let mut partials = BTreeMap::new();
        partials.insert(
            "web2_report".to_string(),
            PartialReport::success(
                "web2_authority_analyst",
                findings_with(AnalystKind::Web2Authority, 8.0),
            ),
        );
        partials.insert(
            "on_chain_report".to_string(),
            PartialReport::failure("on_chain_analyst", FailureCause::NoData, "Not on chain."),
        );
        partials
    }

    #[tokio::test]
    async fn test_aggregate_builds_report() {
        let subject = Subject::parse("example.com").unwrap();
        let narrator = StubNarrator::replying("A solid Web2 asset with no on-chain history.");

        let report = aggregate(&subject, partials(), &table(), &narrator)
            .await
            .unwrap();

        assert_eq!(report.domain_name, "example.com");
        assert_eq!(report.scores["seo_authority"], 80.0);
        assert_eq!(report.scores["traffic"], 80.0);
        assert_eq!(report.scores["on_chain_health"], 0.0);
        assert_eq!(report.composite_score, 60);
        assert_eq!(report.deep_dive.len(), 2);
        assert_eq!(report.metadata.analysts_succeeded, 1);
        assert_eq!(report.metadata.analysts_failed, 1);
        assert_eq!(report.metadata.narrator_model, "stub-narrator");
        assert_eq!(report.metadata.weights_version, "test");

        let seen = narrator.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(2, 60)]);
    }

    #[tokio::test]
    async fn test_narrator_failure_aborts() {
        let subject = Subject::parse("example.com").unwrap();
        let narrator = StubNarrator::failing("not JSON");

        let result = aggregate(&subject, partials(), &table(), &narrator).await;
        assert!(matches!(result, Err(AggregationError::Format(_))));
    }

    #[tokio::test]
    async fn test_blank_summary_is_rejected() {
        let subject = Subject::parse("example.com").unwrap();
        let narrator = StubNarrator::replying("   ");

        let result = aggregate(&subject, partials(), &table(), &narrator).await;
        assert!(matches!(result, Err(AggregationError::Format(_))));
    }

    #[test]
    fn test_helpers() {
        let partials = partials();
        assert_eq!(count_outcomes(&partials), (1, 1));

        let failed = failed_reports(&partials);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "on_chain_report");

        let mut scores = BTreeMap::new();
        scores.insert("a".to_string(), 10.0);
        scores.insert("b".to_string(), 90.0);
        scores.insert("c".to_string(), 50.0);
        let ranked = ranked_scores(&scores);
        assert_eq!(ranked[0], ("b", 90.0));
        assert_eq!(ranked[2], ("a", 10.0));
    }
}
