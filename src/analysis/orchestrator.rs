//! Run sequencing: fan out, substitute, aggregate.

use super::aggregator::{aggregate, Narrator};
use super::runner::run_all;
use super::substitute::substitute;
use super::weights::WeightTable;
use crate::analysts::Analyst;
use crate::error::{AnalysisError, ConfigError};
use crate::models::{AnalystKind, FinalReport, PartialReport, Subject};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Produces a final report for one domain per call.
pub struct Orchestrator {
    analysts: Vec<Arc<dyn Analyst>>,
    table: WeightTable,
    narrator: Arc<dyn Narrator>,
    task_timeout: Option<Duration>,
    default_reasons: HashMap<AnalystKind, String>,
}

impl Orchestrator {
    /// Build an orchestrator, checking the roster against the weight table.
    pub fn new(
        analysts: Vec<Arc<dyn Analyst>>,
        table: WeightTable,
        narrator: Arc<dyn Narrator>,
    ) -> Result<Self, ConfigError> {
        if analysts.is_empty() {
            return Err(ConfigError::NoAnalysts);
        }

        let mut kinds = HashSet::new();
        for analyst in &analysts {
            let kind = analyst.kind();
            if !kinds.insert(kind) {
                return Err(ConfigError::DuplicateAnalyst(kind.agent_name().to_string()));
            }
        }

        if let Some(rule) = table.entries().iter().find(|r| !kinds.contains(&r.source)) {
            return Err(ConfigError::UnknownReport {
                score: rule.entry.score.clone(),
                report: rule.entry.report.clone(),
            });
        }

        Ok(Self {
            analysts,
            table,
            narrator,
            task_timeout: None,
            default_reasons: HashMap::new(),
        })
    }

    /// Per-task deadline applied by the runner.
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    /// Override the "no data" reason of an analyst.
    pub fn with_default_reason(mut self, kind: AnalystKind, reason: impl Into<String>) -> Self {
        self.default_reasons.insert(kind, reason.into());
        self
    }

    /// Analysts in submission order.
    pub fn roster(&self) -> Vec<AnalystKind> {
        self.analysts.iter().map(|a| a.kind()).collect()
    }

    pub fn weight_table(&self) -> &WeightTable {
        &self.table
    }

    fn default_reason(&self, kind: AnalystKind) -> &str {
        self.default_reasons
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_reason())
    }

    /// Analyze one domain.
    pub async fn analyze(&self, subject_id: &str) -> Result<FinalReport, AnalysisError> {
        let subject = Subject::parse(subject_id)
            .ok_or_else(|| AnalysisError::InvalidSubject("domain must not be empty".to_string()))?;

        info!(
            "Starting full analysis for {} (keyword '{}', tld '{}')",
            subject,
            subject.keyword(),
            subject.tld()
        );
        let started = Instant::now();

        let outcomes = run_all(&subject, &self.analysts, self.task_timeout).await;

        let partials: BTreeMap<String, PartialReport> = self
            .analysts
            .iter()
            .zip(outcomes.iter())
            .map(|(analyst, outcome)| {
                let kind = analyst.kind();
                let report = substitute(outcome, kind.agent_name(), self.default_reason(kind));
                (kind.report_name().to_string(), report)
            })
            .collect();

        info!("Sending {} reports to the narrator", partials.len());

        let mut report = aggregate(&subject, partials, &self.table, self.narrator.as_ref())
            .await
            .map_err(|e| {
                error!("Aggregation failed for {}: {}", subject, e);
                e
            })?;

        report.domain_name = subject.id().to_string();
        report.metadata.duration_seconds = started.elapsed().as_secs_f64();

        info!(
            "Analysis complete for {} in {:.1}s",
            subject, report.metadata.duration_seconds
        );

        Ok(report)
    }
}
