//! Executive summary writer backed by a chat model.

use super::client::ChatModel;
use super::structured::extract_json;
use crate::analysis::aggregator::{failed_reports, ranked_scores, NarrativeRequest, Narrator};
use crate::error::AggregationError;
use crate::models::AnalystKind;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are the final intelligence synthesizer for a domain valuation \
platform. You receive expert reports about one domain together with scores that have already \
been computed. Some reports may have failed; acknowledge missing evidence instead of inventing \
it. Never change or recompute the scores you are given. Respond ONLY with a JSON object of the \
form {\"executive_summary\": \"...\"}.";

#[derive(Debug, Deserialize)]
struct NarrativeReply {
    executive_summary: String,
}

/// Narrator that asks a chat model for a 3-4 sentence summary.
pub struct LlmNarrator {
    model: Arc<dyn ChatModel>,
}

impl LlmNarrator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Build the user prompt for a request.
    pub fn build_prompt(request: &NarrativeRequest<'_>) -> Result<String, AggregationError> {
        let mut prompt = format!(
            "Domain: {}\nComposite score (0-100): {}\n\nScores (0-100, strongest first):\n",
            request.subject, request.composite_score
        );
        for (name, value) in ranked_scores(request.scores) {
            prompt.push_str(&format!("- {}: {:.0}\n", name, value));
        }

        prompt.push_str("\nExpert reports:\n");
        for (report_name, partial) in request.partials {
            let title = AnalystKind::from_name(report_name)
                .map(|k| k.title())
                .unwrap_or(report_name.as_str());
            let body = serde_json::to_string_pretty(partial)
                .map_err(|e| AggregationError::Format(e.to_string()))?;
            prompt.push_str(&format!("\n### {}\n{}\n", title, body));
        }

        let failed = failed_reports(request.partials);
        if failed.iter().any(|(name, _)| *name == AnalystKind::OnChain.report_name()) {
            prompt.push_str(
                "\nThe on-chain report is unavailable: describe the domain as a traditional Web2 asset.\n",
            );
        }

        prompt.push_str(
            "\nWrite a compelling 3-4 sentence executive summary consistent with the scores above.",
        );
        Ok(prompt)
    }
}

#[async_trait]
impl Narrator for LlmNarrator {
    fn model(&self) -> &str {
        self.model.model()
    }

    async fn narrate(&self, request: &NarrativeRequest<'_>) -> Result<String, AggregationError> {
        let prompt = Self::build_prompt(request)?;
        info!(
            "Requesting executive summary for {} from {}",
            request.subject,
            self.model.model()
        );

        let reply = self.model.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!("Narrator reply: {} chars", reply.len());

        let json = extract_json(&reply)
            .ok_or_else(|| AggregationError::Format("no JSON object in narrator reply".to_string()))?;
        let parsed: NarrativeReply = serde_json::from_str(json)
            .map_err(|e| AggregationError::Format(format!("invalid narrator JSON: {}", e)))?;

        Ok(parsed.executive_summary.trim().to_string())
    }
}
