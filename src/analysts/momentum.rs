//! Short-term trading momentum of the subject's TLD from the Doma event feed.

use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::parse_json;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, Findings, MomentumReport, Subject};
use crate::sources::OnChainSource;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

pub struct LiveMomentumAnalyst {
    source: Arc<dyn OnChainSource>,
    model: Arc<dyn ChatModel>,
    poll_limit: usize,
}

impl LiveMomentumAnalyst {
    pub fn new(source: Arc<dyn OnChainSource>, model: Arc<dyn ChatModel>, poll_limit: usize) -> Self {
        Self {
            source,
            model,
            poll_limit,
        }
    }

    fn prompt(tld: &str, events: &[Value]) -> Result<String, TaskError> {
        let events = serde_json::to_string_pretty(events)?;
        Ok(format!(
            "ROLE:\nYou are a high-frequency market momentum analyst. Analyze a raw stream of recent \
             blockchain events to measure the current momentum of the \".{tld}\" TLD.\n\n\
             CONTEXT (live event stream, most recent Doma Protocol events):\n```json\n{events}\n```\n\n\
             TASK:\n\
             1. Count NAME_TOKEN_SOLD, NAME_TOKEN_LISTED, NAME_TOKEN_TRANSFERRED and \
             NAME_TOKEN_MINTED events for \".{tld}\" in the last 24 hours.\n\
             2. Compare that 24-hour activity to the overall activity in the dataset.\n\
             3. Respond ONLY with a single JSON object. momentum_score MUST be an integer \
             between 0 and 100.\n\n\
             JSON SHAPE:\n```json\n{{\n  \"momentum_score\": 50,\n  \
             \"momentum_state\": \"Accelerating | Peaking | Stable | Cooling Down | Dormant\",\n  \
             \"reasoning\": \"A brief, data-driven explanation.\"\n}}\n```",
            tld = tld,
            events = events,
        ))
    }
}

#[async_trait]
impl Analyst for LiveMomentumAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::LiveMomentum
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let events = self.source.recent_events(self.poll_limit).await?;
        if events.is_empty() {
            warn!("No recent events to analyze for .{}", subject.tld());
            return Ok(None);
        }

        info!("Analyzing {} events for .{} momentum", events.len(), subject.tld());
        let reply = self
            .model
            .complete(
                "You measure trading momentum from blockchain event streams.",
                &Self::prompt(subject.tld(), &events)?,
            )
            .await?;

        let report: MomentumReport = parse_json(&reply)?;
        validated(Findings::LiveMomentum(report))
    }
}
