//! Research-based liquidity estimate.

use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::format_text;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, Findings, LiquidityReport, Subject};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const FORMATTER_PROMPT: &str = "You are a data synthesizer. Take the provided research report on \
domain liquidity and distill it into a structured JSON object. liquidity_score is 1-10.";

const SHAPE: &str = r#"{
  "liquidity_score": 6,
  "liquidity_reasoning": "...",
  "market_activity_summary": "..."
}"#;

pub struct LiquidityAnalyst {
    research: Arc<dyn ChatModel>,
    formatter: Arc<dyn ChatModel>,
}

impl LiquidityAnalyst {
    pub fn new(research: Arc<dyn ChatModel>, formatter: Arc<dyn ChatModel>) -> Self {
        Self {
            research,
            formatter,
        }
    }

    fn research_prompt(subject: &Subject) -> String {
        format!(
            "You are an expert domain market liquidity analyst. Estimate the liquidity of the \
             domain \"{domain}\".\n\n\
             1. Direct activity: look for current or recent (last 12 months) sale listings, \
             auctions or for-sale landers for \"{domain}\".\n\
             2. TLD activity: search marketplaces such as Sedo and Afternic and news sites such as \
             DNJournal for recent sales of \".{tld}\" domains.\n\
             3. Keyword demand: search forums such as NamePros and social media for recent \
             discussion of domains containing \"{keyword}\".\n\
             4. Synthesize: high liquidity means active recent trading of similar assets; low \
             liquidity means little or no recent market activity.\n\n\
             Provide a detailed text report summarizing all your findings.",
            domain = subject,
            tld = subject.tld(),
            keyword = subject.keyword(),
        )
    }
}

#[async_trait]
impl Analyst for LiquidityAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::LiquidityPredictor
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let research = self
            .research
            .complete(
                "You are a domain market researcher with live web search.",
                &Self::research_prompt(subject),
            )
            .await?;
        info!("Received liquidity research for {} ({} chars)", subject, research.len());

        let report: LiquidityReport =
            format_text(self.formatter.as_ref(), FORMATTER_PROMPT, &research, SHAPE).await?;
        validated(Findings::LiquidityPredictor(report))
    }
}
