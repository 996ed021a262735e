//! Comparable sales, from live research and the historical sales corpus.

use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::format_text;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, CompsReport, Findings, Subject};
use crate::sources::SalesCorpus;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

const FORMATTER_PROMPT: &str = "You are a data extraction specialist. Take the provided research \
report on comparable domain sales and extract the findings into a strict JSON object. Prices are \
in USD, dates are YYYY-MM-DD.";

const SHAPE: &str = r#"{
  "comparable_sales": [
    { "domain": "example.ai", "price_usd": 25000, "date": "2025-01-15" }
  ],
  "analysis_summary": "..."
}"#;

pub struct ComparableSalesAnalyst {
    research: Arc<dyn ChatModel>,
    formatter: Arc<dyn ChatModel>,
    corpus: Arc<SalesCorpus>,
}

impl ComparableSalesAnalyst {
    pub fn new(
        research: Arc<dyn ChatModel>,
        formatter: Arc<dyn ChatModel>,
        corpus: Arc<SalesCorpus>,
    ) -> Self {
        Self {
            research,
            formatter,
            corpus,
        }
    }

    fn research_prompt(subject: &Subject, history: Option<&str>) -> String {
        let mut prompt = format!(
            "You are an expert domain sales data analyst. Find the most relevant, recent and \
             verifiable comparable sales for \"{domain}\".\n\n\
             1. Primary search: DNJournal, NameBio and Sedo market reports for sales of \".{tld}\" \
             domains.\n\
             2. Secondary search: sales of domains containing \"{keyword}\" in any TLD.\n\
             3. Prioritize recency (last 12-18 months) and similarity (same TLD, similar keyword \
             and length) and keep the top 3 comps.\n\
             4. For each comp give the domain, the final sale price in USD and the sale date.\n",
            domain = subject,
            tld = subject.tld(),
            keyword = subject.keyword(),
        );

        if let Some(csv) = history {
            prompt.push_str(&format!(
                "\nHistorical sales you may also draw from:\n```csv\n{}```\n",
                csv
            ));
        }

        prompt.push_str("\nProvide a detailed text report listing the top 3 comps clearly.");
        prompt
    }
}

#[async_trait]
impl Analyst for ComparableSalesAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::ComparableSales
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let sample = self.corpus.sample().await;
        let history = (!sample.is_empty()).then_some(sample.csv.as_str());
        debug!("Including {} historical sales in the comps prompt", sample.records);

        let research = self
            .research
            .complete(
                "You are a domain market researcher with live web search.",
                &Self::research_prompt(subject, history),
            )
            .await?;
        info!("Received comps research for {} ({} chars)", subject, research.len());

        let report: CompsReport =
            format_text(self.formatter.as_ref(), FORMATTER_PROMPT, &research, SHAPE).await?;
        validated(Findings::ComparableSales(report))
    }
}
