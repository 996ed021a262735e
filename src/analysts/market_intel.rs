//! Market intelligence: brandability and market trend.
//!
//! Runs X sentiment research first and embeds it in the market research
//! prompt. Without sentiment the analyst fails without calling research.

use super::sentiment::SentimentProducer;
use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::parse_json;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, Findings, MarketIntelReport, Subject};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const SHAPE: &str = r#"{
  "brandability_score": 8,
  "brandability_reasoning": "...",
  "market_trend_score": 7,
  "market_trend_reasoning": "...",
  "analyst_summary": "..."
}"#;

pub struct MarketIntelAnalyst {
    sentiment: SentimentProducer,
    research: Arc<dyn ChatModel>,
}

impl MarketIntelAnalyst {
    pub fn new(sentiment: SentimentProducer, research: Arc<dyn ChatModel>) -> Self {
        Self {
            sentiment,
            research,
        }
    }

    fn research_prompt(subject: &Subject, sentiment_json: &str) -> String {
        format!(
            "Investigate the market viability of the domain \"{domain}\", using the real-time \
             X/Twitter sentiment below as a starting point.\n\n\
             STARTING CONTEXT (X/Twitter sentiment):\n\"\"\"\n{sentiment}\n\"\"\"\n\n\
             1. Market analysis: search financial and crypto news for \"{keyword}\". Corroborate \
             or contradict the X sentiment with hard data.\n\
             2. TLD market: research the secondary market for \".{tld}\" and find at least two \
             recent high-value comparable sales.\n\
             3. Brand and web presence: assess the brand potential of \"{keyword}\", look for \
             companies with similar names, and check whether a website is live on \"{domain}\".\n\n\
             Synthesize all findings, including the X sentiment, into a single valid JSON object \
             and nothing else. Scores are 0-10. Cite sources as [Source N].\n\n\
             JSON shape:\n{shape}",
            domain = subject,
            keyword = subject.keyword(),
            tld = subject.tld(),
            sentiment = sentiment_json,
            shape = SHAPE,
        )
    }
}

#[async_trait]
impl Analyst for MarketIntelAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::MarketIntel
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let sentiment = self.sentiment.produce(subject).await.map_err(|e| {
            warn!("X sentiment unavailable for {}: {}", subject, e);
            TaskError::Dependency {
                producer: "x_sentiment",
                reason: e.to_string(),
            }
        })?;

        let sentiment_json = serde_json::to_string_pretty(&sentiment)?;
        let reply = self
            .research
            .complete(
                "You are an elite market intelligence analyst covering crypto and Web3.",
                &Self::research_prompt(subject, &sentiment_json),
            )
            .await?;

        let report: MarketIntelReport = parse_json(&reply)?;
        info!("Market intelligence report ready for {}", subject);
        validated(Findings::MarketIntel(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::testing::ScriptedModel;

    const SENTIMENT_JSON: &str = r#"{
        "narrative_velocity_score": 6,
        "narrative_status": "Mature",
        "recent_discussion_summary": "Steady talk about AI domains.",
        "key_posts": [],
        "overall_sentiment": "Neutral"
    }"#;

    const REPORT: &str = r#"<think>Let me check sales {draft}</think>
```json
{
  "brandability_score": 9,
  "brandability_reasoning": "Short and memorable [Source 1]",
  "market_trend_score": 8,
  "market_trend_reasoning": "AI is hot [Source 2]",
  "analyst_summary": "Premium name"
}
```"#;

    fn analyst(
        social: Vec<Result<String, LlmError>>,
        research: Arc<ScriptedModel>,
    ) -> MarketIntelAnalyst {
        MarketIntelAnalyst::new(
            SentimentProducer::new(
                Arc::new(ScriptedModel::new(social)),
                Arc::new(ScriptedModel::replying(SENTIMENT_JSON)),
            ),
            research,
        )
    }

    #[tokio::test]
    async fn test_sentiment_feeds_research() {
        let research = Arc::new(ScriptedModel::replying(REPORT));
        let analyst = analyst(vec![Ok("X research".to_string())], research.clone());

        let findings = analyst
            .analyze(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap()
            .unwrap();

        match findings {
            Findings::MarketIntel(report) => {
                assert_eq!(report.brandability_score, 9.0);
                assert_eq!(report.market_trend_score, 8.0);
            }
            other => panic!("unexpected findings: {:?}", other),
        }

        let prompt = &research.prompts()[0].1;
        assert!(prompt.contains("Steady talk about AI domains."));
        assert!(prompt.contains("\"crypto.ai\""));
    }

    #[tokio::test]
    async fn test_sentiment_failure_short_circuits() {
        let research = Arc::new(ScriptedModel::replying(REPORT));
        let analyst = analyst(vec![Err(LlmError::Status { status: 503, body: String::new() })], research.clone());

        let err = analyst
            .analyze(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Dependency { producer: "x_sentiment", .. }));
        assert!(research.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_scores_are_rejected() {
        let research = Arc::new(ScriptedModel::replying(&REPORT.replace("\"brandability_score\": 9", "\"brandability_score\": 90")));
        let analyst = analyst(vec![Ok("X research".to_string())], research);

        let err = analyst
            .analyze(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Format(_)));
    }
}
