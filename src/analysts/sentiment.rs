//! X/Twitter narrative and sentiment research.
//!
//! Produces the context the market intelligence analyst starts from. It is
//! not part of the roster and never appears in the final report on its own.

use crate::error::TaskError;
use crate::llm::structured::format_text;
use crate::llm::ChatModel;
use crate::models::Subject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const FORMATTER_PROMPT: &str = "You are an expert synthesizer. Take the provided research report \
from X/Twitter and distill it into a structured JSON object. Accurately capture the core findings.";

const SHAPE: &str = r#"{
  "narrative_velocity_score": 7,
  "narrative_status": "Emerging | Popping Off | Mature | Fading | Dormant",
  "recent_discussion_summary": "Summary of discussion in the last 7-14 days",
  "key_posts": [
    { "handle": "@account", "summary": "What they said", "engagement_signal": "High engagement" }
  ],
  "overall_sentiment": "Bullish | Bearish | Neutral | Mixed"
}"#;

/// Lifecycle stage of a narrative on X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeStatus {
    Emerging,
    #[serde(rename = "Popping Off")]
    PoppingOff,
    Mature,
    Fading,
    Dormant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallSentiment {
    Bullish,
    Bearish,
    Neutral,
    Mixed,
}

/// An influential post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyPost {
    pub handle: String,
    pub summary: String,
    pub engagement_signal: String,
}

/// Structured X sentiment for a keyword and TLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// Hype and recent engagement, 1-10.
    pub narrative_velocity_score: f64,
    pub narrative_status: NarrativeStatus,
    pub recent_discussion_summary: String,
    #[serde(default)]
    pub key_posts: Vec<KeyPost>,
    pub overall_sentiment: OverallSentiment,
}

/// Social research followed by formatting.
pub struct SentimentProducer {
    social: Arc<dyn ChatModel>,
    formatter: Arc<dyn ChatModel>,
}

impl SentimentProducer {
    pub fn new(social: Arc<dyn ChatModel>, formatter: Arc<dyn ChatModel>) -> Self {
        Self { social, formatter }
    }

    fn research_prompt(subject: &Subject) -> String {
        format!(
            "Conduct a deep-dive analysis of the current narrative and sentiment on X/Twitter for \
             the topic \"{keyword}\" and the \".{tld}\" domain extension. Act as a crypto narrative \
             analyst and identify the hype cycle.\n\n\
             1. Narrative velocity: is discussion volume over the last 14 days increasing? Is the \
             narrative emerging, or an established one popping off again?\n\
             2. Traction: identify the 2-3 most influential or high-engagement posts and note their \
             traction.\n\
             3. Key voices: are VCs, developers or large community figures talking about this? \
             Mention handles.\n\
             4. Overall sentiment: bullish, bearish, neutral or mixed.\n\n\
             Provide a detailed text report summarizing all your findings.",
            keyword = subject.keyword(),
            tld = subject.tld(),
        )
    }

    pub async fn produce(&self, subject: &Subject) -> Result<SentimentReport, TaskError> {
        info!(
            "Researching X sentiment for '{}' and '.{}'",
            subject.keyword(),
            subject.tld()
        );

        let research = self
            .social
            .complete(
                "You are a social media research analyst with live access to X.",
                &Self::research_prompt(subject),
            )
            .await?;

        let report: SentimentReport =
            format_text(self.formatter.as_ref(), FORMATTER_PROMPT, &research, SHAPE).await?;

        if !(1.0..=10.0).contains(&report.narrative_velocity_score) {
            return Err(TaskError::Format(format!(
                "narrative_velocity_score = {} is outside [1, 10]",
                report.narrative_velocity_score
            )));
        }

        info!(
            "X sentiment for '{}': {:?}, {:?}",
            subject.keyword(),
            report.narrative_status,
            report.overall_sentiment
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::testing::ScriptedModel;

    const SENTIMENT_JSON: &str = r#"{
        "narrative_velocity_score": 8,
        "narrative_status": "Popping Off",
        "recent_discussion_summary": "AI agents are everywhere this week.",
        "key_posts": [{ "handle": "@vc", "summary": "Bullish on .ai", "engagement_signal": "Widely reposted" }],
        "overall_sentiment": "Bullish"
    }"#;

    #[tokio::test]
    async fn test_produce() {
        let social = Arc::new(ScriptedModel::replying("Lots of chatter about crypto and .ai"));
        let formatter = Arc::new(ScriptedModel::replying(SENTIMENT_JSON));
        let producer = SentimentProducer::new(social.clone(), formatter.clone());

        let report = producer
            .produce(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap();

        assert_eq!(report.narrative_status, NarrativeStatus::PoppingOff);
        assert_eq!(report.overall_sentiment, OverallSentiment::Bullish);
        assert_eq!(report.key_posts.len(), 1);

        assert!(social.prompts()[0].1.contains("\"crypto\""));
        assert!(social.prompts()[0].1.contains("\".ai\""));
        assert!(formatter.prompts()[0].1.contains("Lots of chatter"));
    }

    #[tokio::test]
    async fn test_social_failure_skips_formatter() {
        let social = Arc::new(ScriptedModel::new(vec![Err(LlmError::Timeout(300))]));
        let formatter = Arc::new(ScriptedModel::replying(SENTIMENT_JSON));
        let producer = SentimentProducer::new(social, formatter.clone());

        let err = producer
            .produce(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Llm(LlmError::Timeout(300))));
        assert!(formatter.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_velocity_out_of_range() {
        let social = Arc::new(ScriptedModel::replying("research"));
        let formatter = Arc::new(ScriptedModel::replying(
            &SENTIMENT_JSON.replace("\"narrative_velocity_score\": 8", "\"narrative_velocity_score\": 42"),
        ));
        let producer = SentimentProducer::new(social, formatter);

        let err = producer
            .produce(&Subject::parse("crypto.ai").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Format(_)));
    }
}
