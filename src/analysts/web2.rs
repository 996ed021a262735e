//! Web2 SEO authority and traffic.

use super::{validated, Analyst};
use crate::error::TaskError;
use crate::llm::structured::structured;
use crate::llm::ChatModel;
use crate::models::{AnalystKind, Findings, Subject, Web2Report};
use crate::sources::seranking::SeoProfile;
use crate::sources::SeoSource;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

const SYSTEM_PROMPT: &str = "You are an analyst specializing in Web2 digital authority and \
traffic. You interpret SEO metrics to score a domain's reputation and popularity.

Principles:
1. Authority is king: domain authority is the primary indicator of trust and ranking potential. \
Above 50 is strong, above 70 exceptional. Unique referring domains are a key component.
2. Traffic is proof: organic traffic proves an existing audience. The historical trend matters \
more than the absolute number.";

const SHAPE: &str = r#"{
  "seo_authority_score": 6,
  "seo_authority_reasoning": "...",
  "traffic_score": 4,
  "traffic_reasoning": "..."
}"#;

/// Render the facts the model scores.
pub fn summarize(domain: &str, profile: &SeoProfile) -> String {
    let current = if profile.current_traffic > 0 {
        profile.current_traffic.to_string()
    } else {
        "Not available for current month".to_string()
    };

    format!(
        "Analysis for domain: {}\n\
         - Domain Authority (0-100 scale): {}\n\
         - Total Referring Domains: {}\n\
         - Dofollow Referring Domains: {}\n\
         - Current Estimated Monthly Traffic: {}\n\
         - Last 12 Months Traffic Trend: {}\n\
         - Total Keywords in Top 100: {}",
        domain,
        profile.domain_authority,
        profile.referring_domains,
        profile.dofollow_referring_domains,
        current,
        profile.traffic_trend(),
        profile.top_ranking_keywords,
    )
}

pub struct Web2AuthorityAnalyst {
    source: Arc<dyn SeoSource>,
    model: Arc<dyn ChatModel>,
}

impl Web2AuthorityAnalyst {
    pub fn new(source: Arc<dyn SeoSource>, model: Arc<dyn ChatModel>) -> Self {
        Self { source, model }
    }
}

#[async_trait]
impl Analyst for Web2AuthorityAnalyst {
    fn kind(&self) -> AnalystKind {
        AnalystKind::Web2Authority
    }

    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError> {
        let Some(profile) = self.source.profile(subject.id()).await? else {
            info!("No Web2 data for {}", subject);
            return Ok(None);
        };

        let prompt = format!(
            "Based on your principles and the following live data summary, score the domain.\n\n\
             Data Summary:\n{}\n\n\
             Provide seo_authority_score (1-10) from authority and referring domains, and \
             traffic_score (1-10) from traffic and its trend, with reasoning for each.",
            summarize(subject.id(), &profile)
        );

        let report: Web2Report =
            structured(self.model.as_ref(), SYSTEM_PROMPT, &prompt, SHAPE).await?;
        validated(Findings::Web2Authority(report))
    }
}
