//! SE Ranking backlink and organic traffic data.

use crate::config::SourcesConfig;
use crate::error::TaskError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const SOURCE: &str = "seranking";

/// Number of months of traffic history kept.
const HISTORY_MONTHS: usize = 12;

/// Organic traffic for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTraffic {
    /// `YYYY-MM`
    pub month: String,
    pub traffic: u64,
}

/// Direction of the traffic history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for TrafficTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TrafficTrend::Increasing => "Increasing",
            TrafficTrend::Decreasing => "Decreasing",
            TrafficTrend::Stable => "Stable",
        };
        write!(f, "{}", label)
    }
}

/// SEO and traffic profile of a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoProfile {
    pub domain_authority: f64,
    pub referring_domains: u64,
    pub dofollow_referring_domains: u64,
    pub total_backlinks: u64,
    pub monthly_traffic: Vec<MonthlyTraffic>,
    pub current_traffic: u64,
    pub top_ranking_keywords: u64,
}

impl SeoProfile {
    /// Compare the last month of history against the first.
    pub fn traffic_trend(&self) -> TrafficTrend {
        match (self.monthly_traffic.first(), self.monthly_traffic.last()) {
            (Some(first), Some(last)) if self.monthly_traffic.len() > 1 => {
                if last.traffic > first.traffic {
                    TrafficTrend::Increasing
                } else {
                    TrafficTrend::Decreasing
                }
            }
            _ => TrafficTrend::Stable,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    summary: Vec<BacklinkSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BacklinkSummary {
    domain_inlink_rank: f64,
    refdomains: u64,
    dofollow_refdomains: u64,
    backlinks: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryEntry {
    year: u32,
    month: u32,
    traffic_sum: u64,
}

#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(default)]
    organic: Option<OrganicOverview>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OrganicOverview {
    traffic: u64,
    top1_5: u64,
    top6_10: u64,
    top11_20: u64,
    top21_50: u64,
    top51_100: u64,
}

/// Source of Web2 SEO data.
#[async_trait]
pub trait SeoSource: Send + Sync {
    /// SEO profile, or `None` when the source is not configured.
    async fn profile(&self, domain: &str) -> Result<Option<SeoProfile>, TaskError>;
}

/// HTTP client for the SE Ranking API.
pub struct SeRankingClient {
    base_url: String,
    api_key: Option<String>,
    delay: Duration,
    http_client: reqwest::Client,
}

impl SeRankingClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, TaskError> {
        let api_key = std::env::var(&config.seranking_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: &SourcesConfig, api_key: Option<String>) -> Result<Self, TaskError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| TaskError::source(SOURCE, e.to_string()))?;

        Ok(Self {
            base_url: config.seranking_url.trim_end_matches('/').to_string(),
            api_key,
            delay: Duration::from_millis(config.seranking_delay_ms),
            http_client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        api_key: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TaskError> {
        debug!("GET {}{}", self.base_url, path);
        self.http_client
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", format!("Token {}", api_key))
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TaskError::source(SOURCE, e.to_string()))?
            .json()
            .await
            .map_err(|e| TaskError::source(SOURCE, format!("unexpected response for {}: {}", path, e)))
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl SeoSource for SeRankingClient {
    async fn profile(&self, domain: &str) -> Result<Option<SeoProfile>, TaskError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("SE Ranking API key not configured, skipping Web2 data for {}", domain);
            return Ok(None);
        };

        info!("Fetching SE Ranking data for {}", domain);

        // Sequential with a pause between calls to stay under the rate limit.
        let summary: SummaryResponse = self
            .get(api_key, "/backlinks/summary", &[("target", domain), ("mode", "domain")])
            .await?;
        self.pause().await;

        let history: Vec<HistoryEntry> = self
            .get(
                api_key,
                "/domain/overview/history",
                &[("domain", domain), ("source", "us"), ("type", "organic")],
            )
            .await?;
        self.pause().await;

        let overview: OverviewResponse = self
            .get(api_key, "/domain/overview/db", &[("domain", domain), ("source", "us")])
            .await?;

        let summary = summary
            .summary
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::source(SOURCE, "backlink summary missing from response"))?;
        let organic = overview
            .organic
            .ok_or_else(|| TaskError::source(SOURCE, "organic overview missing from response"))?;

        let skip = history.len().saturating_sub(HISTORY_MONTHS);
        let monthly_traffic = history
            .into_iter()
            .skip(skip)
            .map(|h| MonthlyTraffic {
                month: format!("{}-{:02}", h.year, h.month),
                traffic: h.traffic_sum,
            })
            .collect();

        Ok(Some(SeoProfile {
            domain_authority: summary.domain_inlink_rank,
            referring_domains: summary.refdomains,
            dofollow_referring_domains: summary.dofollow_refdomains,
            total_backlinks: summary.backlinks,
            monthly_traffic,
            current_traffic: organic.traffic,
            top_ranking_keywords: organic.top1_5
                + organic.top6_10
                + organic.top11_20
                + organic.top21_50
                + organic.top51_100,
        }))
    }
}
