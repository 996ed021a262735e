//! Specialist analysts.
//!
//! Each analyst gathers evidence about a domain from one angle and returns
//! typed findings. Analysts never see each other's results; the one
//! sequencing dependency (X sentiment feeding market research) is internal
//! to the market intelligence analyst.

pub mod comps;
pub mod liquidity;
pub mod market_intel;
pub mod momentum;
pub mod on_chain;
pub mod sentiment;
pub mod web2;

#[cfg(test)]
pub mod testing;

use crate::config::Config;
use crate::error::TaskError;
use crate::llm::{ChatClient, ChatModel};
use crate::models::{AnalystKind, Findings, Subject};
use crate::sources::{DomaClient, OnChainSource, SalesCorpus, SeRankingClient, SeoSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// A specialist that analyzes one domain.
#[async_trait]
pub trait Analyst: Send + Sync {
    fn kind(&self) -> AnalystKind;

    /// Findings for the subject, `Ok(None)` when there is no evidence to
    /// report, or an error when the analysis itself failed.
    async fn analyze(&self, subject: &Subject) -> Result<Option<Findings>, TaskError>;
}

/// Check declared score ranges before handing findings to the runner.
pub(crate) fn validated(findings: Findings) -> Result<Option<Findings>, TaskError> {
    findings.check_ranges().map_err(TaskError::Format)?;
    Ok(Some(findings))
}

/// Shared clients the analysts are built from.
#[derive(Clone)]
pub struct Services {
    pub on_chain: Arc<dyn OnChainSource>,
    pub seo: Arc<dyn SeoSource>,
    pub sales: Arc<SalesCorpus>,
    pub fast: Arc<dyn ChatModel>,
    pub formatter: Arc<dyn ChatModel>,
    pub research: Arc<dyn ChatModel>,
    pub social: Arc<dyn ChatModel>,
    pub momentum: Arc<dyn ChatModel>,
    pub poll_limit: usize,
}

impl Services {
    /// Build HTTP-backed services from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model = |endpoint: &crate::config::EndpointConfig| -> Result<Arc<dyn ChatModel>> {
            let client = ChatClient::new(endpoint.clone())
                .with_context(|| format!("Failed to configure model {}", endpoint.model))?;
            Ok(Arc::new(client))
        };

        let sources = &config.sources;
        Ok(Self {
            on_chain: Arc::new(DomaClient::new(sources).context("Failed to configure Doma client")?),
            seo: Arc::new(
                SeRankingClient::new(sources).context("Failed to configure SE Ranking client")?,
            ),
            sales: Arc::new(SalesCorpus::new(
                sources.sales_corpus_dir.as_ref().map(PathBuf::from),
                sources.sales_sample_size,
            )),
            fast: model(&config.llm.fast)?,
            formatter: model(&config.llm.formatter)?,
            research: model(&config.llm.research)?,
            social: model(&config.llm.social)?,
            momentum: model(&config.llm.momentum)?,
            poll_limit: sources.poll_limit,
        })
    }
}

/// Instantiate the analysts of a roster, in roster order.
pub fn build_roster(roster: &[AnalystKind], services: &Services) -> Vec<Arc<dyn Analyst>> {
    roster
        .iter()
        .map(|kind| -> Arc<dyn Analyst> {
            match kind {
                AnalystKind::OnChain => Arc::new(on_chain::OnChainAnalyst::new(
                    services.on_chain.clone(),
                    services.fast.clone(),
                )),
                AnalystKind::Web2Authority => Arc::new(web2::Web2AuthorityAnalyst::new(
                    services.seo.clone(),
                    services.fast.clone(),
                )),
                AnalystKind::MarketIntel => Arc::new(market_intel::MarketIntelAnalyst::new(
                    sentiment::SentimentProducer::new(
                        services.social.clone(),
                        services.formatter.clone(),
                    ),
                    services.research.clone(),
                )),
                AnalystKind::LiveMomentum => Arc::new(momentum::LiveMomentumAnalyst::new(
                    services.on_chain.clone(),
                    services.momentum.clone(),
                    services.poll_limit,
                )),
                AnalystKind::LiquidityPredictor => Arc::new(liquidity::LiquidityAnalyst::new(
                    services.research.clone(),
                    services.formatter.clone(),
                )),
                AnalystKind::ComparableSales => Arc::new(comps::ComparableSalesAnalyst::new(
                    services.research.clone(),
                    services.formatter.clone(),
                    services.sales.clone(),
                )),
            }
        })
        .collect()
}
