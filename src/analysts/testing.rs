//! Scripted analysts for exercising the runner and orchestrator.

use super::Analyst;
use crate::error::TaskError;
use crate::models::{
    AnalystKind, CompsReport, Findings, LiquidityReport, MarketIntelReport, MomentumReport,
    MomentumState, OnChainReport, Subject, Web2Report,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Findings(Findings),
    Fail(String),
    Empty,
    Panic,
}

/// An analyst that sleeps, then returns a scripted result.
#[derive(Debug)]
pub struct StubAnalyst {
    kind: AnalystKind,
    delay: Duration,
    script: Script,
    calls: AtomicUsize,
}

impl StubAnalyst {
    fn new(kind: AnalystKind, script: Script) -> Self {
        Self {
            kind,
            delay: Duration::ZERO,
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds with every declared score field set to `value`.
    pub fn scoring(kind: AnalystKind, value: f64) -> Self {
        Self::new(kind, Script::Findings(findings_with(kind, value)))
    }

    pub fn failing(kind: AnalystKind, message: &str) -> Self {
        Self::new(kind, Script::Fail(message.to_string()))
    }

    pub fn empty(kind: AnalystKind) -> Self {
        Self::new(kind, Script::Empty)
    }

    pub fn panicking(kind: AnalystKind) -> Self {
        Self::new(kind, Script::Panic)
    }

    pub fn delayed(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyst for StubAnalyst {
    fn kind(&self) -> AnalystKind {
        self.kind
    }

    async fn analyze(&self, _subject: &Subject) -> Result<Option<Findings>, TaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.script {
            Script::Findings(findings) => Ok(Some(findings.clone())),
            Script::Fail(message) => Err(TaskError::source("stub", message.clone())),
            Script::Empty => Ok(None),
            Script::Panic => panic!("stub analyst panicked"),
        }
    }
}

/// Findings of the given kind with every score field set to `value`.
pub fn findings_with(kind: AnalystKind, value: f64) -> Findings {
    match kind {
        AnalystKind::OnChain => Findings::OnChain(OnChainReport {
            on_chain_health_score: value,
            on_chain_health_reasoning: "Claimed and renewed".to_string(),
            liquidity_score: value,
            liquidity_reasoning: "Several transfers".to_string(),
        }),
        AnalystKind::Web2Authority => Findings::Web2Authority(Web2Report {
            seo_authority_score: value,
            seo_authority_reasoning: "Solid backlinks".to_string(),
            traffic_score: value,
            traffic_reasoning: "Growing traffic".to_string(),
        }),
        AnalystKind::MarketIntel => Findings::MarketIntel(MarketIntelReport {
            brandability_score: value,
            brandability_reasoning: "Short keyword".to_string(),
            market_trend_score: value,
            market_trend_reasoning: "Trending sector".to_string(),
            analyst_summary: "Promising name".to_string(),
        }),
        AnalystKind::LiveMomentum => Findings::LiveMomentum(MomentumReport {
            momentum_score: value,
            momentum_state: MomentumState::Stable,
            reasoning: "Steady activity".to_string(),
        }),
        AnalystKind::LiquidityPredictor => Findings::LiquidityPredictor(LiquidityReport {
            liquidity_score: value,
            liquidity_reasoning: "Active TLD".to_string(),
            market_activity_summary: "Regular sales".to_string(),
        }),
        AnalystKind::ComparableSales => Findings::ComparableSales(CompsReport {
            comparable_sales: vec![],
            analysis_summary: "No close comps".to_string(),
        }),
    }
}
