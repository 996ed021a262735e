//! Data models for domain valuation.
//!
//! This module contains the subject under analysis, the typed findings each
//! analyst produces, the partial reports the orchestrator collects and the
//! final aggregated report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The domain being analyzed, with the identifiers derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: String,
    keyword: String,
    tld: String,
}

impl Subject {
    /// Build a subject from a raw domain string.
    ///
    /// Returns `None` if the input is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let id = raw.trim().trim_end_matches('.').to_lowercase();
        if id.is_empty() {
            return None;
        }

        let (keyword, tld) = match id.rsplit_once('.') {
            Some((keyword, tld)) => (keyword.to_string(), tld.to_string()),
            None => (id.clone(), String::new()),
        };

        Some(Self { id, keyword, tld })
    }

    /// The full domain, e.g. `crypto.ai`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Everything before the last label, e.g. `crypto`.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The top-level domain without the dot, e.g. `ai`. Empty for bare names.
    pub fn tld(&self) -> &str {
        &self.tld
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// A score field an analyst declares, with its bounded range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreField {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn field(name: &'static str, min: f64, max: f64) -> ScoreField {
    ScoreField { name, min, max }
}

const ON_CHAIN_FIELDS: &[ScoreField] = &[
    field("on_chain_health_score", 0.0, 10.0),
    field("liquidity_score", 0.0, 10.0),
];
const WEB2_FIELDS: &[ScoreField] = &[
    field("seo_authority_score", 0.0, 10.0),
    field("traffic_score", 0.0, 10.0),
];
const MARKET_INTEL_FIELDS: &[ScoreField] = &[
    field("brandability_score", 0.0, 10.0),
    field("market_trend_score", 0.0, 10.0),
];
const MOMENTUM_FIELDS: &[ScoreField] = &[field("momentum_score", 0.0, 100.0)];
const LIQUIDITY_FIELDS: &[ScoreField] = &[field("liquidity_score", 1.0, 10.0)];

/// The analysts the system knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystKind {
    OnChain,
    Web2Authority,
    MarketIntel,
    LiveMomentum,
    LiquidityPredictor,
    ComparableSales,
}

impl AnalystKind {
    /// Every analyst, in default roster order.
    pub const ALL: [AnalystKind; 6] = [
        AnalystKind::OnChain,
        AnalystKind::Web2Authority,
        AnalystKind::MarketIntel,
        AnalystKind::LiveMomentum,
        AnalystKind::LiquidityPredictor,
        AnalystKind::ComparableSales,
    ];

    /// Short snake-case identifier, matching the serialized form.
    pub fn key(&self) -> &'static str {
        match self {
            AnalystKind::OnChain => "on_chain",
            AnalystKind::Web2Authority => "web2_authority",
            AnalystKind::MarketIntel => "market_intel",
            AnalystKind::LiveMomentum => "live_momentum",
            AnalystKind::LiquidityPredictor => "liquidity_predictor",
            AnalystKind::ComparableSales => "comparable_sales",
        }
    }

    /// Name used in logs, config and failure placeholders.
    pub fn agent_name(&self) -> &'static str {
        match self {
            AnalystKind::OnChain => "on_chain_analyst",
            AnalystKind::Web2Authority => "web2_authority_analyst",
            AnalystKind::MarketIntel => "market_intelligence_agent",
            AnalystKind::LiveMomentum => "live_momentum_agent",
            AnalystKind::LiquidityPredictor => "liquidity_predictor_agent",
            AnalystKind::ComparableSales => "comparable_sales_agent",
        }
    }

    /// Key of this analyst's entry in the final report's deep dive.
    pub fn report_name(&self) -> &'static str {
        match self {
            AnalystKind::OnChain => "on_chain_report",
            AnalystKind::Web2Authority => "web2_report",
            AnalystKind::MarketIntel => "market_intel_report",
            AnalystKind::LiveMomentum => "momentum_report",
            AnalystKind::LiquidityPredictor => "liquidity_report",
            AnalystKind::ComparableSales => "comps_report",
        }
    }

    /// Human-readable title for rendered reports.
    pub fn title(&self) -> &'static str {
        match self {
            AnalystKind::OnChain => "On-Chain Analyst",
            AnalystKind::Web2Authority => "Web2 Authority",
            AnalystKind::MarketIntel => "Market Intelligence",
            AnalystKind::LiveMomentum => "Live Momentum",
            AnalystKind::LiquidityPredictor => "Liquidity Predictor",
            AnalystKind::ComparableSales => "Comparable Sales",
        }
    }

    /// Score fields this analyst declares.
    pub fn score_fields(&self) -> &'static [ScoreField] {
        match self {
            AnalystKind::OnChain => ON_CHAIN_FIELDS,
            AnalystKind::Web2Authority => WEB2_FIELDS,
            AnalystKind::MarketIntel => MARKET_INTEL_FIELDS,
            AnalystKind::LiveMomentum => MOMENTUM_FIELDS,
            AnalystKind::LiquidityPredictor => LIQUIDITY_FIELDS,
            AnalystKind::ComparableSales => &[],
        }
    }

    /// Look up a declared score field by name.
    pub fn score_field(&self, name: &str) -> Option<ScoreField> {
        self.score_fields().iter().copied().find(|f| f.name == name)
    }

    /// Reason recorded when the analyst finishes without evidence.
    pub fn default_reason(&self) -> &'static str {
        match self {
            AnalystKind::OnChain => "No on-chain record found for this domain.",
            AnalystKind::Web2Authority => "No SEO or traffic data available for this domain.",
            AnalystKind::MarketIntel => "Market research produced no usable findings.",
            AnalystKind::LiveMomentum => "No recent on-chain events available to measure momentum.",
            AnalystKind::LiquidityPredictor => "Liquidity research produced no usable findings.",
            AnalystKind::ComparableSales => "No comparable sales were found.",
        }
    }

    /// Resolve an analyst from its agent name, report name or snake-case kind.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        AnalystKind::ALL.into_iter().find(|kind| {
            kind.agent_name() == name
                || kind.report_name() == name
                || kind.key() == name
        })
    }
}

impl fmt::Display for AnalystKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.agent_name())
    }
}

/// On-chain health and liquidity assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnChainReport {
    pub on_chain_health_score: f64,
    pub on_chain_health_reasoning: String,
    pub liquidity_score: f64,
    pub liquidity_reasoning: String,
}

/// SEO authority and traffic assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Web2Report {
    pub seo_authority_score: f64,
    pub seo_authority_reasoning: String,
    pub traffic_score: f64,
    pub traffic_reasoning: String,
}

/// Brandability and market trend assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIntelReport {
    pub brandability_score: f64,
    pub brandability_reasoning: String,
    pub market_trend_score: f64,
    pub market_trend_reasoning: String,
    pub analyst_summary: String,
}

/// Lifecycle stage of trading activity for a TLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MomentumState {
    Accelerating,
    Peaking,
    Stable,
    #[serde(rename = "Cooling Down")]
    CoolingDown,
    Dormant,
}

/// Short-term trading momentum of the subject's TLD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumReport {
    pub momentum_score: f64,
    pub momentum_state: MomentumState,
    pub reasoning: String,
}

/// Research-based liquidity estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityReport {
    pub liquidity_score: f64,
    pub liquidity_reasoning: String,
    pub market_activity_summary: String,
}

/// A single recorded sale of a similar domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    pub domain: String,
    pub price_usd: f64,
    pub date: String,
}

/// Comparable sales found for the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsReport {
    pub comparable_sales: Vec<ComparableSale>,
    pub analysis_summary: String,
}

/// Typed findings of one analyst.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Findings {
    OnChain(OnChainReport),
    Web2Authority(Web2Report),
    MarketIntel(MarketIntelReport),
    LiveMomentum(MomentumReport),
    LiquidityPredictor(LiquidityReport),
    ComparableSales(CompsReport),
}

impl Findings {
    /// The analyst kind these findings belong to.
    pub fn kind(&self) -> AnalystKind {
        match self {
            Findings::OnChain(_) => AnalystKind::OnChain,
            Findings::Web2Authority(_) => AnalystKind::Web2Authority,
            Findings::MarketIntel(_) => AnalystKind::MarketIntel,
            Findings::LiveMomentum(_) => AnalystKind::LiveMomentum,
            Findings::LiquidityPredictor(_) => AnalystKind::LiquidityPredictor,
            Findings::ComparableSales(_) => AnalystKind::ComparableSales,
        }
    }

    /// Value of a named score field, if these findings declare it.
    pub fn score(&self, field: &str) -> Option<f64> {
        match (self, field) {
            (Findings::OnChain(r), "on_chain_health_score") => Some(r.on_chain_health_score),
            (Findings::OnChain(r), "liquidity_score") => Some(r.liquidity_score),
            (Findings::Web2Authority(r), "seo_authority_score") => Some(r.seo_authority_score),
            (Findings::Web2Authority(r), "traffic_score") => Some(r.traffic_score),
            (Findings::MarketIntel(r), "brandability_score") => Some(r.brandability_score),
            (Findings::MarketIntel(r), "market_trend_score") => Some(r.market_trend_score),
            (Findings::LiveMomentum(r), "momentum_score") => Some(r.momentum_score),
            (Findings::LiquidityPredictor(r), "liquidity_score") => Some(r.liquidity_score),
            _ => None,
        }
    }

    /// Check every declared score against its range.
    pub fn check_ranges(&self) -> Result<(), String> {
        for field in self.kind().score_fields() {
            let Some(value) = self.score(field.name) else {
                continue;
            };
            if !value.is_finite() || value < field.min || value > field.max {
                return Err(format!(
                    "{} = {} is outside [{}, {}]",
                    field.name, value, field.min, field.max
                ));
            }
        }
        Ok(())
    }

    /// Free-text reasoning fields, labelled, for rendering.
    pub fn narrative(&self) -> Vec<(&'static str, &str)> {
        match self {
            Findings::OnChain(r) => vec![
                ("On-chain health", r.on_chain_health_reasoning.as_str()),
                ("Liquidity", r.liquidity_reasoning.as_str()),
            ],
            Findings::Web2Authority(r) => vec![
                ("SEO authority", r.seo_authority_reasoning.as_str()),
                ("Traffic", r.traffic_reasoning.as_str()),
            ],
            Findings::MarketIntel(r) => vec![
                ("Brandability", r.brandability_reasoning.as_str()),
                ("Market trend", r.market_trend_reasoning.as_str()),
                ("Summary", r.analyst_summary.as_str()),
            ],
            Findings::LiveMomentum(r) => vec![("Reasoning", r.reasoning.as_str())],
            Findings::LiquidityPredictor(r) => vec![
                ("Liquidity", r.liquidity_reasoning.as_str()),
                ("Market activity", r.market_activity_summary.as_str()),
            ],
            Findings::ComparableSales(r) => vec![("Summary", r.analysis_summary.as_str())],
        }
    }
}

/// Why an analyst produced no findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// The analyst ran but found nothing about the subject.
    NoData,
    /// The analyst errored, panicked or timed out.
    Rejected,
}

/// Result of one analyst as it appears in the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PartialReport {
    Success {
        agent_name: String,
        findings: Findings,
    },
    Failure {
        agent_name: String,
        cause: FailureCause,
        reason: String,
    },
}

impl PartialReport {
    /// Wrap findings from the named analyst.
    pub fn success(agent_name: impl Into<String>, findings: Findings) -> Self {
        PartialReport::Success {
            agent_name: agent_name.into(),
            findings,
        }
    }

    /// Build a failure placeholder.
    pub fn failure(agent_name: impl Into<String>, cause: FailureCause, reason: impl Into<String>) -> Self {
        PartialReport::Failure {
            agent_name: agent_name.into(),
            cause,
            reason: reason.into(),
        }
    }

    pub fn agent_name(&self) -> &str {
        match self {
            PartialReport::Success { agent_name, .. } | PartialReport::Failure { agent_name, .. } => {
                agent_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PartialReport::Success { .. })
    }

    pub fn findings(&self) -> Option<&Findings> {
        match self {
            PartialReport::Success { findings, .. } => Some(findings),
            PartialReport::Failure { .. } => None,
        }
    }

    /// Score value, or `None` for failures and undeclared fields.
    pub fn score(&self, field: &str) -> Option<f64> {
        self.findings().and_then(|f| f.score(field))
    }
}

/// Metadata about the valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
    /// Version label of the weight table used.
    pub weights_version: String,
    /// Model that wrote the summary.
    pub narrator_model: String,
    /// Number of analysts that produced findings.
    pub analysts_succeeded: usize,
    /// Number of analysts replaced by failure placeholders.
    pub analysts_failed: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete valuation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    /// The analyzed domain.
    pub domain_name: String,
    /// Weighted composite score, 0-100.
    pub composite_score: u8,
    /// Narrative summary.
    pub summary: String,
    /// Normalised (0-100) score per weight-table entry.
    pub scores: BTreeMap<String, f64>,
    /// Every analyst's partial report, keyed by report name.
    pub deep_dive: BTreeMap<String, PartialReport>,
    pub metadata: ReportMetadata,
}
