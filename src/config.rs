//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.domainlens.toml` files, and turns the analyst roster and weight table
//! into validated runtime values.

use crate::analysis::weights::{WeightEntry, WeightTable};
use crate::error::ConfigError;
use crate::models::AnalystKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".domainlens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analyst roster and task settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Model endpoints, one per role.
    #[serde(default)]
    pub llm: LlmConfig,

    /// External data sources.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Composite score weighting.
    #[serde(default)]
    pub weights: WeightsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "domainlens_report.md".to_string()
}

/// Analyst roster settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Analysts to run, by name. Order is the submission order.
    #[serde(default = "default_analysts")]
    pub analysts: Vec<String>,

    /// Deadline for each analyst task in seconds.
    ///
    /// Must cover the longest chain of sequential requests an analyst makes.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_seconds: u64,

    /// Overrides for the "no data" reason, keyed by agent name.
    #[serde(default)]
    pub default_reasons: BTreeMap<String, String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            analysts: default_analysts(),
            task_timeout_seconds: default_task_timeout(),
            default_reasons: BTreeMap::new(),
        }
    }
}

fn default_analysts() -> Vec<String> {
    AnalystKind::ALL
        .iter()
        .map(|kind| kind.key().to_string())
        .collect()
}

fn default_task_timeout() -> u64 {
    720
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Ask the endpoint for a JSON object response.
    #[serde(default)]
    pub json_mode: bool,

    /// Enable provider-side live X search (xAI only).
    #[serde(default)]
    pub live_search: bool,
}

impl EndpointConfig {
    fn new(base_url: &str, model: &str, api_key_env: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key_env: api_key_env.to_string(),
            temperature: default_temperature(),
            timeout_seconds: default_request_timeout(),
            json_mode: false,
            live_search: false,
        }
    }

    /// Read the API key from the environment.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout() -> u64 {
    90
}

const TOGETHER_URL: &str = "https://api.together.xyz/v1";
const TOGETHER_MODEL: &str = "meta-llama/Llama-3-70b-chat-hf";

/// Model endpoints by role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Scores pre-processed data summaries.
    #[serde(default = "default_fast")]
    pub fast: EndpointConfig,

    /// Structures free-text research into JSON.
    #[serde(default = "default_formatter")]
    pub formatter: EndpointConfig,

    /// Web research.
    #[serde(default = "default_research")]
    pub research: EndpointConfig,

    /// X/Twitter research.
    #[serde(default = "default_social")]
    pub social: EndpointConfig,

    /// Event-stream momentum analysis.
    #[serde(default = "default_momentum")]
    pub momentum: EndpointConfig,

    /// Writes the final summary.
    #[serde(default = "default_narrator")]
    pub narrator: EndpointConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            formatter: default_formatter(),
            research: default_research(),
            social: default_social(),
            momentum: default_momentum(),
            narrator: default_narrator(),
        }
    }
}

fn default_fast() -> EndpointConfig {
    EndpointConfig {
        json_mode: true,
        ..EndpointConfig::new(TOGETHER_URL, TOGETHER_MODEL, "TOGETHER_API_KEY")
    }
}

fn default_formatter() -> EndpointConfig {
    default_fast()
}

fn default_narrator() -> EndpointConfig {
    default_fast()
}

fn default_research() -> EndpointConfig {
    EndpointConfig {
        timeout_seconds: 300,
        ..EndpointConfig::new(
            "https://api.perplexity.ai",
            "sonar-reasoning-pro",
            "PERPLEXITY_API_KEY",
        )
    }
}

fn default_social() -> EndpointConfig {
    EndpointConfig {
        timeout_seconds: 300,
        live_search: true,
        ..EndpointConfig::new("https://api.x.ai/v1", "grok-4", "XAI_API_KEY")
    }
}

fn default_momentum() -> EndpointConfig {
    EndpointConfig::new(
        "https://generativelanguage.googleapis.com/v1beta/openai",
        "gemini-flash-latest",
        "GEMINI_API_KEY",
    )
}

/// External data source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Doma GraphQL endpoint.
    #[serde(default = "default_doma_graphql")]
    pub doma_graphql_url: String,

    /// Doma event poll endpoint.
    #[serde(default = "default_doma_poll")]
    pub doma_poll_url: String,

    /// Environment variable holding the Doma API key.
    #[serde(default = "default_doma_key_env")]
    pub doma_api_key_env: String,

    /// Number of recent events to fetch for momentum analysis.
    #[serde(default = "default_poll_limit")]
    pub poll_limit: usize,

    /// SE Ranking API base URL.
    #[serde(default = "default_seranking_url")]
    pub seranking_url: String,

    /// Environment variable holding the SE Ranking API key.
    #[serde(default = "default_seranking_key_env")]
    pub seranking_api_key_env: String,

    /// Pause between SE Ranking requests in milliseconds.
    #[serde(default = "default_seranking_delay")]
    pub seranking_delay_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// Directory of historical sales CSV exports.
    #[serde(default)]
    pub sales_corpus_dir: Option<String>,

    /// Maximum number of historical sales records kept.
    #[serde(default = "default_sales_sample")]
    pub sales_sample_size: usize,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            doma_graphql_url: default_doma_graphql(),
            doma_poll_url: default_doma_poll(),
            doma_api_key_env: default_doma_key_env(),
            poll_limit: default_poll_limit(),
            seranking_url: default_seranking_url(),
            seranking_api_key_env: default_seranking_key_env(),
            seranking_delay_ms: default_seranking_delay(),
            timeout_seconds: default_request_timeout(),
            sales_corpus_dir: None,
            sales_sample_size: default_sales_sample(),
        }
    }
}

fn default_doma_graphql() -> String {
    "https://api-testnet.doma.xyz/graphql".to_string()
}

fn default_doma_poll() -> String {
    "https://api-testnet.doma.xyz/v1/poll".to_string()
}

fn default_doma_key_env() -> String {
    "DOMA_API_KEY".to_string()
}

fn default_poll_limit() -> usize {
    1000
}

fn default_seranking_url() -> String {
    "https://api.seranking.com/v1".to_string()
}

fn default_seranking_key_env() -> String {
    "SE_RANKING_API_KEY".to_string()
}

fn default_seranking_delay() -> u64 {
    500
}

fn default_sales_sample() -> usize {
    5000
}

/// Versioned weight table as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Label recorded in report metadata.
    #[serde(default = "default_weights_version")]
    pub version: String,

    /// Score entries; weights must sum to 1.0.
    #[serde(default = "default_weight_entries")]
    pub entries: Vec<WeightEntry>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            version: default_weights_version(),
            entries: default_weight_entries(),
        }
    }
}

fn default_weights_version() -> String {
    "2025.4".to_string()
}

fn default_weight_entries() -> Vec<WeightEntry> {
    vec![
        WeightEntry::new("market_trend", "market_intel_report", "market_trend_score", 0.25),
        WeightEntry::new("brandability", "market_intel_report", "brandability_score", 0.20),
        WeightEntry::new("on_chain_health", "on_chain_report", "on_chain_health_score", 0.20),
        WeightEntry::new("predicted_liquidity", "liquidity_report", "liquidity_score", 0.15),
        WeightEntry::new("seo_authority", "web2_report", "seo_authority_score", 0.10),
        WeightEntry::new("traffic", "web2_report", "traffic_score", 0.05),
        WeightEntry::new("live_momentum", "momentum_report", "momentum_score", 0.05),
        WeightEntry::new("on_chain_liquidity", "on_chain_report", "liquidity_score", 0.0),
    ]
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>, ConfigError> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(timeout) = args.timeout {
            self.analysis.task_timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref model) = args.narrator_model {
            self.llm.narrator.model = model.clone();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Resolve the configured analyst roster.
    pub fn roster(&self) -> Result<Vec<AnalystKind>, ConfigError> {
        if self.analysis.analysts.is_empty() {
            return Err(ConfigError::NoAnalysts);
        }

        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(self.analysis.analysts.len());

        for name in &self.analysis.analysts {
            let kind = AnalystKind::from_name(name)
                .ok_or_else(|| ConfigError::UnknownAnalyst(name.clone()))?;
            if !seen.insert(kind) {
                return Err(ConfigError::DuplicateAnalyst(kind.agent_name().to_string()));
            }
            roster.push(kind);
        }

        Ok(roster)
    }

    /// Build the validated weight table for a roster.
    pub fn weight_table(&self, roster: &[AnalystKind]) -> Result<WeightTable, ConfigError> {
        WeightTable::new(
            self.weights.version.clone(),
            self.weights.entries.clone(),
            roster,
        )
    }

    /// Worst-case seconds an analyst spends waiting on its sequential requests.
    pub fn call_chain_seconds(&self, kind: AnalystKind) -> u64 {
        let llm = &self.llm;
        let source = self.sources.timeout_seconds;

        match kind {
            AnalystKind::OnChain => source + llm.fast.timeout_seconds,
            AnalystKind::Web2Authority => {
                // Three SE Ranking requests with a pause between each.
                3 * source
                    + (2 * self.sources.seranking_delay_ms).div_ceil(1000)
                    + llm.fast.timeout_seconds
            }
            AnalystKind::MarketIntel => {
                llm.social.timeout_seconds
                    + llm.formatter.timeout_seconds
                    + llm.research.timeout_seconds
            }
            AnalystKind::LiveMomentum => source + llm.momentum.timeout_seconds,
            AnalystKind::LiquidityPredictor | AnalystKind::ComparableSales => {
                llm.research.timeout_seconds + llm.formatter.timeout_seconds
            }
        }
    }

    /// Validated per-task deadline for a roster.
    pub fn task_timeout(&self, roster: &[AnalystKind]) -> Result<Duration, ConfigError> {
        let timeout = self.analysis.task_timeout_seconds;
        if timeout == 0 {
            return Err(ConfigError::ZeroTaskTimeout);
        }

        let slowest = roster
            .iter()
            .map(|kind| (*kind, self.call_chain_seconds(*kind)))
            .max_by_key(|(_, seconds)| *seconds);

        if let Some((kind, required)) = slowest {
            if timeout < required {
                return Err(ConfigError::TaskTimeoutTooShort {
                    timeout,
                    analyst: kind.agent_name().to_string(),
                    required,
                });
            }
        }

        Ok(Duration::from_secs(timeout))
    }

    /// "No data" reason for an analyst, honouring overrides.
    pub fn default_reason(&self, kind: AnalystKind) -> String {
        self.analysis
            .default_reasons
            .get(kind.agent_name())
            .cloned()
            .unwrap_or_else(|| kind.default_reason().to_string())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
