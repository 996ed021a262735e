//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// DomainLens - multi-analyst domain name valuation
///
/// Runs on-chain, SEO, market, momentum, liquidity and comparable-sales
/// analysts concurrently and combines their findings into one weighted,
/// narrated report.
///
/// Examples:
///   domainlens --domain crypto.ai
///   domainlens --domain crypto.ai --format json --output crypto.json
///   domainlens --domain crypto.ai --dry-run
///   domainlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Domain name to value (e.g., crypto.ai)
    #[arg(short, long, value_name = "DOMAIN", required_unless_present = "init_config")]
    pub domain: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .domainlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting (domainlens_report.md).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Per-analyst deadline in seconds
    ///
    /// An analyst that runs longer is recorded as failed. Must cover the
    /// configured request timeouts. Default: from config or 720s.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Model used to write the executive summary
    #[arg(long, value_name = "MODEL", env = "DOMAINLENS_NARRATOR_MODEL")]
    pub narrator_model: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: print the analyst roster and weight table, make no calls
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .domainlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The domain argument, empty if not set (should be validated first).
    pub fn domain_name(&self) -> &str {
        self.domain.as_deref().unwrap_or("").trim()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let domain = self.domain_name();
        if domain.is_empty() {
            return Err("Domain must not be empty".to_string());
        }
        if domain.contains(char::is_whitespace) || domain.contains('/') {
            return Err(format!("Invalid domain name: '{}'", domain));
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `general.verbose` setting; `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
