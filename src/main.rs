//! DomainLens - multi-analyst domain name valuation
//!
//! A CLI tool that runs specialist analysts against a domain name
//! concurrently, tolerates their individual failures, and combines their
//! findings into one weighted, narrated valuation report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid config, narrator failure, write failure, etc.)

mod analysis;
mod analysts;
mod cli;
mod config;
mod error;
mod llm;
mod models;
mod report;
mod sources;

use analysis::{Orchestrator, WeightTable};
use analysts::{build_roster, Services};
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use llm::{ChatClient, LlmNarrator};
use models::{AnalystKind, FinalReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is loaded before logging so its verbosity applies
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("DomainLens v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);
    debug!("Arguments: {:?}", args);

    match run_valuation(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Valuation failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .domainlens.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize analysts, model endpoints, and score weights.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one valuation. Returns the exit code.
async fn run_valuation(args: Args, config: Config) -> Result<i32> {
    let roster = config.roster().context("Invalid analyst roster")?;
    let table = config
        .weight_table(&roster)
        .context("Invalid weight table")?;
    let task_timeout = config
        .task_timeout(&roster)
        .context("Invalid task timeout")?;

    if args.dry_run {
        return handle_dry_run(args.domain_name(), &roster, &table);
    }

    let domain = args.domain_name().to_string();

    let services = Services::from_config(&config)?;
    let analysts = build_roster(&roster, &services);
    let narrator_client = ChatClient::new(config.llm.narrator.clone())
        .context("Failed to configure narrator model")?;
    let narrator = Arc::new(LlmNarrator::new(Arc::new(narrator_client)));

    let mut orchestrator = Orchestrator::new(analysts, table, narrator)
        .context("Invalid analyst configuration")?
        .with_task_timeout(task_timeout);
    for kind in &roster {
        orchestrator = orchestrator.with_default_reason(*kind, config.default_reason(*kind));
    }

    println!("🔎 Valuing domain: {}", domain);
    println!("   Analysts: {}", orchestrator.roster().len());
    println!("   Weights: {}", orchestrator.weight_table().version());
    println!("   Narrator: {}", config.llm.narrator.model);
    println!("   Task timeout: {}s", task_timeout.as_secs());

    let spinner = (!args.quiet).then(|| {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Running {} analysts...", roster.len()));
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let result = orchestrator.analyze(&domain).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    println!("\n📝 Generating report...");
    let output_path = PathBuf::from(&config.general.output);
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&report);
    println!(
        "\n✅ Valuation complete! Report saved to: {}",
        output_path.display()
    );

    Ok(0)
}

/// Print the headline numbers to the terminal.
fn print_summary(report: &FinalReport) {
    println!("\n📊 Valuation Summary:");
    println!("   Composite score: {}/100", report.composite_score);
    println!(
        "   Analysts: {} succeeded, {} failed",
        report.metadata.analysts_succeeded, report.metadata.analysts_failed
    );
    for (name, partial) in &report.deep_dive {
        if !partial.is_success() {
            println!("   - ⚠️  {} unavailable", name);
        }
    }
    println!("   Duration: {:.1}s", report.metadata.duration_seconds);
}

/// Handle --dry-run: print roster and weight table, exit.
fn handle_dry_run(domain: &str, roster: &[AnalystKind], table: &WeightTable) -> Result<i32> {
    println!("\n🔍 Dry run for {} (no external calls)...\n", domain);

    println!("   Analysts ({}):", roster.len());
    for kind in roster {
        println!("     🧠 {} -> {}", kind.agent_name(), kind.report_name());
    }

    println!("\n   Weight table `{}`:", table.version());
    for rule in table.entries() {
        println!(
            "     ⚖️  {:<20} {:>5.2}  {}.{}",
            rule.entry.score, rule.entry.weight, rule.entry.report, rule.entry.field
        );
    }

    println!("\n✅ Dry run complete. No analysts were run.");
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Returns the configuration and a description of where it came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, config_path.display().to_string()));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, CONFIG_FILE_NAME.to_string())),
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}
