//! Catalog-Harvest main entry point
//!
//! This is the command-line interface for the two-stage catalog harvester.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, validate, Config};
use catalog_harvest::harvest::Coordinator;
use catalog_harvest::output::{print_summary, HarvestSummary};
use catalog_harvest::work::ListingPage;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Catalog-Harvest: a polite catalog harvester
///
/// Catalog-Harvest discovers product links across a range of listing pages
/// and then extracts structured product details from every link, pacing
/// and rotating its requests and retrying failed pages in later rounds.
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite catalog harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Validate config and show the planned work without fetching anything
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    stage: Stage,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Discover product links on the listing pages
    Links,

    /// Extract product details for every discovered link
    Details,

    /// Run link discovery, then detail extraction
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_ref())?;

    if cli.dry_run {
        handle_dry_run(&config, cli.stage)?;
        return Ok(());
    }

    let coordinator = Coordinator::new(config).context("Failed to set up the harvester")?;

    let summaries = match cli.stage {
        Stage::Links => vec![coordinator
            .discover_links()
            .await
            .context("Link discovery failed")?],
        Stage::Details => vec![coordinator
            .harvest_details()
            .await
            .context("Detail harvesting failed")?],
        Stage::All => coordinator.run_all().await.context("Harvest failed")?,
    };

    if !cli.quiet {
        print_summaries(&summaries);
    }

    Ok(())
}

/// Loads the configuration file, or the validated defaults without one
fn load(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            let config = Config::default();
            validate(&config).context("Built-in configuration is invalid")?;
            Ok(config)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn print_summaries(summaries: &[HarvestSummary]) {
    for (index, summary) in summaries.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print_summary(summary);
    }
}

/// Handles the --dry-run mode: shows the resolved configuration and planned work
fn handle_dry_run(config: &Config, stage: Stage) -> anyhow::Result<()> {
    println!("=== Catalog-Harvest Dry Run ===\n");

    println!("HTTP:");
    println!("  Request timeout: {}ms", config.http.request_timeout_ms);
    println!("  Connect timeout: {}ms", config.http.connect_timeout_ms);

    println!("\nPacing:");
    println!(
        "  Before attempt: {}-{}ms",
        config.pacing.attempt_delay_min_ms, config.pacing.attempt_delay_max_ms
    );
    println!(
        "  Before retry: {}-{}ms",
        config.pacing.retry_delay_min_ms, config.pacing.retry_delay_max_ms
    );

    println!("\nUser Agents ({}):", config.identity.user_agents.len());
    for agent in &config.identity.user_agents {
        println!("  - {}", agent);
    }

    if matches!(stage, Stage::Links | Stage::All) {
        let discovery = &config.discovery;
        let base_url = Url::parse(&discovery.base_url).context("Invalid base URL")?;
        let pages = ListingPage::range(&base_url, discovery.first_page, discovery.last_page);

        println!("\nLink Discovery:");
        println!("  Listing pages: {}", pages.len());
        if let (Some(first), Some(last)) = (pages.first(), pages.last()) {
            println!("    * {}", first.url);
            if pages.len() > 1 {
                println!("    ...");
                println!("    * {}", last.url);
            }
        }
        println!(
            "  Workers: {} (retry rounds: {})",
            discovery.pool_size, discovery.retry_pool_size
        );
        println!(
            "  Attempts per page: {} (retry rounds: {})",
            discovery.max_attempts, discovery.retry_max_attempts
        );
        println!("  Max rounds: {}", discovery.max_rounds);
        println!("  Output: {}", discovery.output_path);
    }

    if matches!(stage, Stage::Details | Stage::All) {
        let details = &config.details;
        println!("\nDetail Extraction:");
        println!("  Input: {}", details.input_path);
        println!(
            "  Workers: {} (retry rounds: {})",
            details.pool_size, details.retry_pool_size
        );
        println!(
            "  Attempts per link: {} (retry rounds: {})",
            details.max_attempts, details.retry_max_attempts
        );
        println!("  Max rounds: {}", details.max_rounds);
        println!("  Output: {}", details.output_path);
        if let Some(failed_path) = &details.failed_path {
            println!("  Failed links: {}", failed_path);
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}
