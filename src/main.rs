//! Kumo-Harvest main entry point
//!
//! This is the command-line interface for the Kumo-Harvest site crawler.

use clap::Parser;
use kumo_harvest::config::{load_config_with_hash, validate, CrawlConfig};
use kumo_harvest::crawl_site;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Kumo-Harvest: A respectful site crawler
///
/// Kumo-Harvest crawls a website starting from a seed URL while honoring
/// robots.txt rules, pacing its requests, and holding to a fixed page
/// budget. Every crawled page is emitted as a structured JSON record.
#[derive(Parser, Debug)]
#[command(name = "kumo-harvest")]
#[command(version = "0.1.0")]
#[command(about = "A respectful site crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum number of pages to crawl (overrides the config file)
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Render pages in a headless browser before extraction
    #[arg(long)]
    render_js: bool,

    /// Write page records to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, or fall back to defaults
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            CrawlConfig::default()
        }
    };

    // Apply command-line overrides, then re-validate
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    if cli.render_js {
        config.render_js = true;
    }
    validate(&config)?;

    handle_crawl(config, &cli.seed, cli.output.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Diagnostics go to stderr so that stdout stays clean for JSON records.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo_harvest=info,warn"),
            1 => EnvFilter::new("kumo_harvest=debug,info"),
            2 => EnvFilter::new("kumo_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the main crawl operation: runs the crawl and writes the records
async fn handle_crawl(
    config: CrawlConfig,
    seed: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    tracing::info!(
        "Starting crawl of {} (max pages: {}, concurrency: {}, render-js: {})",
        seed,
        config.max_pages,
        config.max_concurrent_crawls,
        config.render_js
    );

    let records = match crawl_site(config, seed).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let json = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!(
                "✓ Wrote {} page records to {}",
                records.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}
