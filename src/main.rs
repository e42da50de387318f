//! Listing-Sift main entry point
//!
//! This is the command-line interface for the Listing-Sift extractor.

use anyhow::Context;
use clap::Parser;
use listing_sift::config::{load_config_with_hash, validate, Config, OutputFormat};
use listing_sift::crawler::{run_pipeline, seed_requests, RequestKind};
use listing_sift::output::{generate_markdown_summary, print_summary, ExitStatus};
use listing_sift::DomainRegistry;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Listing-Sift: a marketplace listing extractor
///
/// Listing-Sift fetches eBay search, category and listing pages across the
/// regional storefronts, normalises every listing into one record schema and
/// writes the records as JSON, CSV, XML or a spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "listing-sift")]
#[command(version = "1.0.0")]
#[command(about = "A marketplace listing extractor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the resolved inputs without fetching
    #[arg(long)]
    dry_run: bool,

    /// Override the maximum number of records
    #[arg(long, value_name = "N")]
    max_items: Option<u32>,

    /// Override the output formats (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "FORMATS")]
    formats: Option<Vec<OutputFormat>>,

    /// Replace the proxy pool (repeatable)
    #[arg(long, value_name = "URL")]
    proxy: Vec<String>,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let status = match run(cli).await {
        Ok(status) => status,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitStatus::Failure
        }
    };

    std::process::exit(status.code());
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_sift=info,warn"),
            1 => EnvFilter::new("listing_sift=debug,info"),
            2 => EnvFilter::new("listing_sift=trace,debug"),
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

async fn run(cli: Cli) -> anyhow::Result<ExitStatus> {
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitStatus::Success);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight requests");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = run_pipeline(&config, &config_hash, shutdown_rx)
        .await
        .context("run failed")?;

    print_summary(&summary);

    if let Some(path) = &config.output.summary_path {
        match generate_markdown_summary(&summary, Path::new(path)) {
            Ok(()) => tracing::info!("Summary written to {}", path),
            Err(e) => tracing::error!("Failed to write summary to {}: {}", path, e),
        }
    }

    Ok(summary.exit_status())
}

/// Applies command-line overrides on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(max_items) = cli.max_items {
        config.scraper.max_items = max_items;
    }
    if let Some(formats) = &cli.formats {
        config.output.formats = formats.clone();
        config.output.dedup_formats();
    }
    if !cli.proxy.is_empty() {
        config.proxies.pool = cli.proxy.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Listing-Sift Dry Run ===\n");

    println!("Limits:");
    println!("  Max items: {}", config.scraper.max_items);
    println!("  Concurrency: {}", config.scraper.concurrency);
    println!("  Max pages per input: {}", config.scraper.max_pages_per_input);
    println!(
        "  Retry: {} attempts, {}ms base delay",
        config.retry.max_attempts, config.retry.base_delay_ms
    );
    println!("  Proxies: {}", config.proxies.pool.len());

    let formats: Vec<String> = config.output.formats.iter().map(|f| f.to_string()).collect();
    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Formats: {}", formats.join(", "));

    let seeds = seed_requests(config, &DomainRegistry::standard())?;
    println!("\nInputs ({}):", seeds.len());
    for seed in &seeds {
        let kind = match seed.kind {
            RequestKind::Search => "search",
            RequestKind::Listing => "listing",
        };
        println!("  [{}] {} {}", seed.region(), kind, seed.url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}
