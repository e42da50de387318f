//! Crawler module for page fetching and run orchestration
//!
//! This module contains the extraction pipeline, including:
//! - The frontier of page requests and pagination
//! - HTTP fetching under a connection bound with proxy rotation
//! - Retry scheduling with exponential backoff
//! - The driver that folds page results into the run state

mod backoff;
mod coordinator;
mod fetcher;
mod frontier;
mod proxy;

pub use backoff::ExponentialBackoff;
pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, FetchError, RawPage, RequestExecutor};
pub use frontier::{seed_requests, Frontier, Next, PageRequest, RequestKind};
pub use proxy::ProxyPool;

use crate::config::Config;
use crate::domain::DomainRegistry;
use crate::output::{self, RunSummary};
use crate::SiftError;
use chrono::Local;
use tokio::sync::watch;

/// Runs a complete extraction
///
/// This is the main entry point for a run. It will:
/// 1. Resolve every input into its page-1 request
/// 2. Build the request executor
/// 3. Open the configured writers
/// 4. Drive the frontier until a termination cause is reached
/// 5. Close the writers and summarise the run
///
/// Input resolution happens before any file is created, so a configuration
/// error leaves no empty output behind.
///
/// # Arguments
///
/// * `config` - The validated run configuration
/// * `config_hash` - Identity of the configuration, quoted in the summary
/// * `shutdown` - Set to true to cancel the run
///
/// # Example
///
/// ```no_run
/// use listing_sift::config::load_config_with_hash;
/// use listing_sift::crawler::run_pipeline;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("sift.toml"))?;
/// let (_tx, rx) = tokio::sync::watch::channel(false);
/// let summary = run_pipeline(&config, &hash, rx).await?;
/// println!("{} records", summary.records_emitted);
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(
    config: &Config,
    config_hash: &str,
    shutdown: watch::Receiver<bool>,
) -> Result<RunSummary, SiftError> {
    let started_at = Local::now();

    let registry = DomainRegistry::standard();
    let seeds = seed_requests(config, &registry)?;
    let executor = RequestExecutor::new(config)?;
    let sinks = output::open_sinks(&config.output, started_at)?;

    tracing::info!(
        "Starting run: {} inputs, up to {} items, {} workers",
        seeds.len(),
        config.scraper.max_items,
        config.scraper.concurrency
    );

    let coordinator = Coordinator::new(config, executor, seeds, sinks);
    let (state, report) = coordinator.run(shutdown).await;

    Ok(RunSummary::from_run(&state, report, config_hash, started_at))
}
