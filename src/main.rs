//! # Competitor Tracker
//!
//! Discovers recently published articles from a set of organizations and
//! writes them out as a JSON record set and a Markdown report.
//!
//! ## Features
//!
//! - Tries each target's structured feeds (RSS 2.0, RSS 1.0, Atom) first
//! - Falls back to heuristic HTML scraping when no feed yields titled items
//! - Normalizes every record to one canonical schema with provenance
//! - Spaces requests apart with jittered pacing
//!
//! ## Usage
//!
//! ```sh
//! competitor_tracker -c targets.yaml -j ./reports -m ./reports
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Configuration**: Load targets from a file or the built-in presets
//! 2. **Resolution**: For each target, walk feeds then pages until one yields records
//! 3. **Normalization**: Absolutize links, clean descriptions, attach provenance
//! 4. **Output**: Write the JSON record set and the Markdown report

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod normalize;
mod orchestrator;
mod outputs;
mod scrapers;
mod utils;

use cli::Cli;
use config::TrackerConfig;
use fetch::{HttpFetcher, Paced};
use models::CanonicalArticle;
use outputs::{json, markdown};
use utils::{ensure_writable_dir, report_date};

/// Upper bound of the random delay added on top of the pacing interval.
const PACE_JITTER: Duration = Duration::from_millis(250);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("competitor_tracker starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, ?args.config, "Parsed CLI arguments");

    // ---- Load targets ----
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path).await?,
        None => {
            info!("No config given; using built-in targets");
            TrackerConfig::builtin()
        }
    };
    if let Some(pace_ms) = args.pace_ms {
        config.settings.pace_ms = pace_ms;
    }
    let targets = config.targets(&args.targets)?;
    info!(
        targets = targets.len(),
        pace_ms = config.settings.pace_ms,
        "Configuration ready"
    );

    // Early check: ensure output dirs are writable
    for dir in [&args.json_output_dir, &args.markdown_output_dir] {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Resolve every target ----
    let fetcher = Paced::new(
        HttpFetcher::new(&config.settings.user_agent)?,
        config.settings.pace(),
        PACE_JITTER,
    );
    let reports = orchestrator::resolve_all(&fetcher, &targets, &config.settings.timeouts()).await;

    for report in &reports {
        match &report.resolved_by {
            Some(provenance) => info!(
                competitor = %report.target,
                count = report.articles.len(),
                source = %provenance.tag(&report.target),
                "Target resolved"
            ),
            None => warn!(
                competitor = %report.target,
                failures = report.diagnostics.len(),
                "Target produced no articles"
            ),
        }
    }

    let articles: Vec<CanonicalArticle> = reports
        .iter()
        .flat_map(|r| r.articles.iter().cloned())
        .collect();
    info!(count = articles.len(), "Total articles found");

    // ---- Outputs ----
    let date = report_date();
    if let Err(e) = json::write_articles(&articles, &args.json_output_dir, &date).await {
        error!(error = %e, "Failed to write JSON");
    }
    let generated_at = Local::now();
    if let Err(e) =
        markdown::write_report(&reports, &args.markdown_output_dir, &date, generated_at).await
    {
        error!(error = %e, "Failed writing Markdown");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
