//! Command-line interface definitions for the competitor tracker.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Every option has a default or an environment variable fallback, so the
//! binary runs with no arguments at all against the built-in targets.

use clap::Parser;

/// Command-line arguments for the competitor tracker.
///
/// # Examples
///
/// ```sh
/// # Built-in targets, reports written to ./reports
/// competitor_tracker
///
/// # Targets from a config file, separate output directories
/// competitor_tracker -c targets.yaml -j ./json -m ./markdown
///
/// # Only one configured target, faster pacing
/// competitor_tracker -t OpenAI --pace-ms 500
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON article file
    #[arg(short, long, env = "TRACKER_JSON_DIR", default_value = "reports")]
    pub json_output_dir: String,

    /// Output directory for the Markdown report
    #[arg(short, long, env = "TRACKER_MARKDOWN_DIR", default_value = "reports")]
    pub markdown_output_dir: String,

    /// Optional path to a YAML (.yaml/.yml) or JSON target config
    #[arg(short, long, env = "TRACKER_CONFIG")]
    pub config: Option<String>,

    /// Only scrape these targets (repeatable, case-insensitive)
    #[arg(short, long = "target")]
    pub targets: Vec<String>,

    /// Minimum milliseconds between requests, overriding the config
    #[arg(long)]
    pub pace_ms: Option<u64>,
}
