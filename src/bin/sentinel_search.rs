//! `sentinel-search` command-line binary.
//!
//! Runs one aggregated search and prints the merged results, either as text
//! or as the JSON-serialised response. All tracing output goes to stderr so
//! that stdout stays clean for `--json` consumers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use resilient_search::{SearchKind, SearchOptions};
use sentinel_search::{AppConfig, build_orchestrator, render};

/// Exit code when every provider failed.
const EXIT_ALL_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "sentinel-search", version)]
#[command(about = "Search several web providers at once and merge the results")]
struct Cli {
    /// Search query (multiple words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,

    /// Vertical to search: general, news, images, videos, academic
    #[arg(long, short, default_value = "general")]
    kind: SearchKind,

    /// Results requested from each provider (1-50)
    #[arg(long, short = 'n', default_value_t = 5)]
    count: usize,

    /// Cap on the merged result list
    #[arg(long)]
    max_results: Option<usize>,

    /// Overall deadline in seconds; shortens the per-provider timeout
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Config file (default: ~/.config/sentinel-search/config.toml)
    #[arg(long, short, env = "SENTINEL_SEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Print the full response as JSON
    #[arg(long)]
    json: bool,

    /// Skip the cache lookup
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("sentinel_search=info,resilient_search=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let orchestrator = build_orchestrator(&config).context("failed to set up providers")?;

    let deadline = cli
        .deadline_secs
        .map(Duration::try_from_secs_f64)
        .transpose()
        .context("--deadline-secs must be a non-negative number")?;

    let opts = SearchOptions {
        deadline,
        max_results: cli.max_results,
        bypass_cache: cli.no_cache,
    };

    let query = cli.query.join(" ");
    let response = orchestrator
        .search(&query, cli.kind, cli.count, opts)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "search rejected");
            anyhow::anyhow!("search failed: {e}")
        })?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("failed to serialise response")?
        );
    } else {
        print!(
            "{}",
            render::render_text(&response, &orchestrator.provider_ids())
        );
    }

    if response.all_failed() {
        tracing::warn!("every provider failed");
        return Ok(ExitCode::from(EXIT_ALL_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}
