//! # News Tracker
//!
//! Fetches recent headlines for a set of news categories from the GNews API
//! and reports what they are about: the most frequent words, the busiest
//! sources, the sentiment of each headline and the people, organizations and
//! places mentioned.
//!
//! ## Usage
//!
//! ```sh
//! GNEWS_API_KEY=... news_tracker --categories business,technology -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: One GNews request per category (concurrent, retried, cached)
//! 2. **Aggregation**: Merge, deduplicate and normalize the article text
//! 3. **Analytics**: Word and source counts, sentiment, named entities
//! 4. **Output**: Markdown report (stdout or file) and optional JSON report

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analytics;
mod api;
mod cache;
mod cli;
mod config;
mod models;
mod nlp;
mod outputs;
mod pipeline;
mod utils;

use analytics::AnalyticsService;
use api::{GNewsClient, RetryFetch};
use cache::CachedFetcher;
use cli::Cli;
use config::load_config;
use nlp::{MorphologyPipeline, TextNormalizer};
use outputs::{json, markdown};
use pipeline::{Dashboard, PipelineOutcome};
use utils::ensure_writable_dir;

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
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_tracker starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.categories, ?args.json_output_dir, ?args.markdown_output_dir, "Parsed CLI arguments");

    let mut config = load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    let request = args.fetch_request(&config);

    // Early check: ensure output dirs are writable
    for dir in [&args.json_output_dir, &args.markdown_output_dir]
        .into_iter()
        .flatten()
    {
        ensure_writable_dir(dir).await?;
    }

    // ---- Assemble the pipeline ----
    let client = GNewsClient::new(&config.gnews)?;
    let fetcher = CachedFetcher::new(
        RetryFetch::new(client, config.gnews.max_retries, StdDuration::from_secs(1)),
        StdDuration::from_secs(config.gnews.cache_ttl_secs),
        config.gnews.cache_capacity,
    );
    let normalizer = if config.analytics.second_pass {
        TextNormalizer::with_second_pass(Arc::new(MorphologyPipeline))
    } else {
        TextNormalizer::first_pass_only()
    };
    let dashboard = Dashboard::new(
        fetcher,
        normalizer,
        AnalyticsService::from_settings(&config.analytics),
        config.analytics.clone(),
        config.gnews.concurrency,
    );

    // ---- Refresh and report ----
    match dashboard.refresh(&request).await {
        PipelineOutcome::Report(report) => {
            match &args.markdown_output_dir {
                Some(dir) => {
                    markdown::write_report(&report, dir).await?;
                }
                None => println!("{}", markdown::report_to_markdown(&report)),
            }
            if let Some(dir) = &args.json_output_dir {
                json::write_report(&report, dir).await?;
            }
            info!(
                articles = report.articles.len(),
                failed_categories = report.failures.len(),
                "Report complete"
            );
        }
        PipelineOutcome::Notice { notice, failures } => {
            warn!(%notice, failed_categories = failures.len(), "No report produced");
            println!("{}", markdown::notice_to_markdown(notice, &failures));
        }
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
