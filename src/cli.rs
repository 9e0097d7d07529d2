//! Command-line interface definitions for News Tracker.
//!
//! Flags override values from the config file. The API key can also come
//! from the `GNEWS_API_KEY` environment variable.

use crate::config::{DashboardConfig, KNOWN_CATEGORIES, clamp_page_size};
use crate::models::FetchRequest;
use clap::Parser;
use itertools::Itertools;
use tracing::warn;

/// Command-line arguments for the News Tracker application.
///
/// # Examples
///
/// ```sh
/// # General headlines, Markdown report on stdout
/// news_tracker --api-key YOUR_KEY
///
/// # Several categories with a keyword, reports written to disk
/// news_tracker --categories business,technology -q "interest rates" -j ./json -m ./markdown
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// GNews API key
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Comma-separated categories (defaults to the config file's list)
    #[arg(long, value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Free-text keyword filter
    #[arg(short, long)]
    pub query: Option<String>,

    /// Two-letter country code
    #[arg(long)]
    pub country: Option<String>,

    /// Articles per category (10 to 100)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Number of words in the frequency summary
    #[arg(long)]
    pub top_words: Option<usize>,

    /// Output directory for the JSON report
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for the Markdown report (stdout when absent)
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Skip the second, part-of-speech-aware normalization pass
    #[arg(long)]
    pub no_second_pass: bool,
}

impl Cli {
    /// Fold the flags into `config`, leaving values the flags don't set alone.
    pub fn apply_overrides(&self, config: &mut DashboardConfig) {
        if let Some(top_words) = self.top_words {
            config.analytics.top_words = top_words;
        }
        if self.no_second_pass {
            config.analytics.second_pass = false;
        }
    }

    /// The fetch request described by the flags, with `config` filling gaps.
    pub fn fetch_request(&self, config: &DashboardConfig) -> FetchRequest {
        let categories = if self.categories.is_empty() {
            config.defaults.categories.clone()
        } else {
            self.categories.clone()
        };
        let categories: Vec<String> = categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unique()
            .collect();
        for unknown in categories
            .iter()
            .filter(|c| !KNOWN_CATEGORIES.contains(&c.as_str()))
        {
            warn!(category = %unknown, "Not a known GNews category; the API may reject it");
        }
        FetchRequest {
            api_key: self.api_key.clone(),
            categories,
            query: self.query.clone(),
            country: self.country.clone().or_else(|| config.defaults.country.clone()),
            page_size: clamp_page_size(self.page_size.unwrap_or(config.defaults.page_size)),
        }
    }
}
