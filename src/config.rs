//! YAML configuration.
//!
//! Every section and field is optional; anything missing takes the default
//! shown below. Command-line flags override values read from the file.
//!
//! ```yaml
//! gnews:
//!   endpoint: https://gnews.io/api/v4
//!   timeout_secs: 10
//!   max_retries: 1
//!   cache_ttl_secs: 300
//!   cache_capacity: 128
//!   concurrency: 4
//! defaults:
//!   categories: [general]
//!   page_size: 50
//!   country: null
//! analytics:
//!   top_words: 30
//!   top_sources: 20
//!   sentiment_limit: 50
//!   entity_limit: 30
//!   second_pass: true
//!   lexicon_path: null
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument, warn};

pub const DEFAULT_GNEWS_ENDPOINT: &str = "https://gnews.io/api/v4";

/// Categories offered to users. `general` maps to no topic filter.
pub const KNOWN_CATEGORIES: [&str; 9] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
    "education",
    "finance",
];

pub const MIN_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub gnews: GNewsSettings,
    pub defaults: RequestDefaults,
    pub analytics: AnalyticsSettings,
}

/// How the GNews client talks to the API.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GNewsSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
    /// Retries after the first attempt, transport errors only.
    pub max_retries: usize,
    /// Zero disables the fetch cache.
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    /// Category fetches in flight at once.
    pub concurrency: usize,
}

impl Default for GNewsSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GNEWS_ENDPOINT.to_string(),
            timeout_secs: 10,
            max_retries: 1,
            cache_ttl_secs: 300,
            cache_capacity: 128,
            concurrency: 4,
        }
    }
}

/// Request values used when the command line leaves them out.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestDefaults {
    pub categories: Vec<String>,
    pub page_size: u32,
    pub country: Option<String>,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            categories: vec!["general".to_string()],
            page_size: 50,
            country: None,
        }
    }
}

/// Limits and switches for the analytics stages.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    pub top_words: usize,
    pub top_sources: usize,
    /// Only the first this-many articles get a sentiment label.
    pub sentiment_limit: usize,
    /// Only the first this-many articles go through entity extraction.
    pub entity_limit: usize,
    /// Run the part-of-speech-aware second normalization pass.
    pub second_pass: bool,
    /// Optional YAML map of word -> weight merged into the sentiment lexicon.
    pub lexicon_path: Option<String>,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            top_words: 30,
            top_sources: 20,
            sentiment_limit: 50,
            entity_limit: 30,
            second_pass: true,
            lexicon_path: None,
        }
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&str>) -> Result<DashboardConfig, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(DashboardConfig::default());
    };
    let raw = std::fs::read_to_string(Path::new(path)).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    // An empty file deserializes to unit, not to a mapping.
    if raw.trim().is_empty() {
        warn!(path, "Config file is empty; using defaults");
        return Ok(DashboardConfig::default());
    }
    let config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
        path: path.to_string(),
        source,
    })?;
    info!(path, "Loaded configuration");
    Ok(config)
}

/// Clamp a requested page size into the range the API accepts.
pub fn clamp_page_size(page_size: u32) -> u32 {
    let clamped = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
    if clamped != page_size {
        warn!(
            requested = page_size,
            used = clamped,
            "Page size out of range; clamped"
        );
    }
    clamped
}
