//! Data models for fetched articles and the analytics derived from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawArticle`]: One record from the news API, flattened
//! - [`NormalizedArticle`]: A raw article plus its cleaned text fields
//! - [`ArticleCorpus`]: The deduplicated, ordered set of normalized articles
//! - Analytics results: [`WordCount`], [`SourceCount`], [`SentimentLabel`], [`Entity`]
//! - [`DashboardReport`]: Everything one refresh produces, ready for output
//!
//! Field names serialize in snake_case except `publishedAt`, which keeps the
//! name the API uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A news article as returned by the fetch client.
///
/// Every field except `category` may be absent in the API payload. The
/// category is the one the article was requested under, not something the
/// API reports.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawArticle {
    /// Display name of the publishing outlet (`source.name` in the API).
    pub source_name: Option<String>,
    /// Headline.
    pub title: Option<String>,
    /// Short description or lede.
    pub description: Option<String>,
    /// Canonical link to the article.
    pub url: Option<String>,
    /// Publication timestamp, if the API sent one that parses.
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
    /// Category the article was fetched for.
    pub category: String,
}

impl RawArticle {
    /// Title and description joined by a space, absent parts as empty strings.
    pub fn headline_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or("")
        )
    }

    /// Extract the domain name (before .com/.org/etc) from the article URL.
    /// For example: "https://www.reuters.com/world/..." -> "reuters"
    pub fn source_tag(&self) -> Option<String> {
        let parsed = url::Url::parse(self.url.as_deref()?).ok()?;
        let host = parsed.host_str()?;
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() >= 2 {
            return Some(parts[parts.len() - 2].to_string());
        }
        None
    }
}

/// A [`RawArticle`] with the cleaned text fields the analytics run on.
///
/// The clean fields are never absent; text that normalizes to nothing is
/// stored as an empty string.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NormalizedArticle {
    #[serde(flatten)]
    pub raw: RawArticle,
    pub clean_title: String,
    pub clean_description: String,
    /// `clean_title` and `clean_description` joined and trimmed.
    pub combined_text: String,
}

/// Which field decided whether two articles were the same story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    Url,
    Title,
}

/// The deduplicated, ordered set of articles for one refresh.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleCorpus {
    pub dedup_key: DedupKey,
    pub articles: Vec<NormalizedArticle>,
}

impl ArticleCorpus {
    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Combined cleaned text of every article, in corpus order.
    pub fn combined_texts(&self) -> impl Iterator<Item = &str> {
        self.articles.iter().map(|a| a.combined_text.as_str())
    }
}

/// A token and the number of times it occurs in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WordCount {
    pub word: String,
    pub count: usize,
}

/// A publisher and the number of articles it contributed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

/// Sentiment of a headline.
///
/// The classifier's model is binary; `Neutral` marks articles the model gave
/// no verdict for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many articles received each sentiment label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SentimentCount {
    pub sentiment: SentimentLabel,
    pub count: usize,
}

/// Entity category, using the CoNLL-2003 label names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum EntityLabel {
    #[serde(rename = "PER")]
    Person,
    #[serde(rename = "ORG")]
    Organization,
    #[serde(rename = "LOC")]
    Location,
    #[serde(rename = "MISC")]
    Misc,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PER",
            EntityLabel::Organization => "ORG",
            EntityLabel::Location => "LOC",
            EntityLabel::Misc => "MISC",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named entity found in an article's headline text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

/// What the user asked to fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    pub api_key: Option<String>,
    pub categories: Vec<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    pub page_size: u32,
}

/// The request parameters echoed into a report, without the API key.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RequestSummary {
    pub categories: Vec<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    pub page_size: u32,
}

impl From<&FetchRequest> for RequestSummary {
    fn from(request: &FetchRequest) -> Self {
        Self {
            categories: request.categories.clone(),
            query: request.query.clone(),
            country: request.country.clone(),
            page_size: request.page_size,
        }
    }
}

/// A category whose fetch failed; the other categories still ran.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CategoryFailure {
    pub category: String,
    pub message: String,
}

/// An ingested article with its sentiment, as shown in a report.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportArticle {
    #[serde(flatten)]
    pub article: NormalizedArticle,
    /// Absent for articles past the sentiment analysis cap.
    pub sentiment: Option<SentimentLabel>,
}

/// Entities found in one article.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleEntities {
    pub title: Option<String>,
    pub url: Option<String>,
    pub entities: Vec<Entity>,
}

/// Everything one refresh produces.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub request: RequestSummary,
    pub dedup_key: DedupKey,
    pub articles: Vec<ReportArticle>,
    pub top_words: Vec<WordCount>,
    pub top_sources: Vec<SourceCount>,
    pub sentiment_distribution: Vec<SentimentCount>,
    pub entities: Vec<ArticleEntities>,
    pub failures: Vec<CategoryFailure>,
}
