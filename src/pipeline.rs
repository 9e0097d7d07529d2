//! One dashboard refresh: fetch every category, aggregate, analyze, report.
//!
//! Failures are contained at the smallest useful scope. A category that
//! fails to fetch is recorded and skipped; a model that fails degrades its
//! own stage only. Requests that cannot produce a report (no key, nothing
//! selected, nothing returned) end with a [`Notice`] instead.

use crate::analytics::aggregate::aggregate;
use crate::analytics::frequency::{top_sources, top_words};
use crate::analytics::sentiment::sentiment_distribution;
use crate::analytics::AnalyticsService;
use crate::api::{FetchParams, NewsFetcher};
use crate::config::AnalyticsSettings;
use crate::models::{
    ArticleEntities, CategoryFailure, DashboardReport, FetchRequest, RawArticle, ReportArticle,
    RequestSummary,
};
use crate::nlp::TextNormalizer;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter;
use tracing::{error, info, instrument, warn};

/// Why a refresh produced no report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    MissingApiKey,
    NoCategories,
    NoArticles,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Notice::MissingApiKey => "A GNews API key is required (--api-key or GNEWS_API_KEY).",
            Notice::NoCategories => "Please select at least one category.",
            Notice::NoArticles => "No articles returned.",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Report(DashboardReport),
    Notice {
        notice: Notice,
        failures: Vec<CategoryFailure>,
    },
}

impl PipelineOutcome {
    fn notice(notice: Notice) -> Self {
        PipelineOutcome::Notice {
            notice,
            failures: Vec::new(),
        }
    }
}

/// The fetch client, normalizer and models one refresh runs against.
pub struct Dashboard<F> {
    fetcher: F,
    normalizer: TextNormalizer,
    analytics: AnalyticsService,
    settings: AnalyticsSettings,
    /// Category fetches in flight at once.
    concurrency: usize,
}

impl<F> fmt::Debug for Dashboard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dashboard")
            .field("normalizer", &self.normalizer)
            .field("analytics", &self.analytics)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl<F> Dashboard<F>
where
    F: NewsFetcher,
{
    pub fn new(
        fetcher: F,
        normalizer: TextNormalizer,
        analytics: AnalyticsService,
        settings: AnalyticsSettings,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            normalizer,
            analytics,
            settings,
            concurrency: concurrency.max(1),
        }
    }

    /// Run the whole pipeline for `request`.
    #[instrument(level = "info", skip_all, fields(categories = request.categories.len(), page_size = request.page_size))]
    pub async fn refresh(&self, request: &FetchRequest) -> PipelineOutcome {
        let Some(api_key) = request
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        else {
            warn!("No API key configured; not fetching");
            return PipelineOutcome::notice(Notice::MissingApiKey);
        };
        if request.categories.is_empty() {
            warn!("No categories selected; not fetching");
            return PipelineOutcome::notice(Notice::NoCategories);
        }

        let (frames, failures) = self.fetch_all(api_key, request).await;
        if frames.iter().all(Vec::is_empty) {
            warn!(failed = failures.len(), "No articles returned");
            return PipelineOutcome::Notice {
                notice: Notice::NoArticles,
                failures,
            };
        }

        let corpus = aggregate(frames, &self.normalizer);
        if corpus.is_empty() {
            return PipelineOutcome::Notice {
                notice: Notice::NoArticles,
                failures,
            };
        }

        let top_words = top_words(corpus.combined_texts(), self.settings.top_words);
        let top_sources = top_sources(&corpus, self.settings.top_sources);

        let titles: Vec<&str> = corpus
            .articles
            .iter()
            .take(self.settings.sentiment_limit)
            .map(|a| a.clean_title.as_str())
            .collect();
        let labels = self.analytics.sentiment_classifier().classify(&titles);
        let sentiment_distribution = sentiment_distribution(&labels);

        let extractor = self.analytics.entity_extractor();
        let entities: Vec<ArticleEntities> = corpus
            .articles
            .iter()
            .take(self.settings.entity_limit)
            .map(|a| ArticleEntities {
                title: a.raw.title.clone(),
                url: a.raw.url.clone(),
                entities: extractor.extract(&a.raw.headline_text()),
            })
            .collect();

        let dedup_key = corpus.dedup_key;
        let articles: Vec<ReportArticle> = corpus
            .articles
            .into_iter()
            .zip(labels.into_iter().map(Some).chain(iter::repeat(None)))
            .map(|(article, sentiment)| ReportArticle { article, sentiment })
            .collect();

        info!(
            articles = articles.len(),
            words = top_words.len(),
            failed = failures.len(),
            "Dashboard refreshed"
        );
        PipelineOutcome::Report(DashboardReport {
            generated_at: Utc::now(),
            request: RequestSummary::from(request),
            dedup_key,
            articles,
            top_words,
            top_sources,
            sentiment_distribution,
            entities,
            failures,
        })
    }

    /// Fetch each category, keeping request order. Failed categories become
    /// [`CategoryFailure`]s and contribute no frame.
    async fn fetch_all(
        &self,
        api_key: &str,
        request: &FetchRequest,
    ) -> (Vec<Vec<RawArticle>>, Vec<CategoryFailure>) {
        let results: Vec<(String, _)> = stream::iter(&request.categories)
            .map(|category| {
                let params = FetchParams {
                    category: Some(category.clone()),
                    query: request.query.clone(),
                    country: request.country.clone(),
                    page_size: request.page_size,
                };
                async move { (category.clone(), self.fetcher.fetch(api_key, &params).await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut frames = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (category, result) in results {
            match result {
                Ok(articles) => frames.push(articles),
                Err(e) => {
                    error!(%category, error = %e, "Error fetching category");
                    failures.push(CategoryFailure {
                        category,
                        message: e.to_string(),
                    });
                }
            }
        }
        (frames, failures)
    }
}
