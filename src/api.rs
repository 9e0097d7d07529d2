//! GNews API client with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`NewsFetcher`]: Core trait, one call per category
//! - [`GNewsClient`]: Talks to the `top-headlines` endpoint over `reqwest`
//! - [`RetryFetch`]: Decorator that retries transient failures of any fetcher
//! - [`crate::cache::CachedFetcher`]: Decorator that memoizes successful fetches
//!
//! # Retry Strategy
//!
//! Only transport failures that look transient (timeouts, refused or dropped
//! connections) are retried. An HTTP error status is final for that category.
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
//! ```

use crate::config::GNewsSettings;
use crate::models::RawArticle;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use rand::{Rng, rng};
use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("GNews returned {status} for category '{category}'")]
    Status { category: String, status: StatusCode },
    #[error("malformed GNews response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid GNews endpoint: {0}")]
    Endpoint(#[source] url::ParseError),
}

impl FetchError {
    /// Whether trying the same request again might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Parameters of one category fetch. Doubles as the cache key, so the API key
/// is deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchParams {
    pub category: Option<String>,
    pub query: Option<String>,
    pub country: Option<String>,
    pub page_size: u32,
}

impl FetchParams {
    /// The category stamped on returned articles.
    pub fn category_name(&self) -> &str {
        self.category.as_deref().unwrap_or("general")
    }

    /// The `topic` query parameter; `general` means no topic filter.
    fn topic(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| *c != "general")
    }
}

/// Trait for async news retrieval.
///
/// Implementors return the articles for one category. Decorators such as
/// [`RetryFetch`] wrap another implementor.
pub trait NewsFetcher {
    async fn fetch(
        &self,
        api_key: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawArticle>, FetchError>;
}

impl<T: NewsFetcher> NewsFetcher for &T {
    async fn fetch(
        &self,
        api_key: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawArticle>, FetchError> {
        (**self).fetch(api_key, params).await
    }
}

#[derive(Debug, Deserialize)]
struct GNewsResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Deserialize)]
struct GNewsArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<GNewsSource>,
}

/// `source` is normally `{"name": ..., "url": ...}`, but a bare name is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GNewsSource {
    Named { name: Option<String> },
    Plain(String),
}

impl GNewsArticle {
    fn into_raw(self, category: &str) -> RawArticle {
        let published_at = self.published_at.as_deref().and_then(|ts| {
            DateTime::parse_from_rfc3339(ts)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| debug!(timestamp = ts, error = %e, "Unparseable publishedAt; dropping"))
                .ok()
        });
        let source_name = match self.source {
            Some(GNewsSource::Named { name }) => name,
            Some(GNewsSource::Plain(name)) => Some(name),
            None => None,
        };
        RawArticle {
            source_name,
            title: self.title,
            description: self.description,
            url: self.url,
            published_at,
            category: category.to_string(),
        }
    }
}

/// HTTP client for the GNews `top-headlines` endpoint.
#[derive(Debug, Clone)]
pub struct GNewsClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GNewsClient {
    /// Build a client with the configured endpoint and request timeout.
    pub fn new(settings: &GNewsSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(settings.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// The full request URL for `params`.
    pub fn request_url(&self, api_key: &str, params: &FetchParams) -> Result<Url, FetchError> {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(6);
        let max = params.page_size.to_string();
        query.push(("apikey", api_key));
        query.push(("max", &max));
        query.push(("lang", "en"));
        if let Some(country) = params.country.as_deref().filter(|c| !c.trim().is_empty()) {
            query.push(("country", country));
        }
        if let Some(topic) = params.topic() {
            query.push(("topic", topic));
        }
        if let Some(q) = params.query.as_deref().filter(|q| !q.trim().is_empty()) {
            query.push(("q", q));
        }
        Url::parse_with_params(&format!("{}/top-headlines", self.endpoint), &query)
            .map_err(FetchError::Endpoint)
    }
}

impl NewsFetcher for GNewsClient {
    #[instrument(level = "info", skip_all, fields(category = params.category_name(), page_size = params.page_size))]
    async fn fetch(
        &self,
        api_key: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let url = self.request_url(api_key, params)?;
        let t0 = Instant::now();
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, elapsed_ms = t0.elapsed().as_millis() as u64, "GNews request rejected");
            return Err(FetchError::Status {
                category: params.category_name().to_string(),
                status,
            });
        }

        let body = response.text().await?;
        let parsed: GNewsResponse = serde_json::from_str(&body).map_err(|e| {
            debug!(body = %truncate_for_log(&body, 200), "Undecodable GNews body");
            FetchError::Decode(e)
        })?;

        let articles: Vec<RawArticle> = parsed
            .articles
            .into_iter()
            .map(|a| a.into_raw(params.category_name()))
            .collect();
        info!(
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched articles"
        );
        Ok(articles)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`NewsFetcher`].
///
/// Non-transient errors are returned immediately.
pub struct RetryFetch<T> {
    inner: T,
    /// Retries after the first attempt.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: NewsFetcher,
{
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> NewsFetcher for RetryFetch<T>
where
    T: NewsFetcher,
{
    #[instrument(level = "info", skip_all, fields(category = params.category_name()))]
    async fn fetch(
        &self,
        api_key: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(api_key, params).await {
                Ok(articles) => return Ok(articles),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// In-memory fetchers for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves canned articles or HTTP statuses per category and counts calls.
    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        responses: HashMap<String, Result<Vec<RawArticle>, StatusCode>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_articles(mut self, category: &str, articles: Vec<RawArticle>) -> Self {
            self.responses.insert(category.to_string(), Ok(articles));
            self
        }

        pub fn with_status(mut self, category: &str, status: u16) -> Self {
            let status = StatusCode::from_u16(status).unwrap();
            self.responses.insert(category.to_string(), Err(status));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl NewsFetcher for FakeFetcher {
        async fn fetch(
            &self,
            _api_key: &str,
            params: &FetchParams,
        ) -> Result<Vec<RawArticle>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let category = params.category_name();
            match self.responses.get(category) {
                Some(Ok(articles)) => Ok(articles
                    .iter()
                    .cloned()
                    .map(|a| RawArticle {
                        category: category.to_string(),
                        ..a
                    })
                    .collect()),
                Some(Err(status)) => Err(FetchError::Status {
                    category: category.to_string(),
                    status: *status,
                }),
                None => Ok(Vec::new()),
            }
        }
    }

    /// Counts calls on the way through to another fetcher.
    pub struct Counting<T> {
        pub inner: T,
        pub calls: AtomicUsize,
    }

    impl<T: NewsFetcher> NewsFetcher for Counting<T> {
        async fn fetch(
            &self,
            api_key: &str,
            params: &FetchParams,
        ) -> Result<Vec<RawArticle>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(api_key, params).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Counting, FakeFetcher};
    use super::*;
    use mockito::{Matcher, Server};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(endpoint: &str) -> GNewsClient {
        GNewsClient::new(&GNewsSettings {
            endpoint: endpoint.to_string(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    fn params(category: Option<&str>) -> FetchParams {
        FetchParams {
            category: category.map(str::to_string),
            query: None,
            country: None,
            page_size: 10,
        }
    }

    #[test]
    fn test_request_url_general_has_no_topic() {
        let c = client("https://gnews.io/api/v4/");
        let url = c
            .request_url(
                "secret",
                &FetchParams {
                    country: Some("us".to_string()),
                    ..params(Some("general"))
                },
            )
            .unwrap();
        assert_eq!(url.path(), "/api/v4/top-headlines");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("apikey".to_string(), "secret".to_string()),
                ("max".to_string(), "10".to_string()),
                ("lang".to_string(), "en".to_string()),
                ("country".to_string(), "us".to_string()),
            ]
        );
    }

    #[test]
    fn test_request_url_topic_and_query() {
        let c = client("https://gnews.io/api/v4");
        let url = c
            .request_url(
                "k",
                &FetchParams {
                    query: Some("interest rates".to_string()),
                    country: Some(String::new()),
                    ..params(Some("business"))
                },
            )
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("topic".to_string(), "business".to_string())));
        assert!(pairs.contains(&("q".to_string(), "interest rates".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "country"));
    }

    #[test]
    fn test_bad_endpoint() {
        let c = client("not a url");
        let err = c.request_url("k", &params(None)).unwrap_err();
        assert!(matches!(err, FetchError::Endpoint(_)));
    }

    #[tokio::test]
    async fn test_fetch_maps_articles() {
        let mut server = Server::new_async().await;
        let body = r#"{
            "totalArticles": 3,
            "articles": [
                {
                    "title": "Fed holds rates",
                    "description": "Policy makers waited.",
                    "content": "ignored",
                    "url": "https://example.com/fed",
                    "image": null,
                    "publishedAt": "2025-05-06T13:45:00Z",
                    "source": {"name": "Reuters", "url": "https://reuters.com"}
                },
                {
                    "title": "Markets wobble",
                    "url": "https://example.com/markets",
                    "publishedAt": "yesterday-ish",
                    "source": "Bloomberg"
                },
                {}
            ]
        }"#;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("apikey".into(), "k".into()),
                Matcher::UrlEncoded("max".into(), "10".into()),
                Matcher::UrlEncoded("lang".into(), "en".into()),
                Matcher::UrlEncoded("topic".into(), "business".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await;

        let articles = client(&server.url())
            .fetch("k", &params(Some("business")))
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(articles.len(), 3);
        let first = &articles[0];
        assert_eq!(first.source_name.as_deref(), Some("Reuters"));
        assert_eq!(first.title.as_deref(), Some("Fed holds rates"));
        assert_eq!(first.category, "business");
        assert_eq!(
            first.published_at.map(|d| d.to_rfc3339()),
            Some("2025-05-06T13:45:00+00:00".to_string())
        );
        assert_eq!(articles[1].source_name.as_deref(), Some("Bloomberg"));
        assert!(articles[1].published_at.is_none());
        assert_eq!(articles[2], RawArticle {
            category: "business".to_string(),
            ..Default::default()
        });
    }

    #[tokio::test]
    async fn test_fetch_missing_articles_is_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"totalArticles": 0}"#)
            .create_async()
            .await;

        let articles = client(&server.url()).fetch("k", &params(None)).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_status_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"errors": ["bad key"]}"#)
            .create_async()
            .await;

        let err = client(&server.url())
            .fetch("k", &params(Some("sports")))
            .await
            .unwrap_err();
        match err {
            FetchError::Status { category, status } => {
                assert_eq!(category, "sports");
                assert_eq!(status, StatusCode::FORBIDDEN);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client(&server.url()).fetch("k", &params(None)).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_status_errors_are_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/top-headlines")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let retry = RetryFetch::new(client(&server.url()), 3, StdDuration::from_millis(1));
        let err = retry.fetch("k", &params(None)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connect_errors_are_retried() {
        let counting = Counting {
            inner: client("http://127.0.0.1:1"),
            calls: AtomicUsize::new(0),
        };
        let retry = RetryFetch::new(&counting, 2, StdDuration::from_millis(1));
        let err = retry.fetch("k", &params(None)).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_passes_success_through() {
        let fake = FakeFetcher::new().with_articles(
            "health",
            vec![RawArticle {
                title: Some("Vaccine trial succeeds".to_string()),
                ..Default::default()
            }],
        );
        let retry = RetryFetch::new(&fake, 2, StdDuration::from_millis(1));
        let articles = retry.fetch("k", &params(Some("health"))).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].category, "health");
        assert_eq!(fake.calls(), 1);
    }
}
