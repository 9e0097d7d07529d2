//! Time-bounded memoization of category fetches.

use crate::api::{FetchError, FetchParams, NewsFetcher};
use crate::models::RawArticle;
use moka::future::Cache;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Wrapper that serves repeated fetches of the same parameters from memory.
///
/// Only successful fetches are cached. Entries expire after the TTL; a zero
/// TTL disables caching and every call goes to the inner fetcher.
pub struct CachedFetcher<T> {
    inner: T,
    cache: Option<Cache<FetchParams, Vec<RawArticle>>>,
}

impl<T> CachedFetcher<T>
where
    T: NewsFetcher,
{
    pub fn new(inner: T, ttl: Duration, capacity: u64) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            info!(ttl_secs = ttl.as_secs(), capacity, "Fetch cache enabled");
            Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build()
        });
        Self { inner, cache }
    }
}

impl<T> fmt::Debug for CachedFetcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFetcher")
            .field("enabled", &self.cache.is_some())
            .field(
                "entries",
                &self.cache.as_ref().map(|c| c.entry_count()).unwrap_or(0),
            )
            .finish()
    }
}

impl<T> NewsFetcher for CachedFetcher<T>
where
    T: NewsFetcher,
{
    #[instrument(level = "debug", skip_all, fields(category = params.category_name()))]
    async fn fetch(
        &self,
        api_key: &str,
        params: &FetchParams,
    ) -> Result<Vec<RawArticle>, FetchError> {
        let Some(cache) = &self.cache else {
            return self.inner.fetch(api_key, params).await;
        };
        if let Some(articles) = cache.get(params).await {
            debug!(count = articles.len(), "Fetch cache hit");
            return Ok(articles);
        }
        let articles = self.inner.fetch(api_key, params).await?;
        cache.insert(params.clone(), articles.clone()).await;
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeFetcher;

    fn params(category: &str, page_size: u32) -> FetchParams {
        FetchParams {
            category: Some(category.to_string()),
            query: None,
            country: None,
            page_size,
        }
    }

    fn fake() -> FakeFetcher {
        FakeFetcher::new()
            .with_articles(
                "science",
                vec![RawArticle {
                    title: Some("Comet visible tonight".to_string()),
                    url: Some("https://example.com/comet".to_string()),
                    ..Default::default()
                }],
            )
            .with_status("sports", 503)
    }

    #[tokio::test]
    async fn test_cache_hit_avoids_second_request() {
        let fake = fake();
        let cached = CachedFetcher::new(&fake, Duration::from_secs(60), 16);

        let first = cached.fetch("k", &params("science", 10)).await.unwrap();
        let second = cached.fetch("k", &params("science", 10)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fake.calls(), 1);

        cached.fetch("k", &params("science", 20)).await.unwrap();
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fake = fake();
        let cached = CachedFetcher::new(&fake, Duration::from_secs(60), 16);

        assert!(cached.fetch("k", &params("sports", 10)).await.is_err());
        assert!(cached.fetch("k", &params("sports", 10)).await.is_err());
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let fake = fake();
        let cached = CachedFetcher::new(&fake, Duration::ZERO, 16);

        let first = cached.fetch("k", &params("science", 10)).await.unwrap();
        let second = cached.fetch("k", &params("science", 10)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fake.calls(), 2);
    }
}
