//! Content provider seam.
//!
//! The provider turns a [`ContentRequest`] into domain data. It is opaque to
//! the engine: scraping, HTTP, caching and retries all live behind this trait.

use crate::channel::{ContentRequest, Listing};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tidings_protocol::{ArticleDetail, Envelope, Headline, LiveTv};

/// Errors reported by a content provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The fetch call failed.
    #[error("Fetch failed: {0}")]
    Failed(String),

    /// The source returned data that could not be interpreted.
    #[error("Malformed content: {0}")]
    Malformed(String),

    /// The fetch did not finish in time.
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Outcome of resolving a request against a provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request was well-formed but the provider reports no such content.
    #[error("{0}")]
    NotFound(&'static str),
}

/// Source of channel content.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch a headline listing. An empty listing is a valid answer.
    async fn fetch_listing(&self, listing: &Listing) -> Result<Vec<Headline>, ProviderError>;

    /// Fetch a full article. `None` means the article does not exist.
    async fn fetch_detail(&self, url: &str) -> Result<Option<ArticleDetail>, ProviderError>;

    /// Fetch the live stream. `None` means no stream is available.
    async fn fetch_live(&self) -> Result<Option<LiveTv>, ProviderError>;
}

/// A fetched snapshot, ready to be wrapped in a `data` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    payload: Value,
    empty: bool,
}

impl Content {
    fn new(payload: Value, empty: bool) -> Self {
        Self { payload, empty }
    }

    /// Whether the snapshot carries no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// The JSON payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Wrap the snapshot in a `data` envelope.
    #[must_use]
    pub fn into_envelope(self) -> Envelope {
        Envelope::data(self.payload)
    }
}

/// Run a request against a provider.
///
/// Absent articles and live feeds become [`FetchError::NotFound`]; empty
/// listings are returned as empty content.
///
/// # Errors
///
/// Returns an error if the provider fails or reports the content missing.
pub async fn fetch(
    provider: &dyn ContentProvider,
    request: &ContentRequest,
) -> Result<Content, FetchError> {
    match request {
        ContentRequest::Listing(listing) => {
            let headlines = provider.fetch_listing(listing).await?;
            Ok(Content::new(to_payload(&headlines)?, headlines.is_empty()))
        }
        ContentRequest::Detail { url } => match provider.fetch_detail(url).await? {
            Some(detail) => Ok(Content::new(to_payload(&detail)?, false)),
            None => Err(FetchError::NotFound("Article not found")),
        },
        ContentRequest::Live => match provider.fetch_live().await? {
            Some(live) => Ok(Content::new(to_payload(&live)?, false)),
            None => Err(FetchError::NotFound("Live TV not found")),
        },
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<Value, ProviderError> {
    serde_json::to_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Bounds every call of the wrapped provider by a deadline.
///
/// An expired deadline surfaces as [`ProviderError::Timeout`].
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

impl<P> TimeoutProvider<P> {
    /// Wrap a provider.
    #[must_use]
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured deadline.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<P: ContentProvider> ContentProvider for TimeoutProvider<P> {
    async fn fetch_listing(&self, listing: &Listing) -> Result<Vec<Headline>, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.fetch_listing(listing))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }

    async fn fetch_detail(&self, url: &str) -> Result<Option<ArticleDetail>, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.fetch_detail(url))
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }

    async fn fetch_live(&self) -> Result<Option<LiveTv>, ProviderError> {
        tokio::time::timeout(self.timeout, self.inner.fetch_live())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{headline, StubProvider};

    #[tokio::test]
    async fn test_fetch_listing() {
        let provider = StubProvider::new().with_listing("HOME", vec![headline("X")]);
        let request = ContentRequest::Listing(Listing::Category("HOME".into()));

        let content = fetch(&provider, &request).await.unwrap();
        assert!(!content.is_empty());
        assert_eq!(content.payload()[0]["topic"], "X");
    }

    #[tokio::test]
    async fn test_fetch_empty_listing_is_not_an_error() {
        let provider = StubProvider::new();
        let request = ContentRequest::Listing(Listing::Popular);

        let content = fetch(&provider, &request).await.unwrap();
        assert!(content.is_empty());
        assert_eq!(content.into_envelope(), Envelope::empty_data());
    }

    #[tokio::test]
    async fn test_fetch_missing_detail_and_live() {
        let provider = StubProvider::new();

        let detail = fetch(
            &provider,
            &ContentRequest::Detail {
                url: "https://3news.com/a".into(),
            },
        )
        .await;
        assert!(matches!(detail, Err(FetchError::NotFound("Article not found"))));

        let live = fetch(&provider, &ContentRequest::Live).await;
        assert_eq!(live.unwrap_err().to_string(), "Live TV not found");
    }

    #[tokio::test]
    async fn test_fetch_provider_failure() {
        let provider = StubProvider::new().failing_listing("HOME", "upstream 503");
        let request = ContentRequest::Listing(Listing::Category("HOME".into()));

        match fetch(&provider, &request).await {
            Err(FetchError::Provider(ProviderError::Failed(msg))) => {
                assert_eq!(msg, "upstream 503")
            }
            other => panic!("Expected provider failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_provider() {
        let slow = StubProvider::new()
            .with_listing("HOME", vec![headline("X")])
            .with_delay(Duration::from_secs(120));
        let provider = TimeoutProvider::new(slow, Duration::from_secs(60));

        match provider.fetch_listing(&Listing::Category("HOME".into())).await {
            Err(ProviderError::Timeout(d)) => assert_eq!(d, Duration::from_secs(60)),
            other => panic!("Expected timeout, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_provider_passes_fast_calls() {
        let provider = TimeoutProvider::new(
            StubProvider::new().with_live("https://stream/live.m3u8"),
            Duration::from_secs(60),
        );

        let live = provider.fetch_live().await.unwrap().unwrap();
        assert_eq!(live.video_url, "https://stream/live.m3u8");
    }
}
