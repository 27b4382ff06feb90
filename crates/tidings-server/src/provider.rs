//! File-backed content provider.
//!
//! Content is produced by an external extractor that periodically writes a
//! JSON snapshot:
//!
//! ```json
//! {
//!   "listings": { "HOME": [ { "topic": "...", "url": "...", ... } ] },
//!   "cartoons": [],
//!   "popular": [],
//!   "articles": { "https://3news.com/news/story": { "topic": "...", ... } },
//!   "live": { "video_url": "...", "title": "..." }
//! }
//! ```
//!
//! The file is re-read on every fetch, so each refresh cycle sees the latest
//! snapshot without a restart.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tidings_core::{ContentProvider, Listing, ProviderError};
use tidings_protocol::{ArticleDetail, Headline, LiveTv};
use tracing::trace;

#[derive(Debug, Default, Deserialize)]
struct FeedSnapshot {
    #[serde(default)]
    listings: HashMap<String, Vec<Headline>>,
    #[serde(default)]
    cartoons: Vec<Headline>,
    #[serde(default)]
    popular: Vec<Headline>,
    #[serde(default)]
    articles: HashMap<String, ArticleDetail>,
    #[serde(default)]
    live: Option<LiveTv>,
}

/// Serves content from a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    path: PathBuf,
}

impl SnapshotProvider {
    /// Create a provider reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<FeedSnapshot, ProviderError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ProviderError::Failed(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        trace!(path = %self.path.display(), bytes = contents.len(), "Loaded snapshot");

        serde_json::from_str(&contents).map_err(|e| {
            ProviderError::Malformed(format!("Failed to parse {}: {}", self.path.display(), e))
        })
    }
}

#[async_trait]
impl ContentProvider for SnapshotProvider {
    async fn fetch_listing(&self, listing: &Listing) -> Result<Vec<Headline>, ProviderError> {
        let mut snapshot = self.load().await?;

        Ok(match listing {
            Listing::Cartoons => snapshot.cartoons,
            Listing::Popular => snapshot.popular,
            Listing::Category(category) => {
                let key = snapshot
                    .listings
                    .keys()
                    .find(|key| key.eq_ignore_ascii_case(category))
                    .cloned();
                key.and_then(|key| snapshot.listings.remove(&key))
                    .unwrap_or_default()
            }
        })
    }

    async fn fetch_detail(&self, url: &str) -> Result<Option<ArticleDetail>, ProviderError> {
        let mut snapshot = self.load().await?;
        Ok(snapshot.articles.remove(url))
    }

    async fn fetch_live(&self) -> Result<Option<LiveTv>, ProviderError> {
        Ok(self.load().await?.live)
    }
}
