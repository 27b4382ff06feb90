//! Shared fixtures for unit tests.

use crate::channel::Listing;
use crate::provider::{ContentProvider, ProviderError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tidings_protocol::{ArticleDetail, Envelope, Headline, LiveTv, Status};

pub(crate) fn headline(topic: &str) -> Headline {
    Headline {
        topic: topic.to_string(),
        url: format!("https://3news.com/news/{}", topic.to_lowercase()),
        route: format!("news/{}", topic.to_lowercase()),
        ..Headline::default()
    }
}

/// Shorthand for asserting envelope sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Seen {
    Status(Status),
    Data(usize),
    Object,
    Error(String),
}

pub(crate) fn seen(envelopes: &[Envelope]) -> Vec<Seen> {
    envelopes
        .iter()
        .map(|envelope| match envelope {
            Envelope::Status { data } => Seen::Status(data.status),
            Envelope::Data { data } => match data.as_array() {
                Some(items) => Seen::Data(items.len()),
                None => Seen::Object,
            },
            Envelope::Error { error } => Seen::Error(error.clone()),
        })
        .collect()
}

/// Configurable in-memory provider.
#[derive(Default)]
pub(crate) struct StubProvider {
    listings: Mutex<HashMap<String, Result<Vec<Headline>, String>>>,
    details: Mutex<HashMap<String, ArticleDetail>>,
    live: Mutex<Option<LiveTv>>,
    delay: Option<Duration>,
    slow_listings: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_listing(self, key: &str, headlines: Vec<Headline>) -> Self {
        self.set_listing(key, headlines);
        self
    }

    pub(crate) fn failing_listing(self, key: &str, reason: &str) -> Self {
        self.listings
            .lock()
            .unwrap()
            .insert(key.to_string(), Err(reason.to_string()));
        self
    }

    pub(crate) fn with_detail(self, url: &str, topic: &str) -> Self {
        let detail = ArticleDetail {
            topic: topic.to_string(),
            descriptions: vec!["First paragraph.".into(), "Second paragraph.".into()],
            url: url.to_string(),
            ..ArticleDetail::default()
        };
        self.details.lock().unwrap().insert(url.to_string(), detail);
        self
    }

    pub(crate) fn with_live(self, video_url: &str) -> Self {
        *self.live.lock().unwrap() = Some(LiveTv {
            video_url: video_url.to_string(),
            title: "Live".into(),
        });
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn with_slow_listing(mut self, key: &str, delay: Duration) -> Self {
        self.slow_listings.insert(key.to_string(), delay);
        self
    }

    pub(crate) fn set_listing(&self, key: &str, headlines: Vec<Headline>) {
        self.listings
            .lock()
            .unwrap()
            .insert(key.to_string(), Ok(headlines));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn listing_key(listing: &Listing) -> String {
    match listing {
        Listing::Category(category) => category.clone(),
        Listing::Cartoons => "Cartoons".to_string(),
        Listing::Popular => "popular".to_string(),
    }
}

#[async_trait]
impl ContentProvider for StubProvider {
    async fn fetch_listing(&self, listing: &Listing) -> Result<Vec<Headline>, ProviderError> {
        self.enter().await;
        let key = listing_key(listing);
        if let Some(delay) = self.slow_listings.get(&key) {
            tokio::time::sleep(*delay).await;
        }
        let entry = self.listings.lock().unwrap().get(&key).cloned();
        match entry {
            Some(Ok(headlines)) => Ok(headlines),
            Some(Err(reason)) => Err(ProviderError::Failed(reason)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_detail(&self, url: &str) -> Result<Option<ArticleDetail>, ProviderError> {
        self.enter().await;
        Ok(self.details.lock().unwrap().get(url).cloned())
    }

    async fn fetch_live(&self) -> Result<Option<LiveTv>, ProviderError> {
        self.enter().await;
        Ok(self.live.lock().unwrap().clone())
    }
}
