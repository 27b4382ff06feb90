//! Channel identifiers and the content requests they resolve to.
//!
//! Channels are named `<namespace>:<selector>[:<subselector>:<arg>]`:
//!
//! | Channel                               | Request               |
//! |---------------------------------------|-----------------------|
//! | `news:Cartoons:headline`              | cartoon listing       |
//! | `news:popular:headline`               | popular listing       |
//! | `news:<CATEGORY>:headline`            | category listing      |
//! | `news:<X>:topic_detail:<route-or-url>`| article detail        |
//! | `news:liveTV`                         | live feed             |
//!
//! Anything else resolves to no request at all.

use std::fmt;

/// A channel identifier. Compared by exact string match.
pub type ChannelId = String;

/// Site root used to absolutize relative article routes.
pub const DEFAULT_BASE_URL: &str = "https://3news.com";

const NAMESPACE: &str = "news";
const HEADLINE: &str = "headline";
const TOPIC_DETAIL: &str = "topic_detail";
const LIVE_TV: &str = "liveTV";
const CARTOONS: &str = "Cartoons";
const POPULAR: &str = "popular";

/// A headline listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Listing {
    /// Headlines of one site category, e.g. `HOME` or `POLITICS`.
    Category(String),
    /// Cartoon listing.
    Cartoons,
    /// Most-read listing.
    Popular,
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::Category(category) => write!(f, "{} headlines", category),
            Listing::Cartoons => f.write_str("Cartoons"),
            Listing::Popular => f.write_str("Popular"),
        }
    }
}

/// What to ask the content provider for on behalf of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentRequest {
    Listing(Listing),
    Detail { url: String },
    Live,
}

impl ContentRequest {
    /// Short kind name, used for log fields and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ContentRequest::Listing(_) => "listing",
            ContentRequest::Detail { .. } => "detail",
            ContentRequest::Live => "live",
        }
    }

    /// Status message announcing a delivered initial snapshot.
    #[must_use]
    pub fn loaded_message(&self) -> &'static str {
        match self {
            ContentRequest::Listing(_) => "Data loaded",
            ContentRequest::Detail { .. } => "Article loaded",
            ContentRequest::Live => "Live TV loaded",
        }
    }
}

impl fmt::Display for ContentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentRequest::Listing(listing) => listing.fmt(f),
            ContentRequest::Detail { url } => write!(f, "article {}", url),
            ContentRequest::Live => f.write_str("Live TV"),
        }
    }
}

/// Decomposes channel identifiers into content requests.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_url: String,
}

impl Resolver {
    /// Create a resolver joining relative routes onto `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// The site root relative routes are joined onto.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a channel into the request that feeds it.
    ///
    /// Returns `None` for channels outside the grammar.
    #[must_use]
    pub fn resolve(&self, channel: &str) -> Option<ContentRequest> {
        // The detail argument may itself contain ':' (absolute URLs)
        let mut parts = channel.splitn(4, ':');
        if parts.next() != Some(NAMESPACE) {
            return None;
        }
        let selector = parts.next()?;

        match (selector, parts.next(), parts.next()) {
            (LIVE_TV, None, None) => Some(ContentRequest::Live),
            (CARTOONS, Some(HEADLINE), None) => Some(ContentRequest::Listing(Listing::Cartoons)),
            (POPULAR, Some(HEADLINE), None) => Some(ContentRequest::Listing(Listing::Popular)),
            (category, Some(HEADLINE), None) if !category.is_empty() => Some(
                ContentRequest::Listing(Listing::Category(category.to_string())),
            ),
            (_, Some(TOPIC_DETAIL), Some(route)) if !route.is_empty() => {
                Some(ContentRequest::Detail {
                    url: self.resolve_url(route),
                })
            }
            _ => None,
        }
    }

    /// Turn a route or absolute URL into an absolute URL.
    #[must_use]
    pub fn resolve_url(&self, route: &str) -> String {
        if route.starts_with("http") {
            return route.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
