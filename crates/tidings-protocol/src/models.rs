//! Content models delivered inside `data` envelopes.
//!
//! Field names are part of the wire contract and match what existing clients
//! read, including the camel-cased `isLatest`.

use serde::{Deserialize, Serialize};

/// A headline entry of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Headline {
    /// Headline text.
    pub topic: String,
    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    /// Category labels.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Whether this is the most recent entry of its listing.
    #[serde(rename = "isLatest", default)]
    pub is_latest: bool,
    /// Canonical article URL.
    pub url: String,
    /// Route relative to the site root.
    #[serde(default)]
    pub route: String,
}

/// A full article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub topic: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Body paragraphs in reading order.
    #[serde(default)]
    pub descriptions: Vec<String>,
    pub url: String,
}

/// The live stream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiveTv {
    pub video_url: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_headline_field_names() {
        let headline = Headline {
            topic: "X".into(),
            images: vec!["https://img/1.jpg".into()],
            categories: vec!["News".into()],
            is_latest: true,
            url: "https://3news.com/news/x".into(),
            route: "news/x".into(),
        };

        assert_eq!(
            serde_json::to_value(&headline).unwrap(),
            json!({
                "topic": "X",
                "images": ["https://img/1.jpg"],
                "categories": ["News"],
                "isLatest": true,
                "url": "https://3news.com/news/x",
                "route": "news/x"
            })
        );
    }

    #[test]
    fn test_headline_defaults_missing_lists() {
        let headline: Headline =
            serde_json::from_value(json!({"topic": "Y", "url": "https://a/b"})).unwrap();
        assert!(headline.images.is_empty());
        assert!(!headline.is_latest);
        assert_eq!(headline.route, "");
    }

    #[test]
    fn test_live_tv_field_names() {
        let live = LiveTv {
            video_url: "https://stream/live.m3u8".into(),
            title: "3 News Live".into(),
        };
        assert_eq!(
            serde_json::to_value(&live).unwrap(),
            json!({"video_url": "https://stream/live.m3u8", "title": "3 News Live"})
        );
    }
}
