//! Data models for discovered articles and the endpoints they come from.
//!
//! - [`RawArticle`]: fields as found by a feed parser or HTML extractor, before normalization
//! - [`CanonicalArticle`]: the single output schema every source is normalized into
//! - [`Target`] / [`SourceEndpoint`]: an organization and its ordered candidate URLs
//! - [`Provenance`]: which endpoint and extraction tier produced a record
//! - [`TargetReport`]: everything one target resolution produced

use crate::error::ScrapeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used by the feed parser when an item has no usable title.
pub const NO_TITLE: &str = "No title";

/// An article as extracted, before links are resolved and validity is checked.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// A normalized article record.
///
/// The serialized field names (`title`, `link`, `description`, `date`,
/// `source`, `scraped_at`) are relied on by downstream tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalArticle {
    /// Non-empty article title.
    pub title: String,
    /// Absolute http(s) article URL; the endpoint URL when the source gave none.
    pub link: String,
    /// Plain-text summary, at most 300 characters plus an ellipsis.
    pub description: Option<String>,
    /// Publication date exactly as the source wrote it.
    pub date: Option<String>,
    /// Provenance tag, see [`Provenance::tag`].
    pub source: String,
    /// Capture time.
    pub scraped_at: DateTime<Utc>,
}

impl CanonicalArticle {
    pub fn has_placeholder_title(&self) -> bool {
        self.title == NO_TITLE
    }
}

/// Whether an endpoint serves a feed document or an HTML page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Feed,
    Page,
}

/// One candidate URL for a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEndpoint {
    pub url: String,
    pub kind: EndpointKind,
}

impl SourceEndpoint {
    pub fn feed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: EndpointKind::Feed,
        }
    }

    pub fn page(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: EndpointKind::Page,
        }
    }
}

/// An organization to track and its endpoints in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub endpoints: Vec<SourceEndpoint>,
}

impl Target {
    pub fn new(name: impl Into<String>, endpoints: Vec<SourceEndpoint>) -> Self {
        Self {
            name: name.into(),
            endpoints,
        }
    }

    /// Feed endpoints, in configured order.
    pub fn feeds(&self) -> impl Iterator<Item = &SourceEndpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.kind == EndpointKind::Feed)
    }

    /// Page endpoints, in configured order.
    pub fn pages(&self) -> impl Iterator<Item = &SourceEndpoint> {
        self.endpoints
            .iter()
            .filter(|e| e.kind == EndpointKind::Page)
    }
}

/// The extraction tier that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// RSS or Atom feed.
    Feed,
    /// Container cascade on an HTML page.
    Direct,
    /// Anchor-scan fallback on an HTML page.
    Links,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Feed => "RSS",
            Tier::Direct => "Direct",
            Tier::Links => "Links",
        };
        f.write_str(label)
    }
}

/// Where a record came from: the tier and the endpoint URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub tier: Tier,
    pub url: String,
}

impl Provenance {
    pub fn new(tier: Tier, url: impl Into<String>) -> Self {
        Self {
            tier,
            url: url.into(),
        }
    }

    /// The `source` value written into each record, e.g.
    /// `"OpenAI RSS (https://openai.com/blog/rss.xml)"`.
    pub fn tag(&self, target: &str) -> String {
        format!("{} {} ({})", target, self.tier, self.url)
    }
}

/// Result of resolving one target.
///
/// An empty `articles` list is a valid outcome; `diagnostics` records every
/// soft failure met on the way, in the order it happened.
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,
    pub articles: Vec<CanonicalArticle>,
    pub resolved_by: Option<Provenance>,
    pub diagnostics: Vec<ScrapeError>,
}

impl TargetReport {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
