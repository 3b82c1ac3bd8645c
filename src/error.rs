//! Error types for the scraping engine and its configuration.
//!
//! Every [`ScrapeError`] variant is soft: the engine absorbs it at the lowest
//! level that can act on it (skip an item, drop a record, advance to the next
//! endpoint). Only [`ConfigError`] can stop the binary, and only before any
//! request has been made.

use thiserror::Error;

/// Failures produced while resolving a single target.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport error, timeout, or non-2xx status.
    #[error("endpoint unreachable ({url}): {reason}")]
    EndpointUnreachable { url: String, reason: String },

    /// The body claimed to be a feed but is not well-formed XML.
    #[error("malformed feed ({url}): {reason}")]
    MalformedFeed { url: String, reason: String },

    /// The feed parsed but none of its usable items carries a real title.
    #[error("feed at {url} has no titled items")]
    UntitledFeed { url: String },

    /// One feed item could not be assembled; the rest of the feed is unaffected.
    #[error("malformed feed item: {0}")]
    MalformedItem(String),

    /// Neither the container cascade nor the anchor scan found anything.
    #[error("no structured content found at {url}")]
    NoStructuredContent { url: String },

    /// A record failed the non-empty title/link invariant.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Every endpoint for the target was exhausted.
    #[error("no articles found for {target}")]
    NoArticlesFound { target: String },
}

impl ScrapeError {
    pub fn unreachable(url: &str, reason: impl ToString) -> Self {
        ScrapeError::EndpointUnreachable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed_feed(url: &str, reason: impl ToString) -> Self {
        ScrapeError::MalformedFeed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Failures loading the target configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("target {target} has an invalid URL {url:?}")]
    InvalidUrl { target: String, url: String },

    #[error("no targets left to scrape")]
    NoTargets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_display_includes_url_and_reason() {
        let err = ScrapeError::unreachable("https://example.com/feed", "HTTP 404 Not Found");
        let msg = err.to_string();
        assert!(msg.contains("https://example.com/feed"));
        assert!(msg.contains("404"));
    }

    #[test]
    fn test_malformed_feed_display() {
        let err = ScrapeError::malformed_feed("https://example.com/rss", "unexpected EOF");
        assert_eq!(
            err.to_string(),
            "malformed feed (https://example.com/rss): unexpected EOF"
        );
    }
}
