//! Per-target source fallback.
//!
//! A target moves through [`Stage::TryingFeeds`], [`Stage::TryingPages`] and
//! finally [`Stage::Exhausted`]. Endpoints are tried strictly one after
//! another and the first one that yields records ends the resolution.
//!
//! Feeds and pages are accepted on different terms: a feed must contain at
//! least one item with a real title, while any non-empty page result is taken.

use crate::error::ScrapeError;
use crate::fetch::Fetch;
use crate::models::{CanonicalArticle, Provenance, Target, TargetReport, Tier};
use crate::normalize::{RecordContext, normalize_all};
use crate::scrapers::feed::parse_feed;
use crate::scrapers::page::scan_page;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per-request timeouts for each endpoint kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub feed: Duration,
    pub page: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            feed: Duration::from_secs(10),
            page: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TryingFeeds,
    TryingPages,
    Exhausted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::TryingFeeds => "trying_feeds",
            Stage::TryingPages => "trying_pages",
            Stage::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

type Resolved = (Vec<CanonicalArticle>, Provenance);

async fn try_feed<F: Fetch>(
    fetcher: &F,
    target: &str,
    url: &str,
    timeout: Duration,
) -> Result<Resolved, ScrapeError> {
    let body = fetcher.fetch(url, timeout).await?;
    let raws = parse_feed(&body, url).inspect_err(|_| {
        debug!(
            preview = %truncate_for_log(&String::from_utf8_lossy(&body), 160),
            "Body is not a feed"
        );
    })?;
    let provenance = Provenance::new(Tier::Feed, url);
    let ctx = RecordContext {
        target,
        provenance: &provenance,
    };
    let articles = normalize_all(raws, &ctx);
    if !articles.iter().any(|a| !a.has_placeholder_title()) {
        return Err(ScrapeError::UntitledFeed {
            url: url.to_string(),
        });
    }
    Ok((articles, provenance))
}

async fn try_page<F: Fetch>(
    fetcher: &F,
    target: &str,
    url: &str,
    timeout: Duration,
) -> Result<Resolved, ScrapeError> {
    let body = fetcher.fetch(url, timeout).await?;
    let scan = scan_page(&String::from_utf8_lossy(&body), url)?;
    let provenance = Provenance::new(scan.tier, url);
    let ctx = RecordContext {
        target,
        provenance: &provenance,
    };
    let articles = normalize_all(scan.records, &ctx);
    if articles.is_empty() {
        return Err(ScrapeError::NoStructuredContent {
            url: url.to_string(),
        });
    }
    Ok((articles, provenance))
}

fn resolved(
    target: &Target,
    (articles, provenance): Resolved,
    diagnostics: Vec<ScrapeError>,
) -> TargetReport {
    info!(
        count = articles.len(),
        tier = %provenance.tier,
        url = %provenance.url,
        "Resolved target"
    );
    TargetReport {
        target: target.name.clone(),
        articles,
        resolved_by: Some(provenance),
        diagnostics,
    }
}

/// Resolve one target. Never fails: exhausting every endpoint yields an
/// empty report whose last diagnostic is [`ScrapeError::NoArticlesFound`].
#[instrument(level = "info", skip_all, fields(competitor = %target.name))]
pub async fn resolve_target<F: Fetch>(
    fetcher: &F,
    target: &Target,
    timeouts: &Timeouts,
) -> TargetReport {
    let mut diagnostics = Vec::new();

    let mut stage = Stage::TryingFeeds;
    debug!(%stage, feeds = target.feeds().count(), "Entering stage");
    for endpoint in target.feeds() {
        match try_feed(fetcher, &target.name, &endpoint.url, timeouts.feed).await {
            Ok(found) => return resolved(target, found, diagnostics),
            Err(e) => {
                warn!(%stage, url = %endpoint.url, error = %e, "Feed endpoint failed");
                diagnostics.push(e);
            }
        }
    }

    stage = Stage::TryingPages;
    debug!(%stage, pages = target.pages().count(), "Entering stage");
    for endpoint in target.pages() {
        match try_page(fetcher, &target.name, &endpoint.url, timeouts.page).await {
            Ok(found) => return resolved(target, found, diagnostics),
            Err(e) => {
                warn!(%stage, url = %endpoint.url, error = %e, "Page endpoint failed");
                diagnostics.push(e);
            }
        }
    }

    stage = Stage::Exhausted;
    let exhausted = ScrapeError::NoArticlesFound {
        target: target.name.clone(),
    };
    warn!(%stage, attempts = diagnostics.len(), "{exhausted}");
    diagnostics.push(exhausted);
    TargetReport {
        target: target.name.clone(),
        articles: Vec::new(),
        resolved_by: None,
        diagnostics,
    }
}

/// Resolve targets one after another, in the given order.
#[instrument(level = "info", skip_all, fields(targets = targets.len()))]
pub async fn resolve_all<F: Fetch>(
    fetcher: &F,
    targets: &[Target],
    timeouts: &Timeouts,
) -> Vec<TargetReport> {
    let reports: Vec<TargetReport> = stream::iter(targets)
        .then(|target| resolve_target(fetcher, target, timeouts))
        .collect()
        .await;

    let found: usize = reports.iter().map(|r| r.articles.len()).sum();
    let empty = reports.iter().filter(|r| r.is_empty()).count();
    info!(found, empty_targets = empty, "Resolved all targets");
    reports
}
