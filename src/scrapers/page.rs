//! HTML page scanning.
//!
//! Two tiers, tried in order on one page:
//!
//! 1. **Containers**: the first selector in [`CONTAINER_SELECTORS`] matching
//!    anything is used exclusively; every match goes through the field
//!    extractor and short titles are discarded.
//! 2. **Links**: when tier 1 produced nothing, the first anchors on the page
//!    are kept if they look AI/ML related.

use super::cascade::{ElementAccess, compile};
use super::fields::extract_fields;
use crate::error::ScrapeError;
use crate::models::{RawArticle, Tier};
use crate::normalize::absolutize;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

/// Records returned per page, whichever tier produced them.
pub const MAX_PAGE_RECORDS: usize = 10;

/// Container titles shorter than this are treated as noise.
const MIN_TITLE_CHARS: usize = 5;

/// Anchors examined by the link scan.
const MAX_ANCHORS_EXAMINED: usize = 20;

/// Accepted anchor text length, in characters: `[min, max)`.
const ANCHOR_TEXT_CHARS: (usize, usize) = (10, 200);

/// Lowercase href substrings marking a link as AI/ML related.
const HREF_VOCABULARY: &[&str] = &["ai"];

/// Lowercase anchor-text substrings marking a link as AI/ML related.
const TEXT_VOCABULARY: &[&str] = &["artificial", "machine learning", "ml"];

/// Container selectors, most specific first.
pub const CONTAINER_SELECTORS: &[&str] = &[
    "article h2 a",
    "article h3 a",
    ".blog-post a",
    ".post-title a",
    r#"h2 a[href*="/technology/ai/"]"#,
    r#"h3 a[href*="/technology/ai/"]"#,
    r#"a[href*="/technology/ai/"]:not([href*="twitter"]):not([href*="facebook"]):not([href*="linkedin"])"#,
    r#"a[href*="googleblog.com"]:not([href*="twitter"]):not([href*="facebook"]):not([href*="linkedin"])"#,
    r#"a[href*="/blog/"]:not([href*="twitter"]):not([href*="facebook"]):not([href*="linkedin"])"#,
];

static CONTAINERS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    CONTAINER_SELECTORS
        .iter()
        .map(|pattern| (*pattern, compile(pattern)))
        .collect()
});

static ANCHORS: Lazy<Selector> = Lazy::new(|| compile("a[href]"));

/// Records found on one page and the tier that found them.
#[derive(Debug)]
pub struct PageScan {
    pub tier: Tier,
    pub records: Vec<RawArticle>,
}

/// Scan a page body fetched from `page_url`.
///
/// # Errors
///
/// [`ScrapeError::NoStructuredContent`] when neither tier produced a record.
#[instrument(level = "debug", skip_all, fields(%page_url))]
pub fn scan_page(body: &str, page_url: &str) -> Result<PageScan, ScrapeError> {
    let document = Html::parse_document(body);

    let records = scan_containers(&document, page_url);
    if !records.is_empty() {
        return Ok(PageScan {
            tier: Tier::Direct,
            records,
        });
    }

    debug!("No container records, scanning anchors");
    let records = scan_anchors(&document, page_url);
    if !records.is_empty() {
        return Ok(PageScan {
            tier: Tier::Links,
            records,
        });
    }

    Err(ScrapeError::NoStructuredContent {
        url: page_url.to_string(),
    })
}

/// Tier 1. Uses only the first selector that matches at least one element.
pub fn scan_containers(document: &Html, page_url: &str) -> Vec<RawArticle> {
    let Some((pattern, elements)) = CONTAINERS.iter().find_map(|(pattern, selector)| {
        let elements: Vec<_> = document.select(selector).collect();
        (!elements.is_empty()).then_some((pattern, elements))
    }) else {
        return Vec::new();
    };
    debug!(selector = %pattern, matched = elements.len(), "Using container selector");

    elements
        .into_iter()
        .map(|element| extract_fields(element, page_url))
        .filter(|raw| {
            raw.title
                .as_deref()
                .is_some_and(|t| t.chars().count() >= MIN_TITLE_CHARS)
        })
        .map(|mut raw| {
            raw.link.get_or_insert_with(|| page_url.to_string());
            raw
        })
        .take(MAX_PAGE_RECORDS)
        .collect()
}

/// Whether an anchor looks AI/ML related: [`HREF_VOCABULARY`] is matched
/// against the href only, [`TEXT_VOCABULARY`] against the text only.
pub fn looks_relevant(href: &str, text: &str) -> bool {
    let href = href.to_lowercase();
    let text = text.to_lowercase();
    HREF_VOCABULARY.iter().any(|term| href.contains(term))
        || TEXT_VOCABULARY.iter().any(|term| text.contains(term))
}

/// Tier 2. Examines the first anchors on the page.
pub fn scan_anchors(document: &Html, page_url: &str) -> Vec<RawArticle> {
    let (min_chars, max_chars) = ANCHOR_TEXT_CHARS;
    document
        .select(&ANCHORS)
        .take(MAX_ANCHORS_EXAMINED)
        .filter_map(|anchor| {
            let href = anchor.attribute("href").unwrap_or_default();
            let text = anchor.visible_text();
            let len = text.chars().count();
            if !(min_chars..max_chars).contains(&len) || !looks_relevant(href, &text) {
                return None;
            }
            let link = absolutize(href, page_url)?;
            Some(RawArticle {
                title: Some(text),
                link: Some(link),
                description: None,
                date: None,
            })
        })
        .take(MAX_PAGE_RECORDS)
        .collect()
}
