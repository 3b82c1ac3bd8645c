//! Record normalization: turns [`RawArticle`]s into [`CanonicalArticle`]s.
//!
//! Every tier funnels through [`normalize`], which resolves links, cleans
//! descriptions, attaches provenance and the capture timestamp, and rejects
//! records without a title or a link.

use crate::error::ScrapeError;
use crate::models::{CanonicalArticle, Provenance, RawArticle};
use crate::utils::collapse_whitespace;
use chrono::Utc;
use scraper::Html;
use tracing::debug;
use url::Url;

/// Maximum description length in characters before the ellipsis.
pub const DESCRIPTION_LIMIT: usize = 300;

/// Appended to descriptions cut at [`DESCRIPTION_LIMIT`].
pub const ELLIPSIS: &str = "...";

/// Hosts whose pages mix root-relative paths meant for another canonical origin.
const CANONICAL_ORIGINS: &[(&str, &str)] = &[
    ("googleblog.com", "https://ai.googleblog.com"),
    ("blog.google", "https://blog.google"),
];

/// Cut `s` to [`DESCRIPTION_LIMIT`] characters, appending [`ELLIPSIS`] only when something was cut.
///
/// Applying it to its own output returns the same string.
pub fn truncate_description(s: &str) -> String {
    if s.chars().count() <= DESCRIPTION_LIMIT {
        return s.to_string();
    }
    let mut out: String = s.chars().take(DESCRIPTION_LIMIT).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Remove markup and collapse whitespace. Text without `<` is only collapsed.
pub fn strip_html(s: &str) -> String {
    if !s.contains('<') {
        return collapse_whitespace(s);
    }
    let fragment = Html::parse_fragment(s);
    let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Strip, collapse and truncate a description.
pub fn clean_description(s: &str) -> String {
    truncate_description(&strip_html(s))
}

/// Resolve `href` against `base`, returning an absolute web URL.
///
/// - `http`/`https` URLs are returned unchanged
/// - `//host/path` borrows the base scheme
/// - `/path` is joined to the base origin, or to a canonical origin for known blog hosts
/// - anything else is appended to the base URL with a single `/`
/// - an empty `href` resolves to `base` itself
///
/// Returns `None` for other schemes (`javascript:`, `mailto:`, `tel:`) and
/// when `base` is not a URL.
pub fn absolutize(href: &str, base: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return Some(base.to_string());
    }
    if let Ok(parsed) = Url::parse(href) {
        return is_web_scheme(&parsed).then(|| href.to_string());
    }
    let mut base_url = Url::parse(base).ok()?;

    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("{}://{}", base_url.scheme(), rest));
    }
    if href.starts_with('/') {
        return Some(format!("{}{}", canonical_origin(&base_url), href));
    }

    base_url.set_query(None);
    base_url.set_fragment(None);
    Some(format!("{}/{}", base_url.as_str().trim_end_matches('/'), href))
}

fn is_web_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn canonical_origin(base: &Url) -> String {
    if let Some(host) = base.host_str() {
        for (domain, origin) in CANONICAL_ORIGINS {
            if host == *domain || host.ends_with(&format!(".{domain}")) {
                return (*origin).to_string();
            }
        }
    }
    base.origin().ascii_serialization()
}

/// Per-batch context for [`normalize`].
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    /// Target name, used in the `source` tag.
    pub target: &'a str,
    /// Endpoint and tier; its URL is the base for relative links and the
    /// link of records that carry none.
    pub provenance: &'a Provenance,
}

/// Normalize one raw record.
///
/// # Errors
///
/// [`ScrapeError::InvalidRecord`] if the title is empty. A record without a
/// resolvable web link gets the endpoint URL.
pub fn normalize(
    raw: RawArticle,
    ctx: &RecordContext<'_>,
) -> Result<CanonicalArticle, ScrapeError> {
    let title = raw
        .title
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ScrapeError::InvalidRecord("empty title".to_string()))?;

    let base = ctx.provenance.url.as_str();
    let link = match raw.link.as_deref().map(str::trim) {
        Some(href) if !href.is_empty() => {
            absolutize(href, base).unwrap_or_else(|| base.to_string())
        }
        _ => base.to_string(),
    };

    let description = raw
        .description
        .map(|d| clean_description(&d))
        .filter(|d| !d.is_empty());
    let date = raw
        .date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(CanonicalArticle {
        title,
        link,
        description,
        date,
        source: ctx.provenance.tag(ctx.target),
        scraped_at: Utc::now(),
    })
}

/// Normalize a batch, dropping records that fail the validity check.
pub fn normalize_all(raws: Vec<RawArticle>, ctx: &RecordContext<'_>) -> Vec<CanonicalArticle> {
    raws.into_iter()
        .filter_map(|raw| match normalize(raw, ctx) {
            Ok(article) => Some(article),
            Err(e) => {
                debug!(error = %e, source = %ctx.provenance.url, "Dropping record");
                None
            }
        })
        .collect()
}
