//! Field extraction from a single article container element.
//!
//! Each field has its own [`Cascade`]. Missing fields come back as `None`;
//! whether the resulting record is kept is the normalizer's decision.

use super::cascade::{Cascade, ElementAccess, Probe, compile};
use crate::models::RawArticle;
use crate::normalize::{absolutize, truncate_description};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

/// Descriptions must be longer than this many characters to count.
const MIN_DESCRIPTION_CHARS: usize = 20;

static TITLE: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(&[
        ("h1", Probe::Text),
        ("h2", Probe::Text),
        ("h3", Probe::Text),
        ("h4", Probe::Text),
        (".title", Probe::Text),
        (r#"[class*="title"]"#, Probe::Text),
        (r#"[class*="headline"]"#, Probe::Text),
    ])
});

static DATE: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(&[
        ("time", Probe::AttrOrText("datetime")),
        (".date", Probe::AttrOrText("datetime")),
        (r#"[class*="date"]"#, Probe::AttrOrText("datetime")),
        ("[datetime]", Probe::AttrOrText("datetime")),
        (r#"[class*="publish"]"#, Probe::AttrOrText("datetime")),
    ])
});

static DESCRIPTION: Lazy<Cascade> = Lazy::new(|| {
    Cascade::new(&[
        (".excerpt", Probe::Text),
        (".description", Probe::Text),
        (".summary", Probe::Text),
        ("p", Probe::Text),
    ])
    .accepting(|text| text.chars().count() > MIN_DESCRIPTION_CHARS)
});

static NESTED_LINK: Lazy<Selector> = Lazy::new(|| compile("a[href]"));

fn is_anchor(element: &ElementRef<'_>) -> bool {
    element.value().name().eq_ignore_ascii_case("a")
}

/// Title: heading or title-like class inside the element, else the element's
/// own text when it is a link.
pub fn extract_title(element: ElementRef<'_>) -> Option<String> {
    TITLE.first_match(element).or_else(|| {
        is_anchor(&element)
            .then(|| element.visible_text())
            .filter(|t| !t.is_empty())
    })
}

/// Link: the element's own `href` when it is a link, else the first nested
/// link. Relative values are resolved against `base_url`; empty hrefs and
/// non-web schemes are skipped.
pub fn extract_link(element: ElementRef<'_>, base_url: &str) -> Option<String> {
    let resolve = |href: &str| {
        if href.trim().is_empty() {
            None
        } else {
            absolutize(href, base_url)
        }
    };
    let own = is_anchor(&element)
        .then(|| element.attribute("href"))
        .flatten()
        .and_then(resolve);
    own.or_else(|| {
        element
            .select(&NESTED_LINK)
            .filter_map(|a| a.value().attr("href"))
            .find_map(resolve)
    })
}

/// Date: `datetime` attribute or text of the first date-like element, kept verbatim.
pub fn extract_date(element: ElementRef<'_>) -> Option<String> {
    DATE.first_match(element)
}

/// Description: first excerpt-like text longer than 20 characters, truncated.
pub fn extract_description(element: ElementRef<'_>) -> Option<String> {
    DESCRIPTION
        .first_match(element)
        .map(|text| truncate_description(&text))
}

/// Run every field cascade over one container element.
pub fn extract_fields(element: ElementRef<'_>, base_url: &str) -> RawArticle {
    RawArticle {
        title: extract_title(element),
        link: extract_link(element, base_url),
        description: extract_description(element),
        date: extract_date(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const BASE: &str = "https://blog.google/technology/ai/";

    fn with_first<R>(html: &str, pattern: &'static str, f: impl FnOnce(ElementRef<'_>) -> R) -> R {
        let doc = Html::parse_document(html);
        let selector = compile(pattern);
        let element = doc.select(&selector).next().expect("element present");
        f(element)
    }

    #[test]
    fn test_full_card() {
        let html = r#"
            <article>
              <h2 class="card-title">Gemini gets faster</h2>
              <a href="/technology/ai/gemini-faster/">Read more</a>
              <time datetime="2025-05-06T10:00:00Z">May 6, 2025</time>
              <p class="excerpt">Today we are rolling out a faster Gemini model to everyone.</p>
            </article>"#;
        let raw = with_first(html, "article", |el| extract_fields(el, BASE));
        assert_eq!(raw.title.as_deref(), Some("Gemini gets faster"));
        assert_eq!(
            raw.link.as_deref(),
            Some("https://blog.google/technology/ai/gemini-faster/")
        );
        assert_eq!(raw.date.as_deref(), Some("2025-05-06T10:00:00Z"));
        assert_eq!(
            raw.description.as_deref(),
            Some("Today we are rolling out a faster Gemini model to everyone.")
        );
    }

    #[test]
    fn test_anchor_element_uses_own_text_and_href() {
        let html =
            r#"<article><h2><a href="/technology/ai/post-one/">Post one title</a></h2></article>"#;
        let (title, link) = with_first(html, "article h2 a", |el| {
            (extract_title(el), extract_link(el, BASE))
        });
        assert_eq!(title.as_deref(), Some("Post one title"));
        assert_eq!(link.as_deref(), Some("https://blog.google/technology/ai/post-one/"));
    }

    #[test]
    fn test_anchor_with_nested_heading_prefers_heading() {
        let html = r#"<a id="card" href="https://openai.com/index/x">
            <h3>Heading text</h3><span>Read</span></a>"#;
        let title = with_first(html, "#card", extract_title);
        assert_eq!(title.as_deref(), Some("Heading text"));
    }

    #[test]
    fn test_headline_class_match() {
        let html = r#"<div class="post"><span class="post-headline">Headline here</span></div>"#;
        let title = with_first(html, ".post", extract_title);
        assert_eq!(title.as_deref(), Some("Headline here"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let html = r#"<div class="post"><span>nothing useful</span></div>"#;
        let raw = with_first(html, ".post", |el| extract_fields(el, BASE));
        assert_eq!(raw, RawArticle::default());
    }

    #[test]
    fn test_date_falls_back_to_text_and_class() {
        let html = r#"<div class="a"><time>Yesterday</time></div>"#;
        assert_eq!(with_first(html, ".a", extract_date).as_deref(), Some("Yesterday"));
        let html = r#"<div class="b"><span class="publish-info">Jan 2, 2025</span></div>"#;
        assert_eq!(with_first(html, ".b", extract_date).as_deref(), Some("Jan 2, 2025"));
    }

    #[test]
    fn test_short_descriptions_rejected() {
        let html = r#"<div class="post"><p>Too short.</p></div>"#;
        assert_eq!(with_first(html, ".post", extract_description), None);
    }

    #[test]
    fn test_long_description_truncated() {
        let body = "word ".repeat(100);
        let html = format!(r#"<div class="post"><div class="summary">{body}</div></div>"#);
        let desc = with_first(&html, ".post", extract_description).unwrap();
        assert_eq!(desc.chars().count(), 303);
        assert!(desc.ends_with("..."));
    }

    #[test]
    fn test_link_skips_empty_hrefs() {
        let html = r#"<div class="post"><a href="">x</a><a href="relative/post">y</a></div>"#;
        let link = with_first(html, ".post", |el| extract_link(el, "https://example.com/blog/"));
        assert_eq!(link.as_deref(), Some("https://example.com/blog/relative/post"));
    }

    #[test]
    fn test_link_skips_script_and_mail_hrefs() {
        let html = r#"<div class="post"><a href="javascript:void(0)">Share</a>
            <a href="mailto:press@example.com">Mail</a><a href="/blog/real">Read</a></div>"#;
        let link = with_first(html, ".post", |el| extract_link(el, "https://example.com/"));
        assert_eq!(link.as_deref(), Some("https://example.com/blog/real"));

        let html = r#"<a class="card" href="javascript:void(0)">Open the card</a>"#;
        let link = with_first(html, ".card", |el| extract_link(el, "https://example.com/"));
        assert_eq!(link, None);
    }
}
