//! RSS 2.0, RSS 1.0 (RDF) and Atom parsing.
//!
//! The document is streamed once with a namespace-aware reader. Items of the
//! three formats are collected separately and the first non-empty set in the
//! order plain RSS `item`, RDF `item`, Atom `entry` is returned, so formats
//! are never merged.
//!
//! Each field is resolved from the item's direct children through an ordered
//! table of `(namespace, local name)` variants; the first variant present wins.

use crate::error::ScrapeError;
use crate::models::{NO_TITLE, RawArticle};
use crate::normalize::clean_description;
use crate::utils::collapse_whitespace;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::{debug, instrument, warn};

/// Items returned per feed.
pub const MAX_FEED_ITEMS: usize = 10;

const RSS1_NS: &[u8] = b"http://purl.org/rss/1.0/";
const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Plain,
    Rss1,
    Atom,
    DublinCore,
    Other,
}

fn classify(resolved: &ResolveResult<'_>) -> Ns {
    match resolved {
        ResolveResult::Unbound => Ns::Plain,
        ResolveResult::Bound(Namespace(ns)) if *ns == RSS1_NS => Ns::Rss1,
        ResolveResult::Bound(Namespace(ns)) if *ns == ATOM_NS => Ns::Atom,
        ResolveResult::Bound(Namespace(ns)) if *ns == DC_NS => Ns::DublinCore,
        _ => Ns::Other,
    }
}

/// Item formats in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Rss2,
    Rdf,
    Atom,
}

const ITEM_KINDS: [ItemKind; 3] = [ItemKind::Rss2, ItemKind::Rdf, ItemKind::Atom];

fn item_kind(ns: Ns, local: &[u8]) -> Option<ItemKind> {
    match (ns, local) {
        (Ns::Plain, b"item") => Some(ItemKind::Rss2),
        (Ns::Rss1, b"item") => Some(ItemKind::Rdf),
        (Ns::Atom, b"entry") => Some(ItemKind::Atom),
        _ => None,
    }
}

/// Where a field's value lives on a matching child element.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Text,
    Href,
}

type Variant = (Ns, &'static str, Slot);

const TITLE_VARIANTS: &[Variant] = &[
    (Ns::Plain, "title", Slot::Text),
    (Ns::Rss1, "title", Slot::Text),
    (Ns::Atom, "title", Slot::Text),
];

const LINK_VARIANTS: &[Variant] = &[
    (Ns::Plain, "link", Slot::Text),
    (Ns::Rss1, "link", Slot::Text),
    (Ns::Atom, "link", Slot::Href),
];

const DESCRIPTION_VARIANTS: &[Variant] = &[
    (Ns::Plain, "description", Slot::Text),
    (Ns::Rss1, "description", Slot::Text),
    (Ns::Atom, "summary", Slot::Text),
    (Ns::Atom, "content", Slot::Text),
];

const DATE_VARIANTS: &[Variant] = &[
    (Ns::Plain, "pubDate", Slot::Text),
    (Ns::DublinCore, "date", Slot::Text),
    (Ns::Atom, "published", Slot::Text),
    (Ns::Atom, "updated", Slot::Text),
];

/// A direct child of an item.
#[derive(Debug)]
struct Child {
    ns: Ns,
    local: String,
    text: String,
    href: Option<String>,
    rel: Option<String>,
}

#[derive(Debug)]
struct ItemBuilder {
    kind: ItemKind,
    depth: usize,
    children: Vec<Child>,
    open_child: Option<Child>,
    error: Option<String>,
}

impl ItemBuilder {
    fn new(kind: ItemKind, depth: usize) -> Self {
        Self {
            kind,
            depth,
            children: Vec::new(),
            open_child: None,
            error: None,
        }
    }

    fn fail(&mut self, reason: impl Into<String>) {
        self.error.get_or_insert_with(|| reason.into());
    }

    fn push_text(&mut self, text: &str) {
        if let Some(child) = self.open_child.as_mut() {
            child.text.push_str(text);
        }
    }

    fn first(&self, variants: &[Variant]) -> Option<String> {
        variants.iter().find_map(|&(ns, local, slot)| {
            let mut matching = self
                .children
                .iter()
                .filter(|c| c.ns == ns && c.local == local)
                .peekable();
            matching.peek()?;
            match slot {
                Slot::Text => matching.next().map(|c| c.text.clone()),
                Slot::Href => {
                    let links: Vec<&Child> = matching.filter(|c| c.href.is_some()).collect();
                    links
                        .iter()
                        .find(|c| matches!(c.rel.as_deref(), None | Some("alternate")))
                        .or_else(|| links.first())
                        .and_then(|c| c.href.clone())
                }
            }
        })
    }

    fn finish(self) -> Result<RawArticle, ScrapeError> {
        if let Some(reason) = &self.error {
            return Err(ScrapeError::MalformedItem(reason.clone()));
        }
        let title = self
            .first(TITLE_VARIANTS)
            .map(|t| collapse_whitespace(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());
        let link = self
            .first(LINK_VARIANTS)
            .map(|l| l.trim().to_string())
            .unwrap_or_default();
        let description = self
            .first(DESCRIPTION_VARIANTS)
            .map(|d| clean_description(&d))
            .filter(|d| !d.is_empty());
        let date = self
            .first(DATE_VARIANTS)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(RawArticle {
            title: Some(title),
            link: Some(link),
            description,
            date,
        })
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        if attr.key.as_ref() == name {
            let raw = std::str::from_utf8(&attr.value).map_err(|err| err.to_string())?;
            let value = unescape(raw).map_err(|err| err.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn open_child(e: &BytesStart<'_>, ns: Ns) -> Result<Child, String> {
    Ok(Child {
        ns,
        local: local_name(e),
        text: String::new(),
        href: attribute(e, b"href")?,
        rel: attribute(e, b"rel")?,
    })
}

/// Resolve a general entity reference body (`amp`, `#38`, `#x26`).
fn resolve_entity(name: &str) -> Option<String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let resolved = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        _ => return None,
    };
    Some(resolved.to_string())
}

/// Parse a feed document fetched from `feed_url`.
///
/// Returns at most [`MAX_FEED_ITEMS`] items in document order. An item that
/// cannot be assembled is skipped without affecting the others.
///
/// # Errors
///
/// [`ScrapeError::MalformedFeed`] if the bytes are not well-formed XML.
#[instrument(level = "debug", skip_all, fields(%feed_url))]
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> Result<Vec<RawArticle>, ScrapeError> {
    let mut reader = NsReader::from_reader(bytes);
    let mut buckets: [Vec<Result<RawArticle, ScrapeError>>; 3] = Default::default();
    let mut item: Option<ItemBuilder> = None;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let (resolved, event) = reader
            .read_resolved_event()
            .map_err(|e| ScrapeError::malformed_feed(feed_url, e))?;

        match event {
            Event::Start(e) => {
                depth += 1;
                saw_root = true;
                let ns = classify(&resolved);
                match item.as_mut() {
                    None => {
                        if let Some(kind) = item_kind(ns, e.local_name().as_ref()) {
                            item = Some(ItemBuilder::new(kind, depth));
                        }
                    }
                    Some(builder) if depth == builder.depth + 1 => match open_child(&e, ns) {
                        Ok(child) => builder.open_child = Some(child),
                        Err(reason) => builder.fail(reason),
                    },
                    Some(_) => {}
                }
            }
            Event::Empty(e) => {
                saw_root = true;
                let ns = classify(&resolved);
                match item.as_mut() {
                    None => {
                        if let Some(kind) = item_kind(ns, e.local_name().as_ref()) {
                            let empty = ItemBuilder::new(kind, depth + 1);
                            buckets[kind as usize].push(empty.finish());
                        }
                    }
                    Some(builder) if depth == builder.depth => match open_child(&e, ns) {
                        Ok(child) => builder.children.push(child),
                        Err(reason) => builder.fail(reason),
                    },
                    Some(_) => {}
                }
            }
            Event::Text(e) => {
                if let Some(builder) = item.as_mut() {
                    match std::str::from_utf8(&e).map_err(|err| err.to_string()).and_then(
                        |raw| unescape(raw).map(|s| s.into_owned()).map_err(|err| err.to_string()),
                    ) {
                        Ok(text) => builder.push_text(&text),
                        Err(reason) => builder.fail(reason),
                    }
                }
            }
            Event::CData(e) => {
                if let Some(builder) = item.as_mut() {
                    builder.push_text(&String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if let Some(builder) = item.as_mut() {
                    let name = String::from_utf8_lossy(&e).into_owned();
                    match resolve_entity(&name) {
                        Some(text) => builder.push_text(&text),
                        None => builder.fail(format!("unknown entity &{name};")),
                    }
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(ScrapeError::malformed_feed(feed_url, "unbalanced end tag"));
                }
                let closes_item = item.as_ref().is_some_and(|b| b.depth == depth);
                if closes_item {
                    if let Some(done) = item.take() {
                        let kind = done.kind;
                        buckets[kind as usize].push(done.finish());
                    }
                } else if let Some(builder) = item.as_mut() {
                    if depth == builder.depth + 1 {
                        if let Some(child) = builder.open_child.take() {
                            builder.children.push(child);
                        }
                    }
                }
                depth -= 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ScrapeError::malformed_feed(feed_url, "no root element"));
    }
    if depth != 0 {
        return Err(ScrapeError::malformed_feed(feed_url, "unexpected end of document"));
    }

    let Some(kind) = ITEM_KINDS
        .into_iter()
        .find(|kind| !buckets[*kind as usize].is_empty())
    else {
        debug!("Feed contains no items");
        return Ok(Vec::new());
    };
    let found = std::mem::take(&mut buckets[kind as usize]);
    debug!(?kind, count = found.len(), "Collected feed items");

    let articles = found
        .into_iter()
        .take(MAX_FEED_ITEMS)
        .filter_map(|result| match result {
            Ok(article) => Some(article),
            Err(e) => {
                warn!(error = %e, "Skipping feed item");
                None
            }
        })
        .collect();
    Ok(articles)
}
