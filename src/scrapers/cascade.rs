//! Ordered selector cascades.
//!
//! A [`Cascade`] is a table of [`Rule`]s tried in order against a scope
//! element; the first rule whose probe yields an accepted, non-empty value
//! wins. Cascades are compiled once into statics and evaluated by the pure
//! function [`Cascade::first_match`].

use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Selector};
use tracing::trace;

/// Uniform read access to a DOM element.
pub trait ElementAccess {
    /// Value of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<&str>;
    /// Visible text with whitespace collapsed.
    fn visible_text(&self) -> String;
}

impl ElementAccess for ElementRef<'_> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn visible_text(&self) -> String {
        collapse_whitespace(&self.text().collect::<Vec<_>>().join(" "))
    }
}

/// How a matched element is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The element's visible text.
    Text,
    /// The named attribute when present and non-empty, else the visible text.
    AttrOrText(&'static str),
}

impl Probe {
    pub fn read(&self, element: &impl ElementAccess) -> String {
        match self {
            Probe::Text => element.visible_text(),
            Probe::AttrOrText(name) => element
                .attribute(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element.visible_text()),
        }
    }
}

/// One step of a cascade: a CSS selector and the probe applied to its first match.
#[derive(Debug)]
pub struct Rule {
    pub pattern: &'static str,
    pub selector: Selector,
    pub probe: Probe,
}

/// An ordered list of rules with an acceptance filter.
#[derive(Debug)]
pub struct Cascade {
    rules: Vec<Rule>,
    accept: fn(&str) -> bool,
}

fn non_empty(value: &str) -> bool {
    !value.is_empty()
}

impl Cascade {
    /// Compile `(pattern, probe)` pairs. Patterns are compile-time constants;
    /// an invalid one is a programming error.
    pub fn new(rules: &[(&'static str, Probe)]) -> Self {
        let rules = rules
            .iter()
            .map(|&(pattern, probe)| Rule {
                pattern,
                selector: compile(pattern),
                probe,
            })
            .collect();
        Self {
            rules,
            accept: non_empty,
        }
    }

    /// Only accept values for which `accept` returns true (in addition to non-empty).
    pub fn accepting(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = accept;
        self
    }

    /// Evaluate the cascade inside `scope` (descendants only). For each rule,
    /// only its first matching element is probed.
    pub fn first_match(&self, scope: ElementRef<'_>) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let element = scope.select(&rule.selector).next()?;
            let value = rule.probe.read(&element);
            let accepted = !value.is_empty() && (self.accept)(&value);
            trace!(selector = rule.pattern, accepted, "Cascade rule matched");
            accepted.then_some(value)
        })
    }
}

/// Compile a static selector pattern.
pub fn compile(pattern: &'static str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("invalid selector {pattern:?}: {e}"))
}
