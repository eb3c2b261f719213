//! Item extraction from course page markup.
//!
//! Turns raw markup into the normalized item set the differ works on,
//! using the CSS selectors configured in `[markers]`.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Item, MarkerConfig};

/// Kind assigned when an item carries no kind marker.
const DEFAULT_KIND: &str = "Link";

/// Extracts watched items and the page heading from course markup.
///
/// Selectors are parsed once at construction; extraction itself is a
/// total function over well-formed markup and yields an empty set when
/// nothing matches.
pub struct ItemExtractor {
    heading: Selector,
    item: Selector,
    name: Selector,
    kind: Selector,
    link: Selector,
}

impl ItemExtractor {
    /// Build an extractor from configured marker selectors.
    pub fn new(markers: &MarkerConfig) -> Result<Self> {
        Ok(Self {
            heading: parse_selector(&markers.heading_selector)?,
            item: parse_selector(&markers.item_selector)?,
            name: parse_selector(&markers.name_selector)?,
            kind: parse_selector(&markers.kind_selector)?,
            link: parse_selector(&markers.link_selector)?,
        })
    }

    /// Extract the set of watched items from page markup.
    ///
    /// Nodes without a name label are skipped; the kind defaults to
    /// `"Link"` and the link to an empty string when absent.
    pub fn extract_items(&self, html: &str) -> HashSet<Item> {
        let document = Html::parse_document(html);
        let mut items = HashSet::new();

        for node in document.select(&self.item) {
            let Some(name_el) = node.select(&self.name).next() else {
                continue;
            };
            let name = direct_text(&name_el);
            if name.is_empty() {
                continue;
            }

            let kind = name_el
                .select(&self.kind)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_KIND.to_string());

            let link = node
                .select(&self.link)
                .next()
                .and_then(|el| el.value().attr("href"))
                .unwrap_or("")
                .to_string();

            items.insert(Item { name, kind, link });
        }

        items
    }

    /// Extract the page heading text, if the heading marker is present.
    pub fn extract_heading(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let heading = document.select(&self.heading).next()?;
        let text = heading.text().collect::<String>().trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

/// Text directly under an element, excluding child elements.
///
/// The name node nests the kind marker inside it; taking only direct
/// text keeps the kind label out of the name.
fn direct_text(el: &ElementRef) -> String {
    let mut text = String::new();
    for child in el.children() {
        if let Some(t) = child.value().as_text() {
            text.push_str(t);
        }
    }
    text.trim().to_string()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
