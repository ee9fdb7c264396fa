use crate::constants::{
    CATEGORY_ANCHOR_SELECTOR, INFOBOX_DATA_SELECTOR, INFOBOX_HEADER_SELECTOR,
    INFOBOX_ROW_SELECTOR, NEXT_PAGE_TEXT,
};
use crate::types::{PageReference, RawRecord};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static ANCHOR: Lazy<Selector> = Lazy::new(|| selector(CATEGORY_ANCHOR_SELECTOR));
static ANY_ELEMENT: Lazy<Selector> = Lazy::new(|| selector("*"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static INFOBOX_ROW: Lazy<Selector> = Lazy::new(|| selector(INFOBOX_ROW_SELECTOR));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| selector(INFOBOX_HEADER_SELECTOR));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| selector(INFOBOX_DATA_SELECTOR));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// A performer entry of a category index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformerLink {
    /// Entry with a resolvable detail page
    Detail { url: String, name: String },
    /// Entry without a usable target; emitted as a name-only record
    Unlinked { name: String },
}

/// What one index page yields: performer entries plus the next page, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexPage {
    pub performers: Vec<PerformerLink>,
    pub next_page: Option<PageReference>,
}

/// Parses a category index page fetched from `base`.
pub fn discover(base: &Url, html: &str) -> IndexPage {
    let document = Html::parse_document(html);

    let performers = document
        .select(&ANCHOR)
        .map(|anchor| {
            // all text under the anchor, not only its first text node
            let name = anchor.text().collect::<String>().trim().to_string();
            match anchor.value().attr("href").and_then(|href| resolve(base, href)) {
                Some(url) => PerformerLink::Detail { url, name },
                None => PerformerLink::Unlinked { name },
            }
        })
        .collect::<Vec<_>>();

    let next_page = find_next_page(&document, base);
    debug!(
        "Index {} lists {} performers, next page: {:?}",
        base,
        performers.len(),
        next_page.as_ref().map(PageReference::as_str)
    );

    IndexPage {
        performers,
        next_page,
    }
}

/// Reads the infobox rows of a performer page into a record named
/// `fallback_name`. Pages without an infobox yield the name alone.
pub fn extract(html: &str, fallback_name: &str) -> RawRecord {
    let document = Html::parse_document(html);
    let mut record = RawRecord::new(fallback_name);

    for row in document.select(&INFOBOX_ROW) {
        let label = cell_text(row, &HEADER_CELL);
        let value = cell_text(row, &DATA_CELL);
        // an empty label is kept as the "" key
        record.insert(label, value);
    }

    record
}

/// Text nodes of all matching cells joined by a space, newlines removed, trimmed
fn cell_text(row: ElementRef<'_>, cells: &Selector) -> String {
    let joined = row
        .select(cells)
        .flat_map(|cell| cell.text())
        .collect::<Vec<_>>()
        .join(" ");
    joined.replace('\n', "").trim().to_string()
}

fn find_next_page(document: &Html, base: &Url) -> Option<PageReference> {
    document
        .select(&ANY_ELEMENT)
        .filter(|el| first_text_contains(el, NEXT_PAGE_TEXT))
        .find_map(|el| {
            let href = if el.value().name() == "a" {
                el.value().attr("href")
            } else {
                el.select(&LINK).find_map(|a| a.value().attr("href"))
            };
            href.and_then(|href| resolve(base, href))
        })
        .map(PageReference::new)
}

/// Only the element's first own text node counts, so a container holding a
/// plain "(page suivante)" label after other text is not mistaken for the
/// control.
fn first_text_contains(el: &ElementRef<'_>, needle: &str) -> bool {
    el.children()
        .find_map(|child| child.value().as_text())
        .map_or(false, |text| text.contains(needle))
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}
