//! Structural queries over raw HTML.
//!
//! Everything here is best effort: malformed or unexpected markup yields empty
//! text, `None` or an empty list, never an error.

use itertools::Itertools;
use scraper::{ElementRef, Html, Node, Selector};

const ELLIPSIS: &str = "...";

/// A link found in a page, with the text of its parent element for context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
    pub context: String,
}

/// Plain text of `html` with script and style content removed, whitespace
/// collapsed to single spaces and truncated to `max_length` characters.
pub fn extract_text(html: &str, max_length: usize) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| matches!(el.name(), "script" | "style"))
                });
                (!hidden).then_some(&**text)
            }
            _ => None,
        })
        .flat_map(str::split_whitespace)
        .join(" ");

    truncate(&text, max_length)
}

/// Cuts `text` to `max_length` characters and appends `...` when anything was
/// removed.
pub fn truncate(text: &str, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

pub fn find_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;
    let text = collapsed_text(title);
    (!text.is_empty()).then_some(text)
}

pub fn find_meta_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="description"]"#).ok()?;
    let meta = document.select(&selector).next()?;
    meta.value().attr("content").map(|content| content.trim().to_string())
}

/// Outer HTML of the first `<p>` element, if any.
pub fn find_first_paragraph(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").ok()?;
    document.select(&selector).next().map(|p| p.html())
}

/// All `<a href>` elements in document order.
pub fn find_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| {
            let href = link.value().attr("href")?.to_string();
            let text = collapsed_text(link);
            let context = link
                .parent()
                .and_then(ElementRef::wrap)
                .map(collapsed_text)
                .unwrap_or_default();
            Some(Anchor { href, text, context })
        })
        .collect()
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).join(" ")
}
