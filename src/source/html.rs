//! Visible-text and preview extraction from HTML.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Title used when a page has no usable `<title>`.
pub const UNTITLED_PAGE: &str = "Untitled Page";

/// Elements whose contents are never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "svg", "iframe", "object", "canvas",
];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table", "td",
    "th", "tr", "ul",
];

/// What a page offers for display and generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtract {
    pub text: String,
    pub title: String,
    pub preview_image_url: Option<String>,
}

/// Extract visible text, title and preview image from a document.
///
/// `base` resolves relative image URLs.
pub fn extract_page(markup: &str, base: Option<&Url>) -> PageExtract {
    let document = Html::parse_document(markup);

    PageExtract {
        text: visible_text(&document),
        title: page_title(&document),
        preview_image_url: preview_image(&document, base),
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn page_title(document: &Html) -> String {
    document
        .select(&selector("title"))
        .next()
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNTITLED_PAGE.to_string())
}

/// Open Graph image first, then the first inline image.
fn preview_image(document: &Html, base: Option<&Url>) -> Option<String> {
    let og_image = document
        .select(&selector(r#"meta[property="og:image"], meta[name="og:image"]"#))
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty());

    let candidate = og_image.or_else(|| {
        document
            .select(&selector("img[src]"))
            .filter_map(|img| img.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
    })?;

    let resolved = base
        .and_then(|base| base.join(candidate).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| candidate.to_string());

    Some(resolved)
}

fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    walk(document.root_element(), &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines.join("\n")
}

fn walk(element: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    let block = BLOCK_ELEMENTS.contains(&name);
    if block || name == "br" {
        flush_line(lines, current);
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                current.push_str(text);
            }
            Node::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    walk(child_element, lines, current);
                }
            }
            _ => {}
        }
    }

    if block {
        flush_line(lines, current);
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = collapse_whitespace(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
