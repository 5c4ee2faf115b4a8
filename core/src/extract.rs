//! Condenses a fetched HTML page into the handful of signals a site critique needs.

use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

const MAX_TITLE_CHARS: usize = 200;
const MAX_META_CHARS: usize = 300;
const MAX_H1: usize = 3;
const MAX_H2: usize = 5;
const MAX_BODY_CHARS: usize = 2000;

/// Elements whose text is chrome or code rather than copy.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub title: String,
    pub meta_description: String,
    pub h1: Vec<String>,
    pub h2: Vec<String>,
    /// Visible copy joined by single spaces.
    pub body_text: String,
    /// A `<button>`, or a link with a `cta` class.
    pub has_cta: bool,
}

impl PageSummary {
    /// Never fails; anything missing from the page is left empty.
    pub fn extract(html: &str) -> Self {
        let document: Html = Html::parse_document(html);

        let title: String = select(&document, "title")
            .first()
            .map(|el| truncate(el.text().collect::<String>().trim(), MAX_TITLE_CHARS))
            .unwrap_or_default();

        let meta_description: String = select(&document, r#"meta[name="description"]"#)
            .first()
            .and_then(|el| el.value().attr("content"))
            .map(|content| truncate(content, MAX_META_CHARS))
            .unwrap_or_default();

        Self {
            title,
            meta_description,
            h1: headings(&document, "h1", MAX_H1),
            h2: headings(&document, "h2", MAX_H2),
            body_text: truncate(&visible_text(&document), MAX_BODY_CHARS),
            has_cta: has_cta(&document),
        }
    }
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn headings(document: &Html, tag: &str, limit: usize) -> Vec<String> {
    select(document, tag)
        .into_iter()
        .take(limit)
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .collect()
}

fn visible_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.nodes() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped: bool = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }

        let trimmed: &str = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

fn has_cta(document: &Html) -> bool {
    if !select(document, "button").is_empty() {
        return true;
    }
    select(document, "a[class]").iter().any(|link| {
        link.value()
            .attr("class")
            .is_some_and(|class| class.to_ascii_lowercase().contains("cta"))
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
