//! Visible-text helpers over `scraper` trees

use scraper::{ElementRef, Html, Node};

const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Text nodes of an element, each trimmed, empty ones dropped, joined by one space
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Page text a visitor would read: script/style contents are skipped
pub fn visible_text(html: &Html) -> String {
    let mut parts = Vec::new();

    for node in html.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_ascii_lowercase()))
            .is_some_and(|name| INVISIBLE_TAGS.contains(&name.as_str()));
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}
