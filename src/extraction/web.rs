//! Visible text from HTML markup.

use scraper::Html;

use crate::processing::normalize::{normalize_text, truncate_at_word_boundary};

/// Elements whose text never counts as page content.
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "template",
];

/// Extract visible text from `markup`, capped at `max_chars`.
pub(crate) fn visible_text(markup: &str, max_chars: usize) -> String {
    let document = Html::parse_document(markup);
    let mut fragments: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| NON_CONTENT_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }
        let fragment = text.trim();
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
    }

    truncate_at_word_boundary(&normalize_text(&fragments.join(" ")), max_chars)
}
