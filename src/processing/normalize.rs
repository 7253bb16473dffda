//! Whitespace cleanup and length capping shared by every reader and summarizer.

use regex::Regex;
use std::sync::LazyLock;

/// Marker appended to text cut at a character cap.
pub const ELLIPSIS: &str = "...";

static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("valid horizontal whitespace pattern"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid newline pattern"));

/// Normalize extracted text.
///
/// Drops NUL characters, converts CRLF line endings, collapses runs of horizontal whitespace to
/// a single space, trims every line, collapses three or more newlines to a blank line, and trims
/// the result. The output is a fixed point: normalizing it again returns it unchanged.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_nul = text.replace('\0', "").replace("\r\n", "\n");
    let collapsed = HORIZONTAL_WHITESPACE.replace_all(&without_nul, " ");
    let trimmed_lines = collapsed
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n");
    EXCESS_NEWLINES
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

/// Cut `text` to at most `max_chars` characters, preferring the last word boundary.
///
/// Text within the budget is returned unchanged. Truncated text ends with [`ELLIPSIS`]; when the
/// budget holds no whitespace at all the cut falls mid-word. Budgets shorter than the marker get
/// the bare cut.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let head = &text[..cut];
    if max_chars < ELLIPSIS.len() {
        return head.to_string();
    }
    let boundary = head
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(index, _)| index)
        .filter(|index| *index > 0);
    let kept = match boundary {
        Some(index) => head[..index].trim_end(),
        None => head,
    };

    let mut truncated = String::with_capacity(kept.len() + ELLIPSIS.len());
    truncated.push_str(kept);
    truncated.push_str(ELLIPSIS);
    truncated
}
