//! Structure-aware chunking for long civic documents.
//!
//! Chunk boundaries follow document structure rather than token windows:
//!
//! - Section headers: lines written mostly in uppercase (`BOARD OF ESTIMATES`, `NEW BUSINESS`)
//!   open a new section. Whole sections are packed into chunks until the next one would overflow
//!   the budget, which keeps agendas and reports topically coherent.
//! - Paragraphs: when header splitting yields a single chunk, blank-line-delimited paragraphs are
//!   packed instead.
//! - Oversized units are emitted whole. Downstream model calls truncate anything beyond the
//!   model's input window.
//!
//! Sizes are expressed in model tokens and converted with a fixed ratio of
//! [`CHARS_PER_TOKEN`] characters per token.

use super::types::{Chunk, ChunkingError};

/// Approximate characters per model token.
pub const CHARS_PER_TOKEN: usize = 4;

const MIN_HEADER_CHARS: usize = 10;

/// Split normalized text into ordered chunks of at most `max_tokens` (approximate) each.
///
/// Returns an empty vector for blank input. Output is deterministic for identical input and
/// ordinals start at zero and increase by one.
pub fn chunk_text(text: &str, max_tokens: usize) -> Result<Vec<Chunk>, ChunkingError> {
    if max_tokens == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
    let sections = split_sections(text);
    let mut packed = pack_units(&sections, max_chars, "\n");
    if packed.len() <= 1 {
        let paragraphs = split_paragraphs(text);
        packed = pack_units(&paragraphs, max_chars, "\n\n");
    }
    tracing::trace!(chunks = packed.len(), max_chars, "Chunked document");

    Ok(packed
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk { text, ordinal })
        .collect())
}

/// Whether a line reads as a section header.
pub(crate) fn is_section_header(line: &str) -> bool {
    let line = line.trim();
    if line.chars().count() < MIN_HEADER_CHARS {
        return false;
    }
    let Some(first) = line.chars().next() else {
        return false;
    };
    if !first.is_ascii_uppercase() {
        return false;
    }

    let mut letters = 0usize;
    let mut upper = 0usize;
    for c in line.chars() {
        if c.is_alphabetic() {
            letters += 1;
            if c.is_uppercase() {
                upper += 1;
            }
        } else if !(c.is_whitespace() || c.is_ascii_digit() || "&-:,.'/()".contains(c)) {
            return false;
        }
    }
    letters * 2 >= line.chars().count() && upper * 10 >= letters * 9
}

fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_section_header(line) && current.iter().any(|l| !l.trim().is_empty()) {
            sections.push(current.join("\n"));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        sections.push(current.join("\n"));
    }

    sections
        .into_iter()
        .map(|section| section.trim().to_string())
        .filter(|section| !section.is_empty())
        .collect()
}

fn split_paragraphs(text: &str) -> Vec<String> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

/// Greedily pack adjoining units into chunks no larger than `max_chars`.
///
/// A unit that alone exceeds the budget becomes its own chunk.
fn pack_units(units: &[String], max_chars: usize, separator: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for unit in units {
        let unit_chars = unit.chars().count();
        let joined_chars = if current.is_empty() {
            unit_chars
        } else {
            current_chars + separator.len() + unit_chars
        };

        if !current.is_empty() && joined_chars > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push_str(separator);
            current_chars += separator.len();
        }
        current.push_str(unit);
        current_chars += unit_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::normalize::normalize_text;

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn chunk_text_handles_empty_input() {
        assert!(chunk_text("", 16).expect("chunks").is_empty());
        assert!(chunk_text("  \n\n ", 16).expect("chunks").is_empty());
    }

    #[test]
    fn chunk_text_rejects_zero_chunk_size() {
        assert_eq!(chunk_text("hello", 0), Err(ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn header_detection_requires_uppercase_lines_of_minimum_length() {
        assert!(is_section_header("PUBLIC HEARINGS"));
        assert!(is_section_header("ITEM 4: NEW BUSINESS"));
        assert!(!is_section_header("SHORT"));
        assert!(!is_section_header("Public Hearings and Comment"));
        assert!(!is_section_header("$2,500,000 TOTAL"));
    }

    #[test]
    fn splits_on_section_headers_when_present() {
        let text = "CONSENT AGENDA ITEMS\nApprove the minutes of the prior session.\nAccept the audit report.\n\
                    PUBLIC HEARINGS\nHearing on the proposed zoning ordinance for the east district.";
        let chunks = chunk_text(text, 20).expect("chunks");
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.starts_with("CONSENT AGENDA ITEMS"));
        assert!(chunks[1].text.starts_with("PUBLIC HEARINGS"));
    }

    #[test]
    fn falls_back_to_paragraphs_without_headers() {
        let text = "First paragraph about the budget.\n\nSecond paragraph about housing.\n\nThird paragraph about transit.";
        let chunks = chunk_text(text, 10).expect("chunks");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, "Second paragraph about housing.");
    }

    #[test]
    fn packs_small_paragraphs_together() {
        let text = "One.\n\nTwo.\n\nThree.";
        let chunks = chunk_text(text, 100).expect("chunks");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "One.\n\nTwo.\n\nThree.");
    }

    #[test]
    fn oversized_unit_is_emitted_whole() {
        let long = "word ".repeat(100);
        let text = format!("{}\n\nshort tail", long.trim());
        let chunks = chunk_text(&text, 5).expect("chunks");
        assert_eq!(chunks.len(), 2);
        assert_eq!(words(&chunks[0].text).len(), 100);
        assert_eq!(chunks[1].text, "short tail");
    }

    #[test]
    fn ordinals_increase_and_concatenation_reconstructs_text() {
        let raw = "INTRODUCTION AND PURPOSE\nThe council met.\n\nIt discussed the budget at length.\n\
                   FINANCIAL MATTERS\nA $2.5 million bond was approved.\n\nThe vote was 5-2.\n\
                   CLOSING REMARKS\nThe meeting adjourned.";
        let normalized = normalize_text(raw);
        let chunks = chunk_text(&normalized, 12).expect("chunks");
        assert!(chunks.len() > 1);
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, expected);
        }
        let rebuilt = chunks
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(words(&normalize_text(&rebuilt)), words(&normalized));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Alpha paragraph.\n\nBeta paragraph.\n\nGamma paragraph.";
        assert_eq!(chunk_text(text, 4), chunk_text(text, 4));
    }
}
