//! PDF text layer extraction.
//!
//! Page content streams are walked operator by operator so that every visual line of text ends
//! up on its own line: `T*`, `'`, `"`, `ET`, and vertical `Td`/`TD` moves start a new line, while
//! horizontal moves and wide `TJ` gaps become spaces. Pages whose strings need a font's own
//! encoding fall back to lopdf's font-aware extraction.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};

use crate::processing::normalize::{normalize_text, truncate_at_word_boundary};

const PAGE_SEPARATOR: &str = "\n\n";
/// `TJ` adjustments at or below this (thousandths of an em) read as a word gap.
const WORD_GAP_ADJUSTMENT: f32 = -200.0;

/// Text pulled from a PDF plus how much of it was decoded.
#[derive(Debug)]
pub(crate) struct ExtractedPdf {
    pub(crate) text: String,
    pub(crate) pages_read: usize,
    pub(crate) total_pages: usize,
}

/// Decode `bytes` and extract up to `max_pages` pages, stopping once `max_chars` is reached.
///
/// Pages whose text layer cannot be decoded are skipped.
pub(crate) fn extract_pdf_text(
    bytes: &[u8],
    max_pages: usize,
    max_chars: usize,
) -> Result<ExtractedPdf, lopdf::Error> {
    let document = Document::load_mem(bytes)?;
    let pages: Vec<(u32, ObjectId)> = document.get_pages().into_iter().collect();
    let total_pages = pages.len();

    let texts = pages
        .into_iter()
        .take(max_pages)
        .map(|(number, page_id)| match page_text(&document, number, page_id) {
            Ok(text) => text,
            Err(error) => {
                tracing::debug!(page = number, error = %error, "Skipping unreadable page");
                String::new()
            }
        });
    let (text, pages_read) = collect_pages(texts, max_chars);

    Ok(ExtractedPdf {
        text,
        pages_read,
        total_pages,
    })
}

fn page_text(document: &Document, number: u32, page_id: ObjectId) -> Result<String, lopdf::Error> {
    let content = Content::decode(&document.get_page_content(page_id)?)?;
    let text = text_from_operations(&content.operations);
    if looks_garbled(&text) {
        tracing::trace!(page = number, "Using font-aware extraction");
        return document.extract_text(&[number]);
    }
    Ok(text)
}

/// Text shown by a content stream, one line per text line.
pub(crate) fn text_from_operations(operations: &[Operation]) -> String {
    let mut text = String::new();
    for operation in operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "Tj" => push_shown(&mut text, operands.first()),
            "TJ" => {
                let Some(Object::Array(items)) = operands.first() else {
                    continue;
                };
                for item in items {
                    match item {
                        Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                        other => {
                            if other
                                .as_float()
                                .is_ok_and(|adjustment| adjustment <= WORD_GAP_ADJUSTMENT)
                            {
                                push_space(&mut text);
                            }
                        }
                    }
                }
            }
            "'" => {
                break_line(&mut text);
                push_shown(&mut text, operands.first());
            }
            "\"" => {
                break_line(&mut text);
                push_shown(&mut text, operands.get(2));
            }
            "T*" | "ET" => break_line(&mut text),
            "Td" | "TD" => {
                let vertical = operands
                    .get(1)
                    .and_then(|operand| operand.as_float().ok())
                    .unwrap_or(0.0);
                if vertical.abs() < f32::EPSILON {
                    push_space(&mut text);
                } else {
                    break_line(&mut text);
                }
            }
            "Tm" => push_space(&mut text),
            _ => {}
        }
    }
    text
}

fn push_shown(text: &mut String, operand: Option<&Object>) {
    if let Some(Object::String(bytes, _)) = operand {
        text.push_str(&decode_pdf_string(bytes));
    }
}

fn break_line(text: &mut String) {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
}

fn push_space(text: &mut String) {
    if !text.is_empty() && !text.ends_with(char::is_whitespace) {
        text.push(' ');
    }
}

/// UTF-16BE when marked with a byte order mark, else UTF-8, else one byte per character.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(b"\xFE\xFF") {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        return char::decode_utf16(units)
            .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&byte| char::from(byte)).collect(),
    }
}

/// Composite-font strings decode to control characters without the font's encoding.
fn looks_garbled(text: &str) -> bool {
    let visible = text.chars().filter(|c| !c.is_whitespace()).count();
    let control = text
        .chars()
        .filter(|c| c.is_control() && !c.is_whitespace())
        .count();
    visible > 0 && control * 4 > visible
}

/// Normalize and join pages until `max_chars` is reached, then cap the result.
///
/// `pages` is consumed lazily so pages past the cap are never decoded. Returns the text and
/// the number of pages pulled from the iterator.
pub(crate) fn collect_pages(
    pages: impl IntoIterator<Item = String>,
    max_chars: usize,
) -> (String, usize) {
    let mut parts = Vec::new();
    let mut total_chars = 0usize;
    let mut pages_read = 0usize;

    for page in pages {
        pages_read += 1;
        let page = normalize_text(&page);
        if page.is_empty() {
            continue;
        }
        if !parts.is_empty() {
            total_chars += PAGE_SEPARATOR.len();
        }
        total_chars += page.chars().count();
        parts.push(page);
        if total_chars >= max_chars {
            break;
        }
    }

    (
        truncate_at_word_boundary(&parts.join(PAGE_SEPARATOR), max_chars),
        pages_read,
    )
}
