//! Rule-based English toolkit.

use regex::Regex;
use std::sync::LazyLock;

use super::{Entity, EntityKind, LanguageToolkit, StopWords};

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’\-.&][\p{L}\p{N}]+)*").expect("valid word pattern")
});

const MAX_PHRASE_WORDS: usize = 3;

const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "st", "no", "inc", "co", "corp", "jr", "sr", "vs", "etc", "gov",
    "sen", "rep", "dept", "ave", "blvd", "rd", "hon",
];

const HONORIFICS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "mayor", "councilmember", "councilman", "councilwoman",
    "commissioner", "senator", "delegate", "comptroller", "director", "hon",
];

const ENTITY_CONNECTORS: &[&str] = &["of", "and", "for", "the", "on"];

const ORGANIZATION_CUES: &[&str] = &[
    "department", "board", "council", "office", "agency", "commission", "authority",
    "committee", "bureau", "administration", "inc", "company", "corporation", "university",
    "school", "schools", "police", "services", "works", "division", "foundation",
];
const PLACE_CUES: &[&str] = &[
    "city", "county", "street", "avenue", "road", "park", "district", "state", "harbor",
    "square", "boulevard", "maryland", "baltimore", "annapolis",
];
const LAW_CUES: &[&str] = &[
    "act", "bill", "ordinance", "resolution", "code", "law", "amendment", "charter",
];
const EVENT_CUES: &[&str] = &[
    "hearing", "meeting", "session", "conference", "festival", "summit", "forum", "election",
];

/// Regex and vocabulary driven [`LanguageToolkit`].
#[derive(Debug, Clone)]
pub struct RuleToolkit {
    stop_words: StopWords,
}

impl Default for RuleToolkit {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleToolkit {
    /// Toolkit backed by the full English stop-word list.
    pub fn new() -> Self {
        Self::with_stop_words(StopWords::english())
    }

    /// Toolkit with a custom stop-word vocabulary.
    pub fn with_stop_words(stop_words: StopWords) -> Self {
        Self { stop_words }
    }
}

/// A word token with its byte span.
struct Span<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn spans(text: &str) -> Vec<Span<'_>> {
    WORD.find_iter(text)
        .map(|m| Span {
            start: m.start(),
            end: m.end(),
            text: m.as_str(),
        })
        .collect()
}

/// Whether only whitespace separates two adjacent tokens.
fn joined_by_space(text: &str, left: &Span<'_>, right: &Span<'_>) -> bool {
    text[left.end..right.start].trim().is_empty()
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_numeric(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_digit())
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let Some(last) = prefix.split_whitespace().last() else {
        return false;
    };
    let last = last.trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut chars = last.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        if first.is_uppercase() {
            return true;
        }
    }
    ABBREVIATIONS.contains(&last.to_lowercase().as_str())
}

fn classify(words: &[&str]) -> EntityKind {
    let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let has = |cues: &[&str]| lowered.iter().any(|w| cues.contains(&w.as_str()));
    if has(LAW_CUES) {
        EntityKind::Law
    } else if has(ORGANIZATION_CUES) {
        EntityKind::Organization
    } else if has(EVENT_CUES) {
        EntityKind::Event
    } else if has(PLACE_CUES) {
        EntityKind::Place
    } else {
        EntityKind::Other
    }
}

impl LanguageToolkit for RuleToolkit {
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0usize;
        let mut i = 0usize;

        while i < chars.len() {
            let (index, c) = chars[i];

            if c == '\n' && chars.get(i + 1).is_some_and(|(_, next)| *next == '\n') {
                push_sentence(&mut sentences, &text[start..index]);
                start = index;
                i += 2;
                continue;
            }

            if matches!(c, '.' | '!' | '?') {
                let mut j = i + 1;
                while j < chars.len() && ".!?\"'”’)".contains(chars[j].1) {
                    j += 1;
                }
                let end = chars.get(j).map(|(idx, _)| *idx).unwrap_or(text.len());
                let at_end = j >= chars.len();
                if at_end || chars[j].1.is_whitespace() {
                    let mut k = j;
                    while k < chars.len() && chars[k].1.is_whitespace() {
                        k += 1;
                    }
                    let opens_sentence = chars.get(k).is_none_or(|(_, next)| {
                        next.is_uppercase()
                            || next.is_ascii_digit()
                            || "\"'“‘(-•$".contains(*next)
                    });
                    if opens_sentence && !ends_with_abbreviation(&text[start..index]) {
                        push_sentence(&mut sentences, &text[start..end]);
                        start = end;
                    }
                }
                i = j;
                continue;
            }

            i += 1;
        }

        push_sentence(&mut sentences, &text[start..]);
        sentences
    }

    fn words<'a>(&self, text: &'a str) -> Vec<&'a str> {
        WORD.find_iter(text).map(|m| m.as_str()).collect()
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    fn noun_phrases(&self, text: &str) -> Vec<String> {
        let tokens = spans(text);
        let mut phrases = Vec::new();
        let mut run: Vec<&Span<'_>> = Vec::new();

        let mut flush = |run: &mut Vec<&Span<'_>>| {
            if !run.is_empty() {
                let keep = run.len().saturating_sub(MAX_PHRASE_WORDS);
                let words: Vec<&str> = run[keep..].iter().map(|span| span.text).collect();
                phrases.push(words.join(" "));
                run.clear();
            }
        };

        for (position, token) in tokens.iter().enumerate() {
            let breaks_run = self.is_stop_word(token.text)
                || is_numeric(token.text)
                || token.text.chars().count() < 2;
            if breaks_run {
                flush(&mut run);
                continue;
            }
            if let Some(previous) = position.checked_sub(1).map(|p| &tokens[p]) {
                if !run.is_empty() && !joined_by_space(text, previous, token) {
                    flush(&mut run);
                }
            }
            run.push(token);
        }
        flush(&mut run);
        phrases
    }

    fn entities(&self, text: &str) -> Vec<Entity> {
        let tokens = spans(text);
        let mut entities = Vec::new();
        let mut i = 0usize;

        while i < tokens.len() {
            let opener = tokens[i].text;
            if !is_capitalized(opener) || is_numeric(opener) || self.is_stop_word(opener) {
                i += 1;
                continue;
            }

            let mut words = vec![tokens[i].text];
            let mut last = i;
            let mut j = i + 1;
            while j < tokens.len() {
                let token = &tokens[j];
                let previous = &tokens[j - 1];
                let after_honorific = j - 1 == i
                    && HONORIFICS.contains(&previous.text.to_lowercase().as_str())
                    && text[previous.end..token.start].trim() == ".";
                if !after_honorific && !joined_by_space(text, previous, token) {
                    break;
                }
                if is_capitalized(token.text) && !is_numeric(token.text) {
                    words.push(token.text);
                    last = j;
                    j += 1;
                } else if ENTITY_CONNECTORS.contains(&token.text.to_lowercase().as_str()) {
                    words.push(token.text);
                    j += 1;
                } else {
                    break;
                }
            }
            words.truncate(last - i + 1);

            let is_person = words.len() >= 2
                && HONORIFICS.contains(&words[0].to_lowercase().as_str())
                && words[1..].iter().all(|w| is_capitalized(w));
            let entity = if is_person {
                Entity {
                    text: words[1..].join(" "),
                    kind: EntityKind::Person,
                }
            } else {
                Entity {
                    text: words.join(" "),
                    kind: classify(&words),
                }
            };
            entities.push(entity);
            i = last + 1;
        }

        entities
    }
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}
