//! Structured Agenda Synthesizer.
//!
//! Itemized board agendas list one action per line (`AB-25-001 - Agency - Category - What`).
//! Generic summarizers flatten those into noise, so agenda documents get a dedicated narrative:
//! how many items, which themes dominate, who presents most, where the money goes, and which
//! items are likely to draw debate.

pub mod vocabulary;

pub use vocabulary::AgendaVocabulary;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ITEM_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,4}-\d{2}-\d+").expect("valid agenda code pattern"));
static PAGINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P\s*\d+(?:-\d+)?\s+").expect("valid pagination pattern"));
static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+-\s+").expect("valid field separator pattern"));
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$[\d,]+(?:\.\d+)?(?:\s?(?:million|billion))?").expect("valid amount pattern")
});

const TOP_THEME_SENTENCE: usize = 4;
const TOP_THEME_TOPICS: usize = 5;
const TOP_AGENCIES: usize = 3;
const TOP_AMOUNTS: usize = 3;
const MAX_DEBATE_ITEMS: usize = 4;
const MAX_NOTABLE_ITEMS: usize = 3;
const MAX_TOPICS: usize = 8;

/// One coded line of an itemized agenda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaItem {
    /// Item code such as `AB-25-001`.
    pub code: String,
    /// Presenting agency, possibly empty.
    pub agency: String,
    /// Agenda category, possibly empty.
    pub category: String,
    /// Free-text description, possibly empty.
    pub description: String,
    /// The cleaned source line.
    pub line: String,
}

/// Frequency counters over a document's agenda items.
///
/// Iteration order is first appearance, which also breaks ties in the `top_*` rankings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeAggregate {
    agencies: IndexMap<String, usize>,
    categories: IndexMap<String, usize>,
    themes: IndexMap<String, usize>,
    keyword_hits: IndexMap<String, usize>,
}

impl ThemeAggregate {
    /// Most frequent agencies.
    pub fn top_agencies(&self, n: usize) -> Vec<(&str, usize)> {
        most_common(&self.agencies, n)
    }

    /// Most frequent categories.
    pub fn top_categories(&self, n: usize) -> Vec<(&str, usize)> {
        most_common(&self.categories, n)
    }

    /// Most frequent headline themes (operational themes excluded).
    pub fn top_themes(&self, n: usize) -> Vec<(&str, usize)> {
        most_common(&self.themes, n)
    }

    /// Items mentioning `theme`, operational themes included.
    pub fn keyword_hits(&self, theme: &str) -> usize {
        self.keyword_hits.get(theme).copied().unwrap_or(0)
    }
}

fn most_common(counts: &IndexMap<String, usize>, n: usize) -> Vec<(&str, usize)> {
    let mut ranked: Vec<(&str, usize)> = counts
        .iter()
        .map(|(key, count)| (key.as_str(), *count))
        .collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));
    ranked.truncate(n);
    ranked
}

/// Narrative summary of an itemized agenda.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaSummary {
    /// Lead sentence, followed by bulleted detail lines when there are several.
    pub summary: String,
    /// Up to eight topic labels: title-cased themes, then top agencies.
    pub topics: Vec<String>,
    /// Number of agenda items parsed.
    pub item_count: usize,
    /// Counters behind the narrative.
    #[serde(skip)]
    pub aggregate: ThemeAggregate,
}

#[derive(Debug)]
struct AmountHighlight<'a> {
    item: &'a AgendaItem,
    amount_text: String,
    value: f64,
}

/// Turns itemized agendas into a short thematic narrative.
#[derive(Debug, Clone, Default)]
pub struct AgendaSynthesizer {
    vocabulary: AgendaVocabulary,
}

impl AgendaSynthesizer {
    /// Synthesizer using `vocabulary` instead of the production tables.
    pub fn with_vocabulary(vocabulary: AgendaVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Parse every agenda-coded line of `text`.
    pub fn parse_items(&self, text: &str) -> Vec<AgendaItem> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(parse_line)
            .collect()
    }

    /// Summarize `text` as an agenda held on `date_label`.
    ///
    /// Returns `None` when no line carries an agenda item code, meaning the document is not an
    /// itemized agenda.
    pub fn synthesize(&self, text: &str, date_label: &str) -> Option<AgendaSummary> {
        let items = self.parse_items(text);
        if items.is_empty() {
            return None;
        }

        let aggregate = self.aggregate(&items);
        let mut supporting = Vec::new();
        supporting.extend(self.theme_sentence(&aggregate));
        supporting.extend(presenters_sentence(&aggregate));
        supporting.extend(self.funding_sentence(&items));
        supporting.extend(self.debate_sentence(&items));

        let noun = if items.len() == 1 { "item" } else { "items" };
        let lead = format!(
            "{} on {} reviews {} agenda {noun}.",
            self.vocabulary.meeting_label,
            date_label,
            items.len()
        );
        let summary = if supporting.len() > 1 {
            let bullets: Vec<String> = supporting.iter().map(|s| format!("- {s}")).collect();
            format!("{lead}\n{}", bullets.join("\n"))
        } else {
            std::iter::once(lead)
                .chain(supporting)
                .collect::<Vec<_>>()
                .join(" ")
        };

        let topics = self.topics(&aggregate);
        tracing::debug!(items = items.len(), topics = topics.len(), "Synthesized agenda summary");
        Some(AgendaSummary {
            summary,
            topics,
            item_count: items.len(),
            aggregate,
        })
    }

    fn aggregate(&self, items: &[AgendaItem]) -> ThemeAggregate {
        let mut aggregate = ThemeAggregate::default();
        for item in items {
            if !item.agency.is_empty() {
                *aggregate.agencies.entry(item.agency.clone()).or_insert(0) += 1;
            }
            if !item.category.is_empty() {
                *aggregate.categories.entry(item.category.clone()).or_insert(0) += 1;
            }
            for theme in self.vocabulary.themes_in(&item.line.to_lowercase()) {
                *aggregate.keyword_hits.entry(theme.to_string()).or_insert(0) += 1;
                if !self.vocabulary.is_operational_theme(theme) {
                    *aggregate.themes.entry(theme.to_string()).or_insert(0) += 1;
                }
            }
        }
        aggregate
    }

    fn theme_sentence(&self, aggregate: &ThemeAggregate) -> Option<String> {
        let ranked = if aggregate.themes.is_empty() {
            aggregate.top_categories(TOP_THEME_SENTENCE)
        } else {
            aggregate.top_themes(TOP_THEME_SENTENCE)
        };
        let phrases: Vec<String> = ranked
            .into_iter()
            .filter_map(|(theme, count)| {
                let label = display_theme(theme);
                if label.is_empty() {
                    return None;
                }
                let label = if count == 1 { singular(&label) } else { label };
                Some(format!("{count} {label}"))
            })
            .collect();
        (!phrases.is_empty()).then(|| format!("Key themes include {}.", format_list(&phrases)))
    }

    fn funding_sentence(&self, items: &[AgendaItem]) -> Option<String> {
        let mut highlights: Vec<AmountHighlight<'_>> = items
            .iter()
            .filter(|item| !self.vocabulary.mentions_operational_term(&item.category))
            .filter_map(largest_amount)
            .collect();
        highlights.sort_by(|left, right| right.value.total_cmp(&left.value));

        let entries: Vec<String> = highlights
            .iter()
            .take(TOP_AMOUNTS)
            .map(|highlight| {
                let item = highlight.item;
                let context = descriptor(item);
                let agency_label = first_non_empty(&[&item.agency, &item.category]);
                let snippet = if !agency_label.is_empty() && !context.contains(agency_label) {
                    format!("{agency_label} - {context}")
                } else {
                    context
                };
                format!("{snippet} ({})", highlight.amount_text)
            })
            .collect();
        (!entries.is_empty())
            .then(|| format!("Largest funding items: {}.", format_list(&entries)))
    }

    fn debate_sentence(&self, items: &[AgendaItem]) -> Option<String> {
        let mut highlights: Vec<String> = Vec::new();
        for item in items {
            let combined = [&item.description, &item.category, &item.agency]
                .iter()
                .filter(|field| !field.is_empty())
                .map(|field| field.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if !self.vocabulary.is_debate_topic(&combined) {
                continue;
            }
            let label = descriptor(item);
            if self.vocabulary.mentions_operational_term(&label) || highlights.contains(&label) {
                continue;
            }
            highlights.push(label);
            if highlights.len() >= MAX_DEBATE_ITEMS {
                break;
            }
        }
        if !highlights.is_empty() {
            return Some(format!("Debate focuses on {}.", format_list(&highlights)));
        }

        let notable: Vec<String> = items
            .iter()
            .take(MAX_NOTABLE_ITEMS)
            .filter_map(|item| {
                let description = strip_amounts(&item.description);
                let text = first_non_empty(&[&description, &item.category]);
                if text.is_empty() {
                    return None;
                }
                if !item.agency.is_empty() && !text.contains(item.agency.as_str()) {
                    Some(format!("{} - {text}", item.agency))
                } else {
                    Some(text.to_string())
                }
            })
            .collect();
        (!notable.is_empty())
            .then(|| format!("Notable agenda items include {}.", format_list(&notable)))
    }

    fn topics(&self, aggregate: &ThemeAggregate) -> Vec<String> {
        let themes: Vec<&str> = if aggregate.themes.is_empty() {
            aggregate
                .top_categories(TOP_THEME_TOPICS)
                .into_iter()
                .map(|(category, _)| category)
                .filter(|category| !self.vocabulary.mentions_operational_term(category))
                .collect()
        } else {
            aggregate
                .top_themes(TOP_THEME_TOPICS)
                .into_iter()
                .map(|(theme, _)| theme)
                .collect()
        };

        let candidates = themes
            .into_iter()
            .map(|theme| title_case(&display_theme(theme)))
            .chain(
                aggregate
                    .top_agencies(TOP_AGENCIES)
                    .into_iter()
                    .map(|(agency, _)| agency.to_string()),
            );

        let mut topics: Vec<String> = Vec::new();
        for topic in candidates {
            if !topic.is_empty() && !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        topics.truncate(MAX_TOPICS);
        topics
    }
}

fn presenters_sentence(aggregate: &ThemeAggregate) -> Option<String> {
    let agencies: Vec<String> = aggregate
        .top_agencies(TOP_AGENCIES)
        .into_iter()
        .map(|(agency, _)| agency.to_string())
        .collect();
    (!agencies.is_empty()).then(|| format!("Frequent presenters: {}.", format_list(&agencies)))
}

fn parse_line(raw: &str) -> Option<AgendaItem> {
    let without_page = PAGINATION.replace(raw, "");
    let cleaned = without_page.trim_matches(|c: char| c == ' ' || c == '-' || c == '\u{2022}');
    if cleaned.is_empty() || !ITEM_CODE.is_match(cleaned) {
        return None;
    }

    let mut fields = FIELD_SEPARATOR
        .split(cleaned)
        .map(str::trim)
        .filter(|field| !field.is_empty());
    let mut next = || fields.next().unwrap_or_default().to_string();
    Some(AgendaItem {
        code: next(),
        agency: next(),
        category: next(),
        description: next(),
        line: cleaned.to_string(),
    })
}

/// Largest currency amount on the item's line, by normalized value.
fn largest_amount(item: &AgendaItem) -> Option<AmountHighlight<'_>> {
    AMOUNT
        .find_iter(&item.line)
        .map(|found| AmountHighlight {
            item,
            amount_text: found.as_str().to_string(),
            value: amount_value(found.as_str()),
        })
        .max_by(|left, right| left.value.total_cmp(&right.value))
}

/// Numeric value of a matched amount, with `million`/`billion` applied.
fn amount_value(amount: &str) -> f64 {
    let lowered = amount.to_lowercase().replace(['$', ','], "");
    let (number, multiplier) = if let Some(number) = lowered.strip_suffix("million") {
        (number, 1e6)
    } else if let Some(number) = lowered.strip_suffix("billion") {
        (number, 1e9)
    } else {
        (lowered.as_str(), 1.0)
    };
    number.trim().parse::<f64>().map(|value| value * multiplier).unwrap_or(0.0)
}

fn strip_amounts(text: &str) -> String {
    let stripped = AMOUNT.replace_all(text, "");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '-' | '(' | ')') || c.is_whitespace())
        .to_string()
}

/// Most specific label for an item, without dollar amounts.
fn descriptor(item: &AgendaItem) -> String {
    let description = strip_amounts(&item.description);
    first_non_empty(&[&description, &item.category, &item.agency, &item.code]).to_string()
}

fn first_non_empty<'a>(candidates: &[&'a String]) -> &'a str {
    candidates
        .iter()
        .find(|candidate| !candidate.is_empty())
        .map(|candidate| candidate.as_str())
        .unwrap_or_default()
}

fn display_theme(label: &str) -> String {
    label
        .replace('/', " and ")
        .replace(" - ", " ")
        .trim()
        .to_lowercase()
}

fn singular(label: &str) -> String {
    match label.strip_suffix('s') {
        Some(stem) if !stem.ends_with('s') => stem.to_string(),
        _ => label.to_string(),
    }
}

fn title_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join as `a`, `a and b`, or `a, b, and c`.
fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}
