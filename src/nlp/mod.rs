//! Language toolkit abstraction plus the key phrase and topic extractors built on it.
//!
//! The weighted extractive summarizer and the key phrase extractor prefer a toolkit that
//! understands sentences, stop words, noun phrases, and named entities. Pipelines hold an
//! `Option<Arc<dyn LanguageToolkit>>`; `None` selects the toolkit-free fallback paths.

pub mod keyphrases;
mod rules;
pub mod stopwords;
pub mod topics;

pub use keyphrases::KeyPhraseExtractor;
pub use rules::RuleToolkit;
pub use stopwords::StopWords;

use crate::config::ToolkitKind;
use std::sync::Arc;

/// Category assigned to a named-entity candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Agencies, boards, companies.
    Organization,
    /// Cities, counties, streets, regions.
    Place,
    /// Named individuals.
    Person,
    /// Hearings, meetings, sessions.
    Event,
    /// Acts, bills, ordinances, codes.
    Law,
    /// Capitalized run that fits no category.
    Other,
}

/// Named-entity candidate found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Surface text as it appears in the document.
    pub text: String,
    /// Assigned category.
    pub kind: EntityKind,
}

/// Sentence, stop-word, noun-phrase, and entity analysis.
pub trait LanguageToolkit: Send + Sync {
    /// Split text into sentences in document order.
    fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Word tokens of a sentence, punctuation excluded.
    fn words<'a>(&self, text: &'a str) -> Vec<&'a str>;

    /// Whether a word carries no topical meaning.
    fn is_stop_word(&self, word: &str) -> bool;

    /// Noun-phrase candidates, each at most three words, in document order.
    fn noun_phrases(&self, text: &str) -> Vec<String>;

    /// Named-entity candidates in document order.
    fn entities(&self, text: &str) -> Vec<Entity>;
}

/// Build the toolkit selected by configuration.
pub fn build_toolkit(kind: ToolkitKind) -> Option<Arc<dyn LanguageToolkit>> {
    match kind {
        ToolkitKind::Rules => Some(Arc::new(RuleToolkit::new())),
        ToolkitKind::None => {
            tracing::info!("Language toolkit disabled; using fallback tiers");
            None
        }
    }
}
