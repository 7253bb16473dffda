//! Keyword heuristics that rank chunks by how much civic substance they carry.
//!
//! Scores are additive: each [`KeywordCategory`] that matches a chunk contributes its weight
//! once, procedural boilerplate subtracts a penalty, and the first few chunks receive a small
//! positional bonus. Scoring is a pure function of the chunk text and ordinal.

use regex::Regex;

use super::chunking::chunk_text;
use super::types::{Chunk, ScoredChunk};

/// A keyword family and the weight it adds when a chunk matches it.
#[derive(Debug, Clone)]
pub struct KeywordCategory {
    /// Short label used in logs and tests.
    pub name: &'static str,
    /// Pattern evaluated against the chunk text.
    pub pattern: Regex,
    /// Score added on a match.
    pub weight: i32,
}

impl KeywordCategory {
    /// Build a category from a regular expression.
    pub fn new(name: &'static str, pattern: &str, weight: i32) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            weight,
        })
    }
}

/// Scores chunks and selects the most informative ones.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    categories: Vec<KeywordCategory>,
    procedural: Regex,
    procedural_penalty: i32,
    lead_chunks: usize,
    lead_bonus: i32,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        // Order matters only for readability; weights define the ranking:
        // money > decisions > policy > controversy > mandates > amendments.
        let categories = [
            (
                "monetary",
                r"(?i)\$[\d,]+(?:\.\d+)?(?:\s?(?:million|billion|thousand))?",
                10,
            ),
            (
                "decision",
                r"(?i)\b(?:vote|voted|approved|passed|rejected|opposed)\b",
                8,
            ),
            (
                "policy",
                r"(?i)\b(?:resolution|ordinance|bill|legislation|policy)\b",
                7,
            ),
            (
                "controversy",
                r"(?i)\b(?:concern|objection|oppose|controversial|debate)\b",
                6,
            ),
            ("mandate", r"(?i)\b(?:will|shall|must|require)\b", 5),
            ("amendment", r"(?i)\b(?:amend|revise|change|new|establish)\b", 4),
        ]
        .into_iter()
        .map(|(name, pattern, weight)| {
            KeywordCategory::new(name, pattern, weight).expect("valid relevance pattern")
        })
        .collect();

        let procedural = Regex::new(
            r"(?i)\b(?:call to order|pledge of allegiance|roll call|minutes approved)\b",
        )
        .expect("valid procedural pattern");

        Self::with_categories(categories, procedural)
    }
}

impl RelevanceScorer {
    /// Build a scorer from custom keyword categories and a procedural boilerplate pattern.
    pub fn with_categories(categories: Vec<KeywordCategory>, procedural: Regex) -> Self {
        Self {
            categories,
            procedural,
            procedural_penalty: 5,
            lead_chunks: 3,
            lead_bonus: 3,
        }
    }

    /// Score a single chunk.
    pub fn score(&self, chunk: &Chunk) -> i32 {
        let mut score: i32 = self
            .categories
            .iter()
            .filter(|category| category.pattern.is_match(&chunk.text))
            .map(|category| category.weight)
            .sum();
        if self.procedural.is_match(&chunk.text) {
            score -= self.procedural_penalty;
        }
        if chunk.ordinal < self.lead_chunks {
            score += self.lead_bonus;
        }
        score
    }

    /// Score every chunk and sort by descending score; ties keep document order.
    pub fn rank(&self, chunks: Vec<Chunk>) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = chunks
            .into_iter()
            .map(|chunk| {
                let score = self.score(&chunk);
                ScoredChunk { chunk, score }
            })
            .collect();
        scored.sort_by(|left, right| {
            right
                .score
                .cmp(&left.score)
                .then(left.chunk.ordinal.cmp(&right.chunk.ordinal))
        });
        scored
    }

    /// Keep the `top_n` highest-scoring chunks of `text`, joined in score order.
    ///
    /// Score order front-loads the most valuable material for length-limited summarizers.
    pub fn extract_interesting_sections(
        &self,
        text: &str,
        top_n: usize,
        max_chunk_tokens: usize,
    ) -> String {
        let chunks = match chunk_text(text, max_chunk_tokens) {
            Ok(chunks) => chunks,
            Err(error) => {
                tracing::warn!(error = %error, "Relevance filter could not chunk input");
                return String::new();
            }
        };
        let total = chunks.len();
        let selected: Vec<String> = self
            .rank(chunks)
            .into_iter()
            .take(top_n)
            .map(|scored| scored.chunk.text)
            .collect();
        tracing::debug!(total, kept = selected.len(), "Filtered interesting sections");
        selected.join("\n\n")
    }
}
