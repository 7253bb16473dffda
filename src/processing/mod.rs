//! Text processing stages: normalization, chunking, and relevance scoring.

pub mod chunking;
pub mod normalize;
pub mod relevance;
pub mod types;

pub use chunking::chunk_text;
pub use normalize::{normalize_text, truncate_at_word_boundary};
pub use relevance::{KeywordCategory, RelevanceScorer};
pub use types::{Chunk, ChunkingError, ScoredChunk, SummaryResult};
