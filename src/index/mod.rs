
use std::cmp::Ordering;

use tracing::debug;

use crate::chunking::Chunk;
use crate::embeddings::EmbeddedChunk;

pub const DEFAULT_TOP_K: usize = 4;

/// A retrieved chunk and its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Transient in-memory vector index, scoped to a single pipeline run.
/// Built fresh per request and discarded with it; retrieval is a linear
/// cosine-similarity scan, which is plenty for an index sized to one page
/// of search results.
#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
}

impl VectorIndex {
    #[inline]
    pub fn build(embedded: Vec<EmbeddedChunk>) -> Self {
        Self { entries: embedded }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return up to `k` chunks ranked by descending cosine similarity to
    /// `query_vector`. Ties keep insertion order (stable sort); `k` larger
    /// than the index size is clamped; an empty index returns an empty
    /// result rather than an error.
    #[inline]
    pub fn query(&self, query_vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query_vector, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        debug!("Retrieved {} of {} indexed chunks", scored.len(), self.len());
        scored
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`. Returns `0.0` for empty vectors,
/// vectors of different lengths, or zero-magnitude vectors.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}
