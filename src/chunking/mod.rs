#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use tracing::debug;

use crate::search::Document;
use crate::{AnswerError, Result};

pub const DEFAULT_MAX_TOKENS: usize = 800;
pub const DEFAULT_OVERLAP_TOKENS: usize = 100;

/// Metadata key recording a chunk's position within its parent document.
pub const METADATA_CHUNK_INDEX: &str = "chunk_index";

/// A token-bounded slice of a single document, ready for embedding.
/// Carries a copy of the parent document's metadata plus its own index.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub source_document_id: String,
    pub chunk_index: usize,
    pub token_count: usize,
}

/// Split documents into windows of at most `max_tokens` tokens, with each
/// window overlapping the previous one by `overlap_tokens` tokens. Tokens
/// are whitespace-separated words; chunk text re-joins them with single
/// spaces, so a document's token stream is reconstructable from its chunks
/// up to whitespace normalization.
///
/// Pure function of its inputs: the same documents and parameters always
/// produce the same chunk sequence. `overlap_tokens` must be smaller than
/// `max_tokens`, otherwise the window could never advance.
#[inline]
pub fn split_documents(
    documents: &[Document],
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<Vec<Chunk>> {
    if max_tokens == 0 {
        return Err(AnswerError::Configuration(
            "Chunk size must be at least one token".to_string(),
        ));
    }
    if overlap_tokens >= max_tokens {
        return Err(AnswerError::Configuration(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap_tokens, max_tokens
        )));
    }

    let mut chunks = Vec::new();
    for document in documents {
        split_document(document, max_tokens, overlap_tokens, &mut chunks);
    }

    debug!(
        "Split {} documents into {} chunks ({} max tokens, {} overlap)",
        documents.len(),
        chunks.len(),
        max_tokens,
        overlap_tokens
    );

    Ok(chunks)
}

/// Emit the chunks for one document. Windows advance by
/// `max_tokens - overlap_tokens`; the final window may be shorter than
/// `max_tokens`. Empty documents produce no chunks.
fn split_document(
    document: &Document,
    max_tokens: usize,
    overlap_tokens: usize,
    chunks: &mut Vec<Chunk>,
) {
    let tokens: Vec<&str> = document.text.split_whitespace().collect();
    if tokens.is_empty() {
        return;
    }

    let step = max_tokens - overlap_tokens;
    let mut start = 0;
    let mut chunk_index = 0;

    loop {
        let end = (start + max_tokens).min(tokens.len());
        let window = &tokens[start..end];

        let mut metadata = document.metadata.clone();
        metadata.insert(METADATA_CHUNK_INDEX.to_string(), chunk_index.to_string());

        chunks.push(Chunk {
            text: window.join(" "),
            metadata,
            source_document_id: document.id.clone(),
            chunk_index,
            token_count: window.len(),
        });

        if end == tokens.len() {
            break;
        }
        start += step;
        chunk_index += 1;
    }
}

/// Count the whitespace-separated tokens in a text, matching the
/// tokenization used by [`split_documents`].
#[inline]
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}
