
use tracing::{debug, info};

use crate::chunking::{self, Chunk};
use crate::config::{Config, PipelineConfig};
use crate::embeddings::{Embedder, OpenAiEmbeddings};
use crate::index::VectorIndex;
use crate::search::{SearchApiClient, SearchProvider};
use crate::synthesis::{OpenAiChat, Synthesizer};
use crate::{AnswerError, Result};

/// Policy values governing one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub chunk_max_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub top_k: usize,
}

impl Default for PipelineOptions {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_max_tokens: chunking::DEFAULT_MAX_TOKENS,
            chunk_overlap_tokens: chunking::DEFAULT_OVERLAP_TOKENS,
            top_k: crate::index::DEFAULT_TOP_K,
        }
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    #[inline]
    fn from(config: &PipelineConfig) -> Self {
        Self {
            chunk_max_tokens: config.chunk_max_tokens,
            chunk_overlap_tokens: config.chunk_overlap_tokens,
            top_k: config.top_k,
        }
    }
}

/// The synthesized answer for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    pub text: String,
}

/// Composes acquisition, chunking, embedding, retrieval, and synthesis for
/// one request at a time. Each run owns its documents, chunks, and vector
/// index exclusively; nothing is shared across runs and nothing survives a
/// run, so concurrent runs are fully isolated. Stages execute in order and
/// the first failure aborts the rest; nothing is retried.
pub struct Pipeline {
    search: Box<dyn SearchProvider>,
    embedder: Embedder,
    synthesizer: Synthesizer,
    options: PipelineOptions,
}

impl Pipeline {
    #[inline]
    pub fn new(
        search: Box<dyn SearchProvider>,
        embedder: Embedder,
        synthesizer: Synthesizer,
        options: PipelineOptions,
    ) -> Result<Self> {
        if options.chunk_max_tokens == 0 {
            return Err(AnswerError::Configuration(
                "Chunk size must be at least one token".to_string(),
            ));
        }
        if options.chunk_overlap_tokens >= options.chunk_max_tokens {
            return Err(AnswerError::Configuration(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                options.chunk_overlap_tokens, options.chunk_max_tokens
            )));
        }
        if options.top_k == 0 {
            return Err(AnswerError::Configuration(
                "Retrieval count must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            search,
            embedder,
            synthesizer,
            options,
        })
    }

    /// Build a pipeline wired to the real external capabilities.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let search = Box::new(SearchApiClient::new(&config.search)?);
        let embedder = Embedder::new(
            Box::new(OpenAiEmbeddings::new(&config.openai)?),
            config.openai.embedding_batch_size,
        )?;
        let synthesizer = Synthesizer::new(Box::new(OpenAiChat::new(&config.openai)?));

        Self::new(
            search,
            embedder,
            synthesizer,
            PipelineOptions::from(&config.pipeline),
        )
    }

    /// Run the full pipeline for one `(question, query)` pair: acquire
    /// documents for `query`, chunk and embed them into a fresh index,
    /// retrieve the chunks most similar to `question`, and synthesize an
    /// answer grounded in them.
    #[inline]
    pub fn run(&self, question: &str, query: &str) -> Result<AnswerResult> {
        info!("Answering question using search query: {}", query);

        let documents = self.search.search(query)?;
        if documents.is_empty() {
            return Err(AnswerError::Acquisition(format!(
                "Search returned no documents for query: {}",
                query
            )));
        }
        debug!("Acquired {} documents", documents.len());

        let chunks = chunking::split_documents(
            &documents,
            self.options.chunk_max_tokens,
            self.options.chunk_overlap_tokens,
        )?;
        if chunks.is_empty() {
            return Err(AnswerError::Acquisition(
                "Acquired documents contained no text to answer from".to_string(),
            ));
        }

        let embedded = self.embedder.embed_chunks(chunks)?;
        let index = VectorIndex::build(embedded);

        let query_vector = self.embedder.embed_query(question)?;
        let retrieved = index.query(&query_vector, self.options.top_k);
        debug!("Retrieved {} chunks for synthesis", retrieved.len());

        let context: Vec<Chunk> = retrieved.into_iter().map(|scored| scored.chunk).collect();
        let text = self.synthesizer.synthesize(question, &context)?;

        info!("Synthesized answer ({} chars)", text.len());
        Ok(AnswerResult { text })
    }
}
