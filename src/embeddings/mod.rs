
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chunking::Chunk;
use crate::config::OpenAiConfig;
use crate::{AnswerError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 512;

/// A chunk paired with its embedding vector. Created once per pipeline run
/// and discarded with the run; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    #[inline]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// External embedding capability. One call maps to exactly one upstream
/// request; returned vectors preserve input order.
pub trait EmbeddingProvider: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Order-preserving batching layer over an [`EmbeddingProvider`]. Slices
/// input into batches of at most `batch_size` texts to bound request count.
/// The whole call fails atomically on the first batch failure; partial
/// results are never exposed.
pub struct Embedder {
    provider: Box<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    #[inline]
    pub fn new(provider: Box<dyn EmbeddingProvider>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(AnswerError::Configuration(
                "Embedding batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            provider,
            batch_size,
        })
    }

    /// Embed texts in input order, one vector per text.
    #[inline]
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        let mut batches = 0;

        for batch in texts.chunks(self.batch_size) {
            let batch_vectors = self.provider.embed_batch(batch)?;
            if batch_vectors.len() != batch.len() {
                return Err(AnswerError::Embedding(format!(
                    "Embedding count mismatch: requested {}, received {}",
                    batch.len(),
                    batch_vectors.len()
                )));
            }
            vectors.extend(batch_vectors);
            batches += 1;
        }

        debug!("Embedded {} texts in {} batches", texts.len(), batches);
        Ok(vectors)
    }

    /// Embed a set of chunks, pairing each with its vector.
    #[inline]
    pub fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed(&texts)?;

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect())
    }

    /// Embed a single query text, e.g. the user's question for retrieval.
    #[inline]
    pub fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed(&[text.to_string()])?;
        vectors.into_iter().next().ok_or_else(|| {
            AnswerError::Embedding("Empty embedding response for query".to_string())
        })
    }
}

/// Client for the OpenAI embeddings endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddings {
    base_url: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbeddings {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AnswerError::Configuration(format!(
                "Invalid OpenAI base URL {}: {}",
                config.base_url, e
            ))
        })?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
            agent,
        })
    }
}

impl EmbeddingProvider for OpenAiEmbeddings {
    #[inline]
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.base_url.join("/v1/embeddings").map_err(|e| {
            AnswerError::Embedding(format!("Failed to build embeddings URL: {}", e))
        })?;

        let request = EmbeddingsRequest {
            model: &self.model,
            input: texts,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            AnswerError::Embedding(format!("Failed to serialize embeddings request: {}", e))
        })?;

        debug!("Requesting embeddings for {} texts", texts.len());

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(&request_json)
            .map_err(|e| AnswerError::Embedding(format!("Embeddings request failed: {}", e)))?;

        let body = response.body_mut().read_to_string().map_err(|e| {
            AnswerError::Embedding(format!("Failed to read embeddings response: {}", e))
        })?;

        let parsed: EmbeddingsResponse = serde_json::from_str(&body).map_err(|e| {
            AnswerError::Embedding(format!("Failed to parse embeddings response: {}", e))
        })?;

        // The API documents input ordering, but the index field is
        // authoritative.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}
