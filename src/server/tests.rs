use std::collections::BTreeMap;

use super::*;
use crate::AnswerError;
use crate::embeddings::{Embedder, EmbeddingProvider};
use crate::pipeline::PipelineOptions;
use crate::search::{Document, SearchProvider};
use crate::synthesis::{ChatMessage, GenerationProvider, Synthesizer};

struct StubSearch {
    fail: bool,
}

impl SearchProvider for StubSearch {
    fn search(&self, _query: &str) -> crate::Result<Vec<Document>> {
        if self.fail {
            return Err(AnswerError::Acquisition("search is down".to_string()));
        }
        Ok(vec![Document::new(
            "The phone has a great battery and a mediocre camera.",
            BTreeMap::new(),
        )])
    }
}

struct StubEmbeddings;
impl EmbeddingProvider for StubEmbeddings {
    fn embed_batch(&self, texts: &[String]) -> crate::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

struct StubGeneration;
impl GenerationProvider for StubGeneration {
    fn generate(&self, _messages: &[ChatMessage]) -> crate::Result<String> {
        Ok("Pros: battery. Cons: camera.".to_string())
    }
}

fn stub_pipeline(fail_search: bool) -> Arc<Pipeline> {
    let pipeline = Pipeline::new(
        Box::new(StubSearch { fail: fail_search }),
        Embedder::new(Box::new(StubEmbeddings), 16).expect("embedder should build"),
        Synthesizer::new(Box::new(StubGeneration)),
        PipelineOptions::default(),
    )
    .expect("pipeline should build");
    Arc::new(pipeline)
}

#[tokio::test]
async fn analyze_returns_the_answer() {
    let response = analyze(
        State(stub_pipeline(false)),
        Json(AnalyzeRequest {
            question: "What are the pros and cons?".to_string(),
            query: "best budget phone 2024".to_string(),
        }),
    )
    .await;

    let Ok(Json(body)) = response else {
        panic!("expected success response");
    };
    assert_eq!(body.answer, "Pros: battery. Cons: camera.");
}

#[tokio::test]
async fn analyze_maps_pipeline_failure_to_opaque_500() {
    let response = analyze(
        State(stub_pipeline(true)),
        Json(AnalyzeRequest {
            question: "What are the pros and cons?".to_string(),
            query: "best budget phone 2024".to_string(),
        }),
    )
    .await;

    let Err((status, Json(body))) = response else {
        panic!("expected error response");
    };
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.error, "Internal Server Error");
}

#[tokio::test]
async fn health_endpoint_responds() {
    assert_eq!(health().await, "ok");
}
