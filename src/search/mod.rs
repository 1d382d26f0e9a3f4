
use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::{AnswerError, Result};

pub const METADATA_SOURCE: &str = "source";
pub const METADATA_TITLE: &str = "title";
pub const METADATA_POSITION: &str = "position";

/// A raw web document acquired for one request. Immutable once created;
/// one per search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    #[inline]
    pub fn new(text: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metadata,
        }
    }
}

/// External search capability. Zero results is a valid empty success;
/// provider failures surface as [`AnswerError::Acquisition`]. No retry is
/// performed here; retry policy belongs to the caller, not the pipeline.
pub trait SearchProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Document>>;
}

/// Client for the SearchApi.io search endpoint.
#[derive(Debug, Clone)]
pub struct SearchApiClient {
    base_url: Url,
    api_key: String,
    engine: String,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    position: Option<u32>,
}

impl SearchApiClient {
    #[inline]
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AnswerError::Configuration(format!(
                "Invalid search base URL {}: {}",
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
            engine: config.engine.clone(),
            agent,
        })
    }
}

impl SearchProvider for SearchApiClient {
    #[inline]
    fn search(&self, query: &str) -> Result<Vec<Document>> {
        let mut url = self
            .base_url
            .join("/api/v1/search")
            .map_err(|e| AnswerError::Acquisition(format!("Failed to build search URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("engine", &self.engine)
            .append_pair("q", query);

        debug!("Searching for: {}", query);

        let mut response = self
            .agent
            .get(url.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .call()
            .map_err(|e| AnswerError::Acquisition(format!("Search request failed: {}", e)))?;

        let body = response.body_mut().read_to_string().map_err(|e| {
            AnswerError::Acquisition(format!("Failed to read search response: {}", e))
        })?;

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            AnswerError::Acquisition(format!("Failed to parse search response: {}", e))
        })?;

        let documents: Vec<Document> = parsed
            .organic_results
            .into_iter()
            .filter_map(result_to_document)
            .collect();

        debug!("Search returned {} documents", documents.len());
        Ok(documents)
    }
}

/// Turn one organic search result into a [`Document`], skipping results
/// without any snippet text to ground an answer on.
fn result_to_document(result: OrganicResult) -> Option<Document> {
    if result.snippet.trim().is_empty() {
        return None;
    }

    let mut metadata = BTreeMap::new();
    if !result.link.is_empty() {
        metadata.insert(METADATA_SOURCE.to_string(), result.link);
    }
    if !result.title.is_empty() {
        metadata.insert(METADATA_TITLE.to_string(), result.title);
    }
    if let Some(position) = result.position {
        metadata.insert(METADATA_POSITION.to_string(), position.to_string());
    }

    Some(Document::new(result.snippet, metadata))
}
