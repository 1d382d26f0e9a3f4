
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::AnswerError;
use crate::chunking::{DEFAULT_MAX_TOKENS, DEFAULT_OVERLAP_TOKENS};
use crate::embeddings::DEFAULT_BATCH_SIZE;
use crate::index::DEFAULT_TOP_K;

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SEARCH_API_KEY: &str = "SEARCH_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "ASKWEB_OPENAI_BASE_URL";
pub const ENV_SEARCH_BASE_URL: &str = "ASKWEB_SEARCH_BASE_URL";
pub const ENV_SEARCH_ENGINE: &str = "ASKWEB_SEARCH_ENGINE";
pub const ENV_EMBEDDING_MODEL: &str = "ASKWEB_EMBEDDING_MODEL";
pub const ENV_CHAT_MODEL: &str = "ASKWEB_CHAT_MODEL";
pub const ENV_EMBEDDING_BATCH_SIZE: &str = "ASKWEB_EMBEDDING_BATCH_SIZE";
pub const ENV_CHUNK_MAX_TOKENS: &str = "ASKWEB_CHUNK_MAX_TOKENS";
pub const ENV_CHUNK_OVERLAP_TOKENS: &str = "ASKWEB_CHUNK_OVERLAP_TOKENS";
pub const ENV_TOP_K: &str = "ASKWEB_TOP_K";
pub const ENV_PORT: &str = "ASKWEB_PORT";
pub const ENV_HTTP_TIMEOUT_SECONDS: &str = "ASKWEB_HTTP_TIMEOUT_SECONDS";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_SEARCH_BASE_URL: &str = "https://www.searchapi.io";
const DEFAULT_SEARCH_ENGINE: &str = "google";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

const REDACTED: &str = "********";

/// Process-wide configuration, read from the environment exactly once at
/// startup and passed into the pipeline and server by value.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Config {
    pub search: SearchConfig,
    pub openai: OpenAiConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

/// Settings for the external web search capability.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub engine: String,
    pub timeout_seconds: u64,
}

/// Settings for the external embedding and generation capabilities.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_batch_size: usize,
    pub timeout_seconds: u64,
}

/// Policy values for chunking and retrieval.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineConfig {
    pub chunk_max_tokens: usize,
    pub chunk_overlap_tokens: usize,
    pub top_k: usize,
}

/// Settings for the HTTP transport layer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for SearchConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            engine: DEFAULT_SEARCH_ENGINE.to_string(),
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
        }
    }
}

impl Default for OpenAiConfig {
    #[inline]
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_batch_size: DEFAULT_BATCH_SIZE,
            timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECONDS,
        }
    }
}

impl Default for PipelineConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_max_tokens: DEFAULT_MAX_TOKENS,
            chunk_overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            top_k: DEFAULT_TOP_K,
        }
    }
}

impl Default for ServerConfig {
    #[inline]
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
    #[error("Invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),
    #[error("Invalid embedding batch size: {0} (must be between 1 and 2048)")]
    InvalidBatchSize(usize),
    #[error("Invalid chunk size: {0} (must be between 1 and 8192 tokens)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid retrieval count: {0} (must be at least 1)")]
    InvalidTopK(usize),
    #[error("Invalid HTTP timeout: {0} (must be between 1 and 300 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid port: 0")]
    InvalidPort,
}

impl From<ConfigError> for AnswerError {
    #[inline]
    fn from(err: ConfigError) -> Self {
        AnswerError::Configuration(err.to_string())
    }
}

impl Config {
    /// Read and validate the configuration from the process environment.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// Read the configuration from an arbitrary variable source. Tests
    /// inject a map here instead of mutating the process environment.
    #[inline]
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            search: SearchConfig {
                api_key: required(&lookup, ENV_SEARCH_API_KEY)?,
                base_url: string_or(&lookup, ENV_SEARCH_BASE_URL, DEFAULT_SEARCH_BASE_URL),
                engine: string_or(&lookup, ENV_SEARCH_ENGINE, DEFAULT_SEARCH_ENGINE),
                timeout_seconds: parse_or(
                    &lookup,
                    ENV_HTTP_TIMEOUT_SECONDS,
                    DEFAULT_HTTP_TIMEOUT_SECONDS,
                )?,
            },
            openai: OpenAiConfig {
                api_key: required(&lookup, ENV_OPENAI_API_KEY)?,
                base_url: string_or(&lookup, ENV_OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL),
                embedding_model: string_or(&lookup, ENV_EMBEDDING_MODEL, DEFAULT_EMBEDDING_MODEL),
                chat_model: string_or(&lookup, ENV_CHAT_MODEL, DEFAULT_CHAT_MODEL),
                embedding_batch_size: parse_or(
                    &lookup,
                    ENV_EMBEDDING_BATCH_SIZE,
                    DEFAULT_BATCH_SIZE,
                )?,
                timeout_seconds: parse_or(
                    &lookup,
                    ENV_HTTP_TIMEOUT_SECONDS,
                    DEFAULT_HTTP_TIMEOUT_SECONDS,
                )?,
            },
            pipeline: PipelineConfig {
                chunk_max_tokens: parse_or(&lookup, ENV_CHUNK_MAX_TOKENS, DEFAULT_MAX_TOKENS)?,
                chunk_overlap_tokens: parse_or(
                    &lookup,
                    ENV_CHUNK_OVERLAP_TOKENS,
                    DEFAULT_OVERLAP_TOKENS,
                )?,
                top_k: parse_or(&lookup, ENV_TOP_K, DEFAULT_TOP_K)?,
            },
            server: ServerConfig {
                port: parse_or(&lookup, ENV_PORT, DEFAULT_PORT)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search.validate()?;
        self.openai.validate()?;
        self.pipeline.validate()?;
        self.server.validate()?;
        Ok(())
    }

    /// Copy of the configuration with credentials masked, safe to print.
    #[inline]
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        if !redacted.search.api_key.is_empty() {
            redacted.search.api_key = REDACTED.to_string();
        }
        if !redacted.openai.api_key.is_empty() {
            redacted.openai.api_key = REDACTED.to_string();
        }
        redacted
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar(ENV_SEARCH_API_KEY));
        }
        if self.engine.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                ENV_SEARCH_ENGINE,
                self.engine.clone(),
            ));
        }
        validate_url(ENV_SEARCH_BASE_URL, &self.base_url)?;
        validate_timeout(self.timeout_seconds)?;
        Ok(())
    }
}

impl OpenAiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingVar(ENV_OPENAI_API_KEY));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                ENV_EMBEDDING_MODEL,
                self.embedding_model.clone(),
            ));
        }
        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                ENV_CHAT_MODEL,
                self.chat_model.clone(),
            ));
        }
        if self.embedding_batch_size == 0 || self.embedding_batch_size > 2048 {
            return Err(ConfigError::InvalidBatchSize(self.embedding_batch_size));
        }
        validate_url(ENV_OPENAI_BASE_URL, &self.base_url)?;
        validate_timeout(self.timeout_seconds)?;
        Ok(())
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_max_tokens == 0 || self.chunk_max_tokens > 8192 {
            return Err(ConfigError::InvalidChunkSize(self.chunk_max_tokens));
        }
        if self.chunk_overlap_tokens >= self.chunk_max_tokens {
            return Err(ConfigError::OverlapTooLarge(
                self.chunk_overlap_tokens,
                self.chunk_max_tokens,
            ));
        }
        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

fn string_or<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, value)),
        _ => Ok(default),
    }
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl(name, value.to_string()))?;
    Ok(())
}

fn validate_timeout(timeout_seconds: u64) -> Result<(), ConfigError> {
    if timeout_seconds == 0 || timeout_seconds > 300 {
        return Err(ConfigError::InvalidTimeout(timeout_seconds));
    }
    Ok(())
}
