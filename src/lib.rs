use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnswerError>;

/// Failure taxonomy for the answering pipeline. The variant names the
/// pipeline stage that failed; the message carries the underlying cause.
#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Acquisition error: {0}")]
    Acquisition(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunking;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod pipeline;
pub mod search;
pub mod server;
pub mod synthesis;
