// Configuration management module
// Captures the environment-provided settings once at process start

pub mod settings;

pub use settings::{
    Config, ConfigError, OpenAiConfig, PipelineConfig, SearchConfig, ServerConfig,
};
