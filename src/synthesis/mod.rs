
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::chunking::Chunk;
use crate::config::OpenAiConfig;
use crate::{AnswerError, Result};

/// Instruction keeping the model grounded in the retrieved context.
const SYSTEM_INSTRUCTION: &str = "You are a research assistant. Answer the \
question using only the provided context. If the context does not contain \
enough information to answer, say that you don't know instead of guessing.";

/// Delimiter between context chunks in the prompt.
const CONTEXT_DELIMITER: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[inline]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// External generation capability. One call maps to exactly one upstream
/// request; failures surface as [`AnswerError::Synthesis`].
pub trait GenerationProvider: Send + Sync {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Builds the answer prompt from the question and retrieved context and
/// makes a single generation call per request. No retry, no streaming.
pub struct Synthesizer {
    provider: Box<dyn GenerationProvider>,
}

impl Synthesizer {
    #[inline]
    pub fn new(provider: Box<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Synthesize an answer grounded in `context`, which must already be
    /// in retrieval (descending relevance) order.
    #[inline]
    pub fn synthesize(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let messages = build_messages(question, context);
        debug!(
            "Synthesizing answer from {} context chunks",
            context.len()
        );

        let answer = self.provider.generate(&messages)?;
        if answer.trim().is_empty() {
            return Err(AnswerError::Synthesis(
                "Generation returned an empty answer".to_string(),
            ));
        }

        Ok(answer)
    }
}

/// Build the single prompt sent to the generation capability: the grounding
/// instruction, the delimited context chunks in retrieval order, and the
/// question.
pub fn build_messages(question: &str, context: &[Chunk]) -> Vec<ChatMessage> {
    let context_text = context
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER);

    vec![
        ChatMessage::system(SYSTEM_INSTRUCTION),
        ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}",
            context_text, question
        )),
    ]
}

/// Client for the OpenAI chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    base_url: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiChat {
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
            model: config.chat_model.clone(),
            agent,
        })
    }
}

impl GenerationProvider for OpenAiChat {
    #[inline]
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = self.base_url.join("/v1/chat/completions").map_err(|e| {
            AnswerError::Synthesis(format!("Failed to build chat completions URL: {}", e))
        })?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            AnswerError::Synthesis(format!("Failed to serialize chat request: {}", e))
        })?;

        let mut response = self
            .agent
            .post(url.as_str())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .send(&request_json)
            .map_err(|e| AnswerError::Synthesis(format!("Chat request failed: {}", e)))?;

        let body = response.body_mut().read_to_string().map_err(|e| {
            AnswerError::Synthesis(format!("Failed to read chat response: {}", e))
        })?;

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            AnswerError::Synthesis(format!("Failed to parse chat response: {}", e))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnswerError::Synthesis("Chat response contained no answer".to_string())
            })
    }
}
