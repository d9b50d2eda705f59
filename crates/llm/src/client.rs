//! Generator abstraction and request/response types.

use kbchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Provider-independent completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text to send to the model
    pub prompt: String,

    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl LlmRequest {
    /// Create a new request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// One block of a message-style response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentBlock {
    /// A plain text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            text: Some(text.into()),
        }
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    #[serde(default)]
    pub input_tokens: u32,

    #[serde(default)]
    pub output_tokens: u32,
}

/// Raw generation response.
///
/// Backends expose their text either as a list of content blocks or as a
/// single `completion` field. Both are kept as received; [`text`](Self::text)
/// decides which one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentBlock>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

impl GenerationResponse {
    /// Response carrying content blocks.
    pub fn from_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            content: Some(blocks),
            ..Default::default()
        }
    }

    /// Response carrying a single completion string.
    pub fn from_completion(completion: impl Into<String>) -> Self {
        Self {
            completion: Some(completion.into()),
            ..Default::default()
        }
    }

    /// Decode a response body.
    ///
    /// A body that is not a JSON object is a `MalformedResponse`, not a
    /// serialization error, so callers can treat it as a generation failure.
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(body).map_err(|e| {
            AppError::MalformedResponse(format!("undecodable generation payload: {}", e))
        })
    }

    /// Extract the generated text.
    ///
    /// The first content block's text is preferred; if it is absent or empty
    /// the `completion` field is used. A response with neither is malformed,
    /// never an empty answer.
    pub fn text(&self) -> AppResult<String> {
        let block_text = self
            .content
            .as_deref()
            .and_then(|blocks| blocks.first())
            .and_then(|block| block.text.as_deref())
            .filter(|text| !text.is_empty());

        if let Some(text) = block_text {
            return Ok(text.to_string());
        }

        match self.completion.as_deref() {
            Some(completion) if !completion.is_empty() => Ok(completion.to_string()),
            _ => Err(AppError::MalformedResponse(
                "response has neither a text content block nor a completion".to_string(),
            )),
        }
    }
}

/// Trait for text generation backends.
///
/// Implementations hold their own model settings; callers hand over a fully
/// rendered prompt and get the raw response back.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    /// Get the provider name (e.g., "bedrock", "ollama").
    fn provider_name(&self) -> &str;

    /// Generate a response for a rendered prompt.
    ///
    /// Transport and service failures are `AppError::Generation`; payloads
    /// that cannot be decoded are `AppError::MalformedResponse`.
    async fn generate(&self, prompt: &str) -> AppResult<GenerationResponse>;
}
