//! Ollama provider implementation.
//!
//! Local LLM runtime, useful for running the chat flow without cloud access.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{GenerationResponse, Generator, LlmRequest, LlmUsage};
use crate::http::{build_http_client, describe_failure, endpoint_url};
use crate::types::GenerationSettings;
use kbchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

/// Ollama client.
pub struct OllamaClient {
    settings: GenerationSettings,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client from generation settings.
    pub fn new(settings: GenerationSettings) -> AppResult<Self> {
        let client = build_http_client(settings.timeout)?;
        Ok(Self { settings, client })
    }

    /// Convert an LlmRequest to Ollama format.
    fn to_ollama_request(&self, request: &LlmRequest) -> OllamaRequest {
        OllamaRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            options: Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            }),
            stream: false,
        }
    }

    /// Ollama returns a single `response` string, which maps onto the
    /// completion shape.
    fn convert_response(&self, response: OllamaResponse) -> GenerationResponse {
        GenerationResponse {
            content: None,
            completion: response.response,
            model: Some(response.model),
            stop_reason: response.done_reason,
            usage: Some(LlmUsage {
                input_tokens: response.prompt_eval_count.unwrap_or(0),
                output_tokens: response.eval_count.unwrap_or(0),
            }),
        }
    }
}

#[async_trait::async_trait]
impl Generator for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> AppResult<GenerationResponse> {
        tracing::debug!(model = %self.settings.model, "Sending generate request to Ollama");

        let mut request =
            LlmRequest::new(prompt, &self.settings.model).with_max_tokens(self.settings.max_tokens);
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }

        let ollama_request = self.to_ollama_request(&request);
        let url = endpoint_url(&self.settings.endpoint, &["api", "generate"])?;

        let response = self
            .client
            .post(url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Generation(format!(
                "Ollama API error: {}",
                describe_failure(response).await
            )));
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            AppError::MalformedResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(self.convert_response(ollama_response))
    }
}
