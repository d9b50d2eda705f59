//! Bedrock model invocation provider.
//!
//! Sends a Messages-API body to `POST {endpoint}/model/{modelId}/invoke` and
//! returns the raw response for the caller to parse.

use crate::client::{GenerationResponse, Generator, LlmRequest};
use crate::http::{build_http_client, describe_failure, endpoint_url, with_bearer};
use crate::types::GenerationSettings;
use kbchat_core::{AppError, AppResult};
use serde::Serialize;

/// Messages-API invoke body.
#[derive(Debug, Serialize)]
struct InvokeBody<'a> {
    anthropic_version: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<TextBlock<'a>>,
}

#[derive(Debug, Serialize)]
struct TextBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// Bedrock runtime client.
pub struct BedrockClient {
    settings: GenerationSettings,

    /// HTTP client
    client: reqwest::Client,
}

impl BedrockClient {
    /// Create a client from generation settings.
    pub fn new(settings: GenerationSettings) -> AppResult<Self> {
        let client = build_http_client(settings.timeout)?;
        Ok(Self { settings, client })
    }

    /// Build the provider-independent request for a prompt.
    fn to_request(&self, prompt: &str) -> LlmRequest {
        let mut request =
            LlmRequest::new(prompt, &self.settings.model).with_max_tokens(self.settings.max_tokens);
        if let Some(temperature) = self.settings.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Convert a request to the invoke body.
    fn to_invoke_body<'a>(&'a self, request: &'a LlmRequest) -> InvokeBody<'a> {
        InvokeBody {
            anthropic_version: &self.settings.anthropic_version,
            max_tokens: request.max_tokens.unwrap_or(self.settings.max_tokens),
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: vec![TextBlock {
                    kind: "text",
                    text: &request.prompt,
                }],
            }],
        }
    }
}

#[async_trait::async_trait]
impl Generator for BedrockClient {
    fn provider_name(&self) -> &str {
        "bedrock"
    }

    async fn generate(&self, prompt: &str) -> AppResult<GenerationResponse> {
        let request = self.to_request(prompt);
        let body = self.to_invoke_body(&request);
        let url = endpoint_url(
            &self.settings.endpoint,
            &["model", self.settings.model.as_str(), "invoke"],
        )?;

        tracing::debug!(model = %self.settings.model, prompt_len = prompt.len(), "Invoking model");

        let response = with_bearer(self.client.post(url), self.settings.api_key.as_deref())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to invoke model: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Generation(format!(
                "Model invocation failed: {}",
                describe_failure(response).await
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to read model response: {}", e)))?;

        let parsed = GenerationResponse::from_slice(&bytes)?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Model invocation complete"
            );
        }

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BedrockClient {
        let mut settings = GenerationSettings::new(
            "bedrock",
            "https://bedrock-runtime.us-east-1.amazonaws.com",
            "anthropic.claude-3-sonnet-20240229-v1:0",
        );
        settings.max_tokens = 1000;
        BedrockClient::new(settings).unwrap()
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(client().provider_name(), "bedrock");
    }

    #[test]
    fn test_invoke_body_shape() {
        let client = client();
        let request = client.to_request("What is the refund policy?");
        let body = serde_json::to_value(client.to_invoke_body(&request)).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 1000,
                "messages": [{
                    "role": "user",
                    "content": [{"type": "text", "text": "What is the refund policy?"}]
                }]
            })
        );
    }

    #[test]
    fn test_invoke_body_with_temperature() {
        let mut settings = GenerationSettings::new("bedrock", "http://localhost:1", "m");
        settings.temperature = Some(0.5);
        let client = BedrockClient::new(settings).unwrap();

        let request = client.to_request("q");
        let body = serde_json::to_value(client.to_invoke_body(&request)).unwrap();
        assert_eq!(body["temperature"], serde_json::json!(0.5));
    }
}
