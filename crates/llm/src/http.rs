//! HTTP helpers shared by every backend client.

use kbchat_core::{AppError, AppResult};
use reqwest::{RequestBuilder, Response, Url};
use std::time::Duration;

/// Maximum number of characters of a raw error body kept in messages.
const MAX_ERROR_BODY: usize = 500;

/// Build a reusable HTTP client with a per-request timeout.
pub fn build_http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Join path segments onto a base URL, percent-encoding each segment.
///
/// Model identifiers and ARNs contain `:` and `/`, so they must travel as
/// single encoded segments rather than raw path text.
pub fn endpoint_url(base: &str, segments: &[&str]) -> AppResult<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Config(format!("Invalid endpoint '{}': {}", base, e)))?;

    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| AppError::Config(format!("Endpoint cannot be a base URL: {}", base)))?;
        path.pop_if_empty();
        path.extend(segments);
    }

    Ok(url)
}

/// Attach a bearer token when one is configured.
pub fn with_bearer(builder: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => builder.bearer_auth(key),
        None => builder,
    }
}

/// Describe a non-success response: status, service error code and message.
pub async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let code = error_code(&response);
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    format_failure(status.as_u16(), code.as_deref(), &body)
}

/// Extract the service error code from the `x-amzn-ErrorType` header.
fn error_code(response: &Response) -> Option<String> {
    response
        .headers()
        .get("x-amzn-ErrorType")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(':').next().unwrap_or(v).to_string())
        .filter(|v| !v.is_empty())
}

fn format_failure(status: u16, code: Option<&str>, body: &str) -> String {
    let message = service_message(body);
    match code {
        Some(code) => format!("HTTP {} ({}): {}", status, code, message),
        None => format!("HTTP {}: {}", status, message),
    }
}

/// Prefer the JSON `message` field of an error body over the raw text.
fn service_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("Message"))
            .or_else(|| value.get("error"))
            .and_then(|m| m.as_str())
    });

    match message {
        Some(message) => message.to_string(),
        None => body.trim().chars().take(MAX_ERROR_BODY).collect(),
    }
}
