//! Generation provider settings.

use kbchat_core::AppConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything a provider needs to build its client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Provider name ("bedrock", "ollama")
    pub provider: String,

    /// Base URL of the provider API
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Messages API version string sent to Bedrock
    pub anthropic_version: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Optional bearer token
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl GenerationSettings {
    /// Settings with defaults for everything but provider, endpoint and model.
    pub fn new(
        provider: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            max_tokens: 1000,
            anthropic_version: "bedrock-2023-05-31".to_string(),
            temperature: None,
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Derive settings from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            endpoint: config.generation_endpoint(),
            model: config.model.clone(),
            max_tokens: config.generation.max_tokens,
            anthropic_version: config.generation.anthropic_version.clone(),
            temperature: config.generation.temperature,
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Bedrock,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bedrock" => Some(Self::Bedrock),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Ollama => "ollama",
        }
    }
}
