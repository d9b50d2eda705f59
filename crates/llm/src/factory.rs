//! Generator factory.
//!
//! Resolves a provider name to a concrete [`Generator`] implementation.

use crate::client::Generator;
use crate::providers::{BedrockClient, OllamaClient};
use crate::types::{GenerationSettings, ProviderType};
use kbchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Create a generator based on the provider named in `settings`.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its HTTP client
/// cannot be built.
pub fn create_generator(settings: &GenerationSettings) -> AppResult<Arc<dyn Generator>> {
    let provider = ProviderType::parse(&settings.provider).ok_or_else(|| {
        AppError::Config(format!("Unknown provider: {}", settings.provider))
    })?;

    tracing::debug!(
        provider = provider.as_str(),
        model = %settings.model,
        endpoint = %settings.endpoint,
        "Creating generator"
    );

    match provider {
        ProviderType::Bedrock => Ok(Arc::new(BedrockClient::new(settings.clone())?)),
        ProviderType::Ollama => Ok(Arc::new(OllamaClient::new(settings.clone())?)),
    }
}
