//! Build orchestrators and catalogs from configuration.

use crate::providers::{
    AgentCatalogClient, AgentRuntimeClient, AgentRuntimeSettings, CatalogSettings, RequestSigner,
};
use crate::rag::{Collaborators, FallbackOrchestrator};
use crate::retriever::{KnowledgeBaseCatalog, RetrieveAndGenerate};
use kbchat_core::{AppConfig, AppResult};
use kbchat_llm::{create_generator, GenerationSettings};
use kbchat_prompt::PromptSet;
use std::sync::Arc;

/// Wire the configured backends into a fallback orchestrator.
///
/// One agent-runtime client serves both retrieval and the composite call.
/// Prompt overrides are read from the configured workspace.
pub async fn build_orchestrator(config: &AppConfig) -> AppResult<FallbackOrchestrator> {
    let signer = Arc::new(RequestSigner::from_env(&config.region).await?);
    let runtime = Arc::new(AgentRuntimeClient::new(AgentRuntimeSettings::from_config(
        config, signer,
    ))?);
    let generator = create_generator(&GenerationSettings::from_config(config))?;

    let composite: Option<Arc<dyn RetrieveAndGenerate>> = if config.retrieval.composite {
        Some(runtime.clone() as Arc<dyn RetrieveAndGenerate>)
    } else {
        None
    };

    tracing::debug!(
        provider = generator.provider_name(),
        model = %config.model,
        composite = composite.is_some(),
        "Building orchestrator"
    );

    let prompts = PromptSet::load(&config.workspace)?;

    Ok(FallbackOrchestrator::new(
        Collaborators {
            retriever: runtime,
            generator,
            composite,
        },
        prompts,
    ))
}

/// Catalog client for listing knowledge bases.
pub async fn build_catalog(config: &AppConfig) -> AppResult<Arc<dyn KnowledgeBaseCatalog>> {
    let signer = Arc::new(RequestSigner::from_env(&config.region).await?);
    Ok(Arc::new(AgentCatalogClient::new(CatalogSettings::from_config(
        config, signer,
    ))?))
}
