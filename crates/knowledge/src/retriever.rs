//! Collaborator traits for knowledge base backends.

use crate::types::{CompositeResponse, KnowledgeBaseSummary, Passage};
use kbchat_core::AppResult;

/// Looks up passages in a knowledge base.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Backend name for logs (e.g., "agent-runtime").
    fn backend_name(&self) -> &str;

    /// Return passages for `query`, ordered by backend relevance.
    async fn retrieve(&self, query: &str, knowledge_base_id: &str) -> AppResult<Vec<Passage>>;
}

/// Retrieval and generation in a single backend call.
#[async_trait::async_trait]
pub trait RetrieveAndGenerate: Send + Sync {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        knowledge_base_id: &str,
    ) -> AppResult<CompositeResponse>;
}

/// Lists the knowledge bases available to the caller.
#[async_trait::async_trait]
pub trait KnowledgeBaseCatalog: Send + Sync {
    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBaseSummary>>;
}
