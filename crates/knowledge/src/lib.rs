//! Knowledge base question answering.
//!
//! Given a question and a knowledge base id, [`FallbackOrchestrator`] tries:
//! 1. retrieval followed by grounded generation
//! 2. a composite retrieve-and-generate call
//! 3. direct generation
//!
//! Retrieved passages are handed to the model as numbered citations:
//!
//! ```text
//! Citation 1: alpha
//!
//! Citation 2: beta
//!
//! ```
//!
//! Backends sit behind the [`Retriever`], [`RetrieveAndGenerate`] and
//! [`KnowledgeBaseCatalog`] traits; [`providers`] holds the HTTP clients.

pub mod context;
pub mod factory;
pub mod providers;
pub mod rag;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use context::build_context;
pub use factory::{build_catalog, build_orchestrator};
pub use rag::{AnswerOrigin, ChatAnswer, Collaborators, FallbackOrchestrator, Strategy, APOLOGY};
pub use retriever::{KnowledgeBaseCatalog, RetrieveAndGenerate, Retriever};
pub use types::{CompositeResponse, KnowledgeBaseSummary, Passage, Query};
