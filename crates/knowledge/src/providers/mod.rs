//! Knowledge base service clients.

pub mod agent_runtime;
pub mod catalog;
pub mod signing;

pub use agent_runtime::{AgentRuntimeClient, AgentRuntimeSettings};
pub use catalog::{AgentCatalogClient, CatalogSettings};
pub use signing::RequestSigner;
