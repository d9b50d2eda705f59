//! Generation provider implementations.

pub mod bedrock;
pub mod ollama;

pub use bedrock::BedrockClient;
pub use ollama::OllamaClient;
