//! Text generation crate for kbchat.
//!
//! This crate provides a provider-agnostic abstraction over text generation
//! backends. Every provider returns a [`GenerationResponse`], whose text is
//! extracted with a single response-shape rule shared by all callers.
//!
//! # Providers
//! - **Bedrock**: managed model invocation (default)
//! - **Ollama**: local LLM runtime
//!
//! # Example
//! ```no_run
//! use kbchat_llm::{create_generator, GenerationSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = GenerationSettings::new("ollama", "http://localhost:11434", "llama3.2");
//! let generator = create_generator(&settings)?;
//! let response = generator.generate("Hello, world!").await?;
//! println!("{}", response.text()?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod http;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ContentBlock, GenerationResponse, Generator, LlmRequest, LlmUsage};
pub use factory::create_generator;
pub use providers::{BedrockClient, OllamaClient};
pub use types::{GenerationSettings, ProviderType};
