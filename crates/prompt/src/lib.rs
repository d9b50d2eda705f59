//! Prompt system for kbchat.
//!
//! This crate renders the two chat prompts:
//! - the grounded prompt, which embeds retrieved citations
//! - the fallback prompt, which asks the question directly
//!
//! Templates use Handlebars and can be overridden per workspace with YAML
//! files under `.kbchat/prompts/`.

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{builtin_definition, PromptSet};
pub use loader::{list_prompts, load_prompt, load_prompt_override};
pub use types::{BuiltPrompt, BuiltPromptMetadata, Prompt, PromptDefinition, PromptKind};
