//! Answering questions against a knowledge base.
//!
//! Combines retrieval and generation behind an ordered fallback chain.

pub mod orchestrator;
pub mod types;

pub use orchestrator::{Collaborators, FallbackOrchestrator};
pub use types::{AnswerOrigin, ChatAnswer, Strategy, StrategyFailure, APOLOGY};
