//! Answer types for the fallback chain.

use crate::types::Passage;
use kbchat_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returned when every strategy has failed.
pub const APOLOGY: &str = "I apologize, but I couldn't retrieve information from the knowledge base to answer your question.";

/// One step of the fallback chain, in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Retrieve passages, then generate from a grounded prompt
    RetrieveThenGenerate,

    /// Single backend call that retrieves and generates
    RetrieveAndGenerate,

    /// Generate from the question alone
    DirectGeneration,
}

impl Strategy {
    /// Attempt order.
    pub const CHAIN: [Strategy; 3] = [
        Strategy::RetrieveThenGenerate,
        Strategy::RetrieveAndGenerate,
        Strategy::DirectGeneration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RetrieveThenGenerate => "retrieve_then_generate",
            Strategy::RetrieveAndGenerate => "retrieve_and_generate",
            Strategy::DirectGeneration => "direct_generation",
        }
    }

    /// Where an answer produced by this strategy came from.
    pub fn origin(&self) -> AnswerOrigin {
        match self {
            Strategy::RetrieveThenGenerate => AnswerOrigin::Grounded,
            Strategy::RetrieveAndGenerate => AnswerOrigin::Composite,
            Strategy::DirectGeneration => AnswerOrigin::Direct,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which path produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Grounded,
    Composite,
    Direct,
    Apology,
}

impl fmt::Display for AnswerOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnswerOrigin::Grounded => "grounded",
            AnswerOrigin::Composite => "composite",
            AnswerOrigin::Direct => "direct",
            AnswerOrigin::Apology => "apology",
        };
        f.write_str(name)
    }
}

/// A strategy that was attempted and abandoned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: Strategy,

    /// Error category (see `AppError::kind`)
    pub kind: String,

    /// Error message
    pub error: String,
}

impl StrategyFailure {
    pub fn new(strategy: Strategy, error: &AppError) -> Self {
        Self {
            strategy,
            kind: error.kind().to_string(),
            error: error.to_string(),
        }
    }
}

/// Final result of a chat request.
///
/// `answer` is always non-empty. `sources` holds the passages behind a
/// grounded answer and is empty for every other origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,

    /// Which path produced `answer`
    pub strategy: AnswerOrigin,
    pub sources: Vec<Passage>,
    pub failures: Vec<StrategyFailure>,
}

impl ChatAnswer {
    /// The fixed apology, after every strategy failed.
    pub fn apology(failures: Vec<StrategyFailure>) -> Self {
        Self {
            answer: APOLOGY.to_string(),
            strategy: AnswerOrigin::Apology,
            sources: Vec::new(),
            failures,
        }
    }

    pub fn is_apology(&self) -> bool {
        self.strategy == AnswerOrigin::Apology
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_order() {
        assert_eq!(
            Strategy::CHAIN.map(|s| s.origin()),
            [AnswerOrigin::Grounded, AnswerOrigin::Composite, AnswerOrigin::Direct]
        );
    }

    #[test]
    fn test_failure_records_kind() {
        let failure = StrategyFailure::new(
            Strategy::RetrieveAndGenerate,
            &AppError::Retrieval("timeout".to_string()),
        );
        assert_eq!(failure.kind, "retrieval");
        assert!(failure.error.contains("timeout"));
    }

    #[test]
    fn test_apology_serialization() {
        let answer = ChatAnswer::apology(Vec::new());
        assert!(answer.is_apology());

        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["strategy"], "apology");
        assert_eq!(json["answer"], APOLOGY);
    }
}
