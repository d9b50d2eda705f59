//! Core types for knowledge base queries.

use kbchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A validated chat query.
///
/// Both fields are guaranteed non-empty; construction is the only place
/// the orchestrator's preconditions are checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    question: String,
    knowledge_base_id: String,
}

impl Query {
    /// Validate and build a query.
    ///
    /// Whitespace-only values count as missing.
    pub fn new(question: impl Into<String>, knowledge_base_id: impl Into<String>) -> AppResult<Self> {
        let question = question.into();
        let knowledge_base_id = knowledge_base_id.into();

        let missing: Vec<&str> = [
            ("question", question.trim().is_empty()),
            ("knowledgeBaseId", knowledge_base_id.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "{} required",
                missing.join(" and ")
            )));
        }

        Ok(Self {
            question,
            knowledge_base_id,
        })
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn knowledge_base_id(&self) -> &str {
        &self.knowledge_base_id
    }
}

/// A unit of retrieved text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Passage {
    /// Passage text
    pub text: String,

    /// 0-based position in the backend's result list
    pub source_index: usize,

    /// Backend relevance score, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Human-readable document location (URI or URL), if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Passage {
    /// A passage with text and position only.
    pub fn new(text: impl Into<String>, source_index: usize) -> Self {
        Self {
            text: text.into(),
            source_index,
            score: None,
            location: None,
        }
    }
}

/// Output of a composite retrieve-and-generate call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResponse {
    /// Generated answer, absent when the backend returned no output
    #[serde(default)]
    pub output_text: Option<String>,

    /// Backend session identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Number of citations the backend attached
    #[serde(default)]
    pub citation_count: usize,
}

impl CompositeResponse {
    /// A response carrying answer text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            output_text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// One entry in the knowledge base catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseSummary {
    pub id: String,

    /// Display name; the id when the backend has none
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
