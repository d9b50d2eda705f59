//! Prompt types for kbchat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two prompt shapes the chat flow renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Embeds retrieved context
    Grounded,
    /// Question only, with permission to admit ignorance
    Fallback,
}

impl PromptKind {
    /// Prompt identifier used for workspace overrides.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Grounded => "chat.grounded",
            Self::Fallback => "chat.fallback",
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Instruction text exposed to the template as `{{instructions}}`
    #[serde(default)]
    pub instructions: String,

    /// Template string with Handlebars syntax.
    ///
    /// Variables: `instructions`, `question`, `context`.
    pub template: String,
}

/// Prompt inputs before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub kind: PromptKind,
    pub instructions: String,
    pub question: String,
    /// Empty for fallback prompts
    pub context: String,
}

/// A rendered prompt ready for the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// Single text block handed to the generator
    pub text: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    pub kind: PromptKind,

    /// Whether retrieved context was embedded
    #[serde(rename = "contextIncluded")]
    pub context_included: bool,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(text: String, source_prompt_id: String, kind: PromptKind, context_included: bool) -> Self {
        Self {
            text,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                kind,
                context_included,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: chat.grounded
title: Grounded answer
apiVersion: "1.0"
createdBy: test
instructions: Answer using only the citations below.
template: "{{instructions}}\n{{question}}\n{{context}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "chat.grounded");
        assert_eq!(def.instructions, "Answer using only the citations below.");
        assert!(def.template.contains("{{context}}"));
    }

    #[test]
    fn test_kind_ids() {
        assert_eq!(PromptKind::Grounded.id(), "chat.grounded");
        assert_eq!(PromptKind::Fallback.to_string(), "chat.fallback");
    }

    #[test]
    fn test_built_prompt_creation() {
        let built = BuiltPrompt::new(
            "Please answer".to_string(),
            "chat.fallback".to_string(),
            PromptKind::Fallback,
            false,
        );

        assert_eq!(built.text, "Please answer");
        assert_eq!(built.metadata.source_prompt_id, "chat.fallback");
        assert_eq!(built.metadata.kind, PromptKind::Fallback);
        assert!(!built.metadata.context_included);
    }
}
