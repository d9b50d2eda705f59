//! Prompt builder: renders grounded and fallback prompts.

use crate::loader::{load_prompt_override, validate_prompt};
use crate::types::{BuiltPrompt, Prompt, PromptDefinition, PromptKind};
use handlebars::Handlebars;
use kbchat_core::{AppError, AppResult};
use std::path::Path;

const GROUNDED_INSTRUCTIONS: &str =
    "Based on the following information, please answer this question:";

const GROUNDED_TEMPLATE: &str =
    "{{instructions}} \"{{question}}\"\n\nInformation from knowledge base:\n\n{{context}}";

const FALLBACK_INSTRUCTIONS: &str =
    "If you don't know the answer, please state that you don't have enough information.";

const FALLBACK_TEMPLATE: &str = "Please answer this question: {{question}}\n\n{{instructions}}";

/// Built-in definition for a prompt kind.
pub fn builtin_definition(kind: PromptKind) -> PromptDefinition {
    let (title, instructions, template) = match kind {
        PromptKind::Grounded => (
            "Grounded knowledge base answer",
            GROUNDED_INSTRUCTIONS,
            GROUNDED_TEMPLATE,
        ),
        PromptKind::Fallback => (
            "Direct answer without retrieval",
            FALLBACK_INSTRUCTIONS,
            FALLBACK_TEMPLATE,
        ),
    };

    PromptDefinition {
        id: kind.id().to_string(),
        title: title.to_string(),
        api_version: "1.0".to_string(),
        created_by: "kbchat".to_string(),
        instructions: instructions.to_string(),
        template: template.to_string(),
    }
}

/// The grounded and fallback templates, registered once and reused.
pub struct PromptSet {
    registry: Handlebars<'static>,
    grounded: PromptDefinition,
    fallback: PromptDefinition,
}

impl PromptSet {
    /// Create a set from explicit definitions.
    pub fn new(grounded: PromptDefinition, fallback: PromptDefinition) -> AppResult<Self> {
        validate_prompt(&grounded)?;
        validate_prompt(&fallback)?;

        let mut registry = Handlebars::new();

        // Plain text prompts: no HTML escaping
        registry.register_escape_fn(handlebars::no_escape);

        for (kind, definition) in [
            (PromptKind::Grounded, &grounded),
            (PromptKind::Fallback, &fallback),
        ] {
            registry
                .register_template_string(kind.id(), &definition.template)
                .map_err(|e| {
                    AppError::Prompt(format!(
                        "Failed to register template '{}': {}",
                        definition.id, e
                    ))
                })?;
        }

        Ok(Self {
            registry,
            grounded,
            fallback,
        })
    }

    /// The built-in templates.
    pub fn builtin() -> AppResult<Self> {
        Self::new(
            builtin_definition(PromptKind::Grounded),
            builtin_definition(PromptKind::Fallback),
        )
    }

    /// Built-in templates, replaced by any overrides in the workspace.
    pub fn load(workspace_path: &Path) -> AppResult<Self> {
        let grounded = load_prompt_override(workspace_path, PromptKind::Grounded.id())?
            .unwrap_or_else(|| builtin_definition(PromptKind::Grounded));
        let fallback = load_prompt_override(workspace_path, PromptKind::Fallback.id())?
            .unwrap_or_else(|| builtin_definition(PromptKind::Fallback));

        Self::new(grounded, fallback)
    }

    fn definition(&self, kind: PromptKind) -> &PromptDefinition {
        match kind {
            PromptKind::Grounded => &self.grounded,
            PromptKind::Fallback => &self.fallback,
        }
    }

    /// Prompt inputs for a grounded answer.
    pub fn grounded(&self, question: &str, context: &str) -> Prompt {
        Prompt {
            kind: PromptKind::Grounded,
            instructions: self.grounded.instructions.clone(),
            question: question.to_string(),
            context: context.to_string(),
        }
    }

    /// Prompt inputs for a direct answer without retrieval.
    pub fn fallback(&self, question: &str) -> Prompt {
        Prompt {
            kind: PromptKind::Fallback,
            instructions: self.fallback.instructions.clone(),
            question: question.to_string(),
            context: String::new(),
        }
    }

    /// Render prompt inputs into a single text block.
    pub fn render(&self, prompt: &Prompt) -> AppResult<BuiltPrompt> {
        let definition = self.definition(prompt.kind);

        tracing::debug!("Building prompt: {}", definition.id);

        let text = self
            .registry
            .render(prompt.kind.id(), prompt)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        let context_included =
            prompt.kind == PromptKind::Grounded && !prompt.context.is_empty();

        Ok(BuiltPrompt::new(
            text,
            definition.id.clone(),
            prompt.kind,
            context_included,
        ))
    }
}
