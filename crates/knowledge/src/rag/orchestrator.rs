//! Fallback query orchestration.
//!
//! A question is answered by the first strategy in [`Strategy::CHAIN`] that
//! yields text:
//! 1. retrieve passages, then generate from a grounded prompt
//! 2. composite retrieve-and-generate
//! 3. direct generation from the question alone
//!
//! Collaborator failures are logged and the chain advances. When every
//! strategy fails the caller gets [`APOLOGY`](crate::rag::APOLOGY). Only
//! validation and cancellation surface as errors.

use crate::context::build_context;
use crate::rag::types::{ChatAnswer, Strategy, StrategyFailure};
use crate::retriever::{RetrieveAndGenerate, Retriever};
use crate::types::{Passage, Query};
use kbchat_core::{AppError, AppResult};
use kbchat_llm::Generator;
use kbchat_prompt::PromptSet;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of one strategy attempt.
enum Step {
    /// Terminal: the strategy produced an answer
    Answer(String),

    /// Recoverable failure: try the next strategy
    Continue(AppError),
}

/// State carried across strategy boundaries within one request.
#[derive(Default)]
struct ChainState {
    /// Passages from the grounded attempt, kept even if generation fails
    passages: Vec<Passage>,
    failures: Vec<StrategyFailure>,
}

/// The backends an orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn Generator>,

    /// Absent when composite retrieve-and-generate is disabled
    pub composite: Option<Arc<dyn RetrieveAndGenerate>>,
}

/// Answers questions against a knowledge base with ordered fallbacks.
///
/// Stateless across calls; one instance can serve any number of requests.
pub struct FallbackOrchestrator {
    collaborators: Collaborators,
    prompts: PromptSet,
}

impl FallbackOrchestrator {
    pub fn new(collaborators: Collaborators, prompts: PromptSet) -> Self {
        Self {
            collaborators,
            prompts,
        }
    }

    /// Answer a question, returning only the text.
    pub async fn answer(&self, question: &str, knowledge_base_id: &str) -> AppResult<String> {
        let answer = self
            .answer_detailed(question, knowledge_base_id, &CancellationToken::new())
            .await?;
        Ok(answer.answer)
    }

    /// Answer a question, abandoning the chain when `cancel` fires.
    pub async fn answer_with_cancel(
        &self,
        question: &str,
        knowledge_base_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let answer = self
            .answer_detailed(question, knowledge_base_id, cancel)
            .await?;
        Ok(answer.answer)
    }

    /// Answer a question and report which strategy answered, the passages
    /// behind a grounded answer and every absorbed failure.
    pub async fn answer_detailed(
        &self,
        question: &str,
        knowledge_base_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<ChatAnswer> {
        let query = Query::new(question, knowledge_base_id)?;

        let span = tracing::info_span!(
            "chat",
            request_id = %uuid::Uuid::new_v4(),
            knowledge_base = %query.knowledge_base_id(),
        );

        self.run_chain(&query, cancel).instrument(span).await
    }

    async fn run_chain(&self, query: &Query, cancel: &CancellationToken) -> AppResult<ChatAnswer> {
        let mut state = ChainState::default();

        for strategy in Strategy::CHAIN {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            tracing::debug!(%strategy, "Trying strategy");

            match self.attempt(strategy, query, &mut state, cancel).await? {
                Step::Answer(answer) => {
                    tracing::info!(%strategy, answer_len = answer.len(), "Answered");

                    let sources = match strategy {
                        Strategy::RetrieveThenGenerate => std::mem::take(&mut state.passages),
                        _ => Vec::new(),
                    };

                    return Ok(ChatAnswer {
                        answer,
                        strategy: strategy.origin(),
                        sources,
                        failures: state.failures,
                    });
                }
                Step::Continue(error) => {
                    if error.is_recoverable() {
                        tracing::warn!(%strategy, kind = error.kind(), error = %error, "Strategy failed");
                    } else {
                        tracing::error!(%strategy, kind = error.kind(), error = %error, "Strategy failed unexpectedly");
                    }
                    state.failures.push(StrategyFailure::new(strategy, &error));
                }
            }
        }

        tracing::warn!(
            attempts = state.failures.len(),
            retrieved = state.passages.len(),
            "All strategies failed, returning apology"
        );

        Ok(ChatAnswer::apology(state.failures))
    }

    /// Run one strategy. `Err` is reserved for cancellation; every other
    /// failure becomes [`Step::Continue`].
    async fn attempt(
        &self,
        strategy: Strategy,
        query: &Query,
        state: &mut ChainState,
        cancel: &CancellationToken,
    ) -> AppResult<Step> {
        let result = match strategy {
            Strategy::RetrieveThenGenerate => {
                self.retrieve_then_generate(query, state, cancel).await
            }
            Strategy::RetrieveAndGenerate => self.retrieve_and_generate(query, cancel).await,
            Strategy::DirectGeneration => self.direct_generation(query, cancel).await,
        };

        match result {
            Ok(answer) => Ok(Step::Answer(answer)),
            Err(AppError::Cancelled) => Err(AppError::Cancelled),
            Err(error) => Ok(Step::Continue(error)),
        }
    }

    async fn retrieve_then_generate(
        &self,
        query: &Query,
        state: &mut ChainState,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let retriever = &self.collaborators.retriever;
        let passages = guarded(
            cancel,
            retriever.retrieve(query.question(), query.knowledge_base_id()),
        )
        .await?;

        tracing::debug!(
            backend = retriever.backend_name(),
            count = passages.len(),
            "Retrieved passages"
        );

        if passages.is_empty() {
            return Err(AppError::Retrieval(format!(
                "No passages found in knowledge base '{}'",
                query.knowledge_base_id()
            )));
        }

        let context = build_context(&passages);
        state.passages = passages;

        let prompt = self
            .prompts
            .render(&self.prompts.grounded(query.question(), &context))?;

        let response = guarded(cancel, self.collaborators.generator.generate(&prompt.text)).await?;
        response.text()
    }

    async fn retrieve_and_generate(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let composite = self.collaborators.composite.as_ref().ok_or_else(|| {
            AppError::Retrieval("Composite retrieve-and-generate is not available".to_string())
        })?;

        let response = guarded(
            cancel,
            composite.retrieve_and_generate(query.question(), query.knowledge_base_id()),
        )
        .await?;

        tracing::debug!(
            citations = response.citation_count,
            session_id = response.session_id.as_deref().unwrap_or(""),
            "Composite call returned"
        );

        response
            .output_text
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AppError::Retrieval("Composite response contained no output text".to_string())
            })
    }

    async fn direct_generation(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let prompt = self.prompts.render(&self.prompts.fallback(query.question()))?;

        let response = guarded(cancel, self.collaborators.generator.generate(&prompt.text)).await?;
        response.text()
    }
}

/// Race a collaborator call against cancellation.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        result = call => result,
    }
}
