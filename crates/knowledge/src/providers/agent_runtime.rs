//! Knowledge base runtime client.
//!
//! Implements both retrieval paths against the agent runtime API:
//! - `POST {endpoint}/knowledgebases/{id}/retrieve`
//! - `POST {endpoint}/retrieveAndGenerate`
//!
//! Both calls are SigV4-signed.

use super::signing::RequestSigner;
use crate::retriever::{RetrieveAndGenerate, Retriever};
use crate::types::{CompositeResponse, Passage};
use kbchat_core::{AppConfig, AppError, AppResult};
use kbchat_llm::http::{build_http_client, describe_failure, endpoint_url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Settings for the runtime client.
#[derive(Debug, Clone)]
pub struct AgentRuntimeSettings {
    /// Base URL of the agent runtime API
    pub endpoint: String,

    /// Model used by the composite call
    pub model_arn: String,

    /// Passage limit; the service default applies when unset
    pub number_of_results: Option<u32>,

    pub signer: Arc<RequestSigner>,
    pub timeout: Duration,
}

impl AgentRuntimeSettings {
    pub fn from_config(config: &AppConfig, signer: Arc<RequestSigner>) -> Self {
        Self {
            endpoint: config.agent_runtime_endpoint(),
            model_arn: config.model_arn(),
            number_of_results: config.retrieval.number_of_results,
            signer,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration {
    vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration {
    number_of_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    retrieval_query: TextInput<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieval_configuration: Option<RetrievalConfiguration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveOutput {
    #[serde(default)]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Debug, Deserialize)]
struct RetrievalResult {
    #[serde(default)]
    content: Option<RetrievalContent>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RetrievalContent {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveAndGenerateBody<'a> {
    input: TextInput<'a>,
    retrieve_and_generate_configuration: RagConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagConfiguration<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    knowledge_base_configuration: KnowledgeBaseConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeBaseConfiguration<'a> {
    knowledge_base_id: &'a str,
    model_arn: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    retrieval_configuration: Option<RetrievalConfiguration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveAndGenerateOutput {
    #[serde(default)]
    output: Option<RagOutput>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    citations: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RagOutput {
    #[serde(default)]
    text: Option<String>,
}

/// Agent runtime client.
pub struct AgentRuntimeClient {
    settings: AgentRuntimeSettings,
    client: reqwest::Client,
}

impl AgentRuntimeClient {
    pub fn new(settings: AgentRuntimeSettings) -> AppResult<Self> {
        let client = build_http_client(settings.timeout)?;
        Ok(Self { settings, client })
    }

    fn retrieval_configuration(&self) -> Option<RetrievalConfiguration> {
        self.settings
            .number_of_results
            .map(|number_of_results| RetrievalConfiguration {
                vector_search_configuration: VectorSearchConfiguration { number_of_results },
            })
    }

    fn retrieve_body<'a>(&self, query: &'a str) -> RetrieveBody<'a> {
        RetrieveBody {
            retrieval_query: TextInput { text: query },
            retrieval_configuration: self.retrieval_configuration(),
        }
    }

    fn retrieve_and_generate_body<'a>(
        &'a self,
        query: &'a str,
        knowledge_base_id: &'a str,
    ) -> RetrieveAndGenerateBody<'a> {
        RetrieveAndGenerateBody {
            input: TextInput { text: query },
            retrieve_and_generate_configuration: RagConfiguration {
                kind: "KNOWLEDGE_BASE",
                knowledge_base_configuration: KnowledgeBaseConfiguration {
                    knowledge_base_id,
                    model_arn: &self.settings.model_arn,
                    retrieval_configuration: self.retrieval_configuration(),
                },
            },
        }
    }

    /// POST a JSON body and return the raw success payload.
    async fn post<B: Serialize>(&self, url: reqwest::Url, body: &B, action: &str) -> AppResult<Vec<u8>> {
        let response = self
            .settings
            .signer
            .signed_post(&self.client, url, body)
            .await?
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval(format!(
                "Failed to {}: {}",
                action,
                describe_failure(response).await
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to read {} response: {}", action, e)))?;

        Ok(bytes.to_vec())
    }
}

/// Convert raw retrieval results into passages, skipping results without text.
fn to_passages(output: RetrieveOutput) -> Vec<Passage> {
    output
        .retrieval_results
        .into_iter()
        .enumerate()
        .filter_map(|(source_index, result)| {
            let text = result
                .content
                .and_then(|c| c.text)
                .filter(|t| !t.trim().is_empty())?;

            Some(Passage {
                text,
                source_index,
                score: result.score,
                location: result.location.as_ref().and_then(describe_location),
            })
        })
        .collect()
}

/// Pick a human-readable reference out of a location object.
///
/// Locations look like `{"type": "S3", "s3Location": {"uri": "s3://..."}}`;
/// the first nested `uri`, `url` or `id` wins.
fn describe_location(location: &serde_json::Value) -> Option<String> {
    location
        .as_object()?
        .values()
        .filter_map(|v| v.as_object())
        .find_map(|inner| {
            ["uri", "url", "id"]
                .iter()
                .find_map(|key| inner.get(*key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
}

#[async_trait::async_trait]
impl Retriever for AgentRuntimeClient {
    fn backend_name(&self) -> &str {
        "agent-runtime"
    }

    async fn retrieve(&self, query: &str, knowledge_base_id: &str) -> AppResult<Vec<Passage>> {
        let url = endpoint_url(
            &self.settings.endpoint,
            &["knowledgebases", knowledge_base_id, "retrieve"],
        )?;

        tracing::debug!(knowledge_base = knowledge_base_id, "Retrieving passages");

        let bytes = self
            .post(url, &self.retrieve_body(query), "retrieve passages")
            .await?;
        let output: RetrieveOutput = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Retrieval(format!("Failed to parse retrieve response: {}", e))
        })?;

        let passages = to_passages(output);
        tracing::debug!(count = passages.len(), "Retrieved passages");

        Ok(passages)
    }
}

#[async_trait::async_trait]
impl RetrieveAndGenerate for AgentRuntimeClient {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        knowledge_base_id: &str,
    ) -> AppResult<CompositeResponse> {
        let url = endpoint_url(&self.settings.endpoint, &["retrieveAndGenerate"])?;

        tracing::debug!(
            knowledge_base = knowledge_base_id,
            model_arn = %self.settings.model_arn,
            "Calling retrieve-and-generate"
        );

        let body = self.retrieve_and_generate_body(query, knowledge_base_id);
        let bytes = self.post(url, &body, "retrieve and generate").await?;
        let output: RetrieveAndGenerateOutput = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Retrieval(format!("Failed to parse retrieve-and-generate response: {}", e))
        })?;

        Ok(CompositeResponse {
            output_text: output.output.and_then(|o| o.text),
            session_id: output.session_id,
            citation_count: output.citations.len(),
        })
    }
}
