//! Knowledge base catalog client.
//!
//! Pages through `POST {endpoint}/knowledgebases/` until the service stops
//! returning a continuation token. Requests are SigV4-signed.

use super::signing::RequestSigner;
use crate::retriever::KnowledgeBaseCatalog;
use crate::types::KnowledgeBaseSummary;
use kbchat_core::{AppConfig, AppError, AppResult};
use kbchat_llm::http::{build_http_client, describe_failure, endpoint_url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on pages fetched in one listing.
const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// Base URL of the agent control-plane API
    pub endpoint: String,

    /// Page size
    pub max_results: u32,

    pub signer: Arc<RequestSigner>,
    pub timeout: Duration,
}

impl CatalogSettings {
    pub fn from_config(config: &AppConfig, signer: Arc<RequestSigner>) -> Self {
        Self {
            endpoint: config.agent_endpoint(),
            max_results: config.catalog.max_results,
            signer,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListBody<'a> {
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListOutput {
    #[serde(default)]
    knowledge_base_summaries: Vec<RawSummary>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    knowledge_base_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<RawSummary> for KnowledgeBaseSummary {
    fn from(raw: RawSummary) -> Self {
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| raw.knowledge_base_id.clone());

        Self {
            id: raw.knowledge_base_id,
            name,
            status: raw.status,
            description: raw.description,
        }
    }
}

/// Catalog client.
pub struct AgentCatalogClient {
    settings: CatalogSettings,
    client: reqwest::Client,
}

impl AgentCatalogClient {
    pub fn new(settings: CatalogSettings) -> AppResult<Self> {
        let client = build_http_client(settings.timeout)?;
        Ok(Self { settings, client })
    }

    async fn fetch_page(&self, next_token: Option<&str>) -> AppResult<ListOutput> {
        // Trailing empty segment keeps the `/knowledgebases/` path
        let url = endpoint_url(&self.settings.endpoint, &["knowledgebases", ""])?;
        let body = ListBody {
            max_results: self.settings.max_results,
            next_token,
        };

        let response = self
            .settings
            .signer
            .signed_post(&self.client, url, &body)
            .await?
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to list knowledge bases: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval(format!(
                "Failed to list knowledge bases: {}",
                describe_failure(response).await
            )));
        }

        response.json::<ListOutput>().await.map_err(|e| {
            AppError::Retrieval(format!("Failed to parse knowledge base listing: {}", e))
        })
    }
}

#[async_trait::async_trait]
impl KnowledgeBaseCatalog for AgentCatalogClient {
    async fn list_knowledge_bases(&self) -> AppResult<Vec<KnowledgeBaseSummary>> {
        let mut summaries = Vec::new();
        let mut next_token: Option<String> = None;

        for page in 0..MAX_PAGES {
            let output = self.fetch_page(next_token.as_deref()).await?;
            tracing::debug!(
                page,
                count = output.knowledge_base_summaries.len(),
                "Fetched knowledge base page"
            );

            summaries.extend(
                output
                    .knowledge_base_summaries
                    .into_iter()
                    .map(KnowledgeBaseSummary::from),
            );

            match output.next_token.filter(|t| !t.is_empty()) {
                Some(token) if next_token.as_deref() != Some(token.as_str()) => {
                    next_token = Some(token)
                }
                _ => return Ok(summaries),
            }
        }

        tracing::warn!(pages = MAX_PAGES, "Knowledge base listing truncated");
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::Credentials;
    use serde_json::json;

    #[test]
    fn test_list_body() {
        let first = serde_json::to_value(ListBody {
            max_results: 20,
            next_token: None,
        })
        .unwrap();
        assert_eq!(first, json!({"maxResults": 20}));

        let next = serde_json::to_value(ListBody {
            max_results: 20,
            next_token: Some("abc"),
        })
        .unwrap();
        assert_eq!(next, json!({"maxResults": 20, "nextToken": "abc"}));
    }

    #[tokio::test]
    async fn test_list_request_is_signed() {
        let signer = Arc::new(RequestSigner::new(
            Credentials::new("AKIDEXAMPLE", "secret", Some("token".to_string()), None, "test"),
            "eu-west-1",
        ));
        let mut config = AppConfig::default();
        config.region = "eu-west-1".to_string();
        let settings = CatalogSettings::from_config(&config, signer);
        assert_eq!(settings.endpoint, "https://bedrock-agent.eu-west-1.amazonaws.com");

        let client = AgentCatalogClient::new(settings).unwrap();
        let url = endpoint_url(&client.settings.endpoint, &["knowledgebases", ""]).unwrap();
        let body = ListBody {
            max_results: 20,
            next_token: None,
        };

        let request = client
            .settings
            .signer
            .signed_post(&client.client, url, &body)
            .await
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/knowledgebases/");
        assert!(request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .contains("/eu-west-1/bedrock/aws4_request"));
        assert_eq!(request.headers().get("x-amz-security-token").unwrap(), "token");
    }

    #[test]
    fn test_summary_name_falls_back_to_id() {
        let output: ListOutput = serde_json::from_value(json!({
            "knowledgeBaseSummaries": [
                {"knowledgeBaseId": "KB1", "name": "Support docs", "status": "ACTIVE"},
                {"knowledgeBaseId": "KB2"},
                {"knowledgeBaseId": "KB3", "name": ""}
            ]
        }))
        .unwrap();

        let summaries: Vec<KnowledgeBaseSummary> = output
            .knowledge_base_summaries
            .into_iter()
            .map(Into::into)
            .collect();

        assert_eq!(summaries[0].name, "Support docs");
        assert_eq!(summaries[0].status.as_deref(), Some("ACTIVE"));
        assert_eq!(summaries[1].name, "KB2");
        assert_eq!(summaries[2].name, "KB3");
    }
}
