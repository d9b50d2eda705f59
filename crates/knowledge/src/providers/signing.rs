//! SigV4 request signing for the knowledge base APIs.
//!
//! The agent runtime and agent control-plane endpoints only accept requests
//! signed with IAM credentials. Credentials come from the standard provider
//! chain (environment, shared profile, SSO, instance metadata).

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    sign, SignableBody, SignableRequest, SigningParams, SigningSettings,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use kbchat_core::{AppError, AppResult};
use serde::Serialize;
use std::fmt;
use std::time::SystemTime;

/// Service name used in the credential scope.
const SIGNING_NAME: &str = "bedrock";

/// Signs outgoing requests with credentials from a provider.
pub struct RequestSigner {
    credentials: SharedCredentialsProvider,
    region: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(credentials: impl ProvideCredentials + 'static, region: impl Into<String>) -> Self {
        Self {
            credentials: SharedCredentialsProvider::new(credentials),
            region: region.into(),
        }
    }

    /// Resolve credentials through the default provider chain.
    pub async fn from_env(region: &str) -> AppResult<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let credentials = sdk_config.credentials_provider().ok_or_else(|| {
            AppError::Config("No AWS credentials provider could be configured".to_string())
        })?;

        tracing::debug!(region, "Loaded request signing credentials provider");

        Ok(Self {
            credentials,
            region: region.to_string(),
        })
    }

    /// Headers to add to a request so the service accepts it.
    pub async fn sign(
        &self,
        method: &str,
        url: &reqwest::Url,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> AppResult<Vec<(String, String)>> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to resolve AWS credentials: {}", e)))?;

        signed_headers(
            credentials,
            &self.region,
            method,
            url,
            headers,
            body,
            SystemTime::now(),
        )
    }

    /// Build a signed JSON POST.
    ///
    /// The body is serialized once so the signed payload hash matches the
    /// bytes on the wire.
    pub async fn signed_post<B: Serialize>(
        &self,
        client: &reqwest::Client,
        url: reqwest::Url,
        body: &B,
    ) -> AppResult<reqwest::RequestBuilder> {
        let payload = serde_json::to_vec(body)?;
        let headers = [
            ("content-type", "application/json"),
            ("accept", "application/json"),
        ];

        let signature = self.sign("POST", &url, &headers, &payload).await?;

        let mut request = client.post(url);
        for (name, value) in headers.iter().copied() {
            request = request.header(name, value);
        }
        for (name, value) in signature {
            request = request.header(name, value);
        }

        Ok(request.body(payload))
    }
}

/// Compute SigV4 headers for a request at a fixed time.
pub fn signed_headers(
    credentials: Credentials,
    region: &str,
    method: &str,
    url: &reqwest::Url,
    headers: &[(&str, &str)],
    body: &[u8],
    time: SystemTime,
) -> AppResult<Vec<(String, String)>> {
    let identity: Identity = credentials.into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SIGNING_NAME)
        .time(time)
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| AppError::Config(format!("Invalid signing parameters: {}", e)))?
        .into();

    let signable = SignableRequest::new(
        method,
        url.as_str(),
        headers.iter().copied(),
        SignableBody::Bytes(body),
    )
    .map_err(|e| AppError::Retrieval(format!("Failed to prepare request for signing: {}", e)))?;

    let (instructions, _signature) = sign(signable, &params)
        .map_err(|e| AppError::Retrieval(format!("Failed to sign request: {}", e)))?
        .into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn credentials(session_token: Option<&str>) -> Credentials {
        Credentials::new(
            "AKIDEXAMPLE",
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            session_token.map(str::to_string),
            None,
            "test",
        )
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn url() -> reqwest::Url {
        reqwest::Url::parse(
            "https://bedrock-agent-runtime.us-east-1.amazonaws.com/knowledgebases/KB1/retrieve",
        )
        .unwrap()
    }

    const NEW_YEAR_2024: Duration = Duration::from_secs(1_704_067_200);

    #[test]
    fn test_signed_headers_scope_and_date() {
        let headers = signed_headers(
            credentials(Some("session-token")),
            "us-east-1",
            "POST",
            &url(),
            &[("content-type", "application/json")],
            br#"{"retrievalQuery":{"text":"q"}}"#,
            UNIX_EPOCH + NEW_YEAR_2024,
        )
        .unwrap();

        let authorization = header(&headers, "authorization").unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/us-east-1/bedrock/aws4_request"
        ));
        assert!(authorization.contains("content-type"));
        assert!(authorization.contains("host"));
        assert_eq!(header(&headers, "x-amz-date"), Some("20240101T000000Z"));
        assert_eq!(header(&headers, "x-amz-security-token"), Some("session-token"));
    }

    #[test]
    fn test_signature_covers_body() {
        let sign_body = |body: &[u8]| {
            let headers = signed_headers(
                credentials(None),
                "us-east-1",
                "POST",
                &url(),
                &[],
                body,
                UNIX_EPOCH + NEW_YEAR_2024,
            )
            .unwrap();
            header(&headers, "authorization").unwrap().to_string()
        };

        assert_eq!(sign_body(b"{}"), sign_body(b"{}"));
        assert_ne!(sign_body(b"{}"), sign_body(b"{\"a\":1}"));
    }

    #[test]
    fn test_long_term_credentials_omit_session_token() {
        let headers = signed_headers(
            credentials(None),
            "eu-west-1",
            "POST",
            &url(),
            &[],
            b"{}",
            UNIX_EPOCH + NEW_YEAR_2024,
        )
        .unwrap();

        assert!(header(&headers, "x-amz-security-token").is_none());
        assert!(header(&headers, "authorization")
            .unwrap()
            .contains("/eu-west-1/bedrock/aws4_request"));
    }

    #[tokio::test]
    async fn test_signed_post_replaces_bearer_auth() {
        let signer = RequestSigner::new(credentials(None), "us-east-1");
        let client = reqwest::Client::new();

        let request = signer
            .signed_post(&client, url(), &serde_json::json!({"retrievalQuery": {"text": "q"}}))
            .await
            .unwrap()
            .build()
            .unwrap();

        let authorization = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(authorization.starts_with("AWS4-HMAC-SHA256 "));
        assert!(!authorization.starts_with("Bearer"));
        assert!(request.headers().contains_key("x-amz-date"));
        assert_eq!(
            request.headers().get(reqwest::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(
            request.body().and_then(|b| b.as_bytes()).unwrap(),
            br#"{"retrievalQuery":{"text":"q"}}"#
        );
    }
}
