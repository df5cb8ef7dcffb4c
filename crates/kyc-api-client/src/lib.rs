//! HTTP client for the KYC backend.
//!
//! Provides a minimal client with generic GET/POST helpers, domain methods for the
//! case lifecycle endpoints, the upload service router and the [`session::KycSession`]
//! glue that keeps a [`kyc_core::StepFlow`] in sync with the server. The CLI uses
//! this crate directly.

pub mod api;
pub mod session;
pub mod upload;

use anyhow::{Context, Result};
use kyc_core::{KycConfig, KycError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the main KYC API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// No request timeout is applied unless one is given.
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self> {
        let client = build_http_client(timeout)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &KycConfig) -> Result<Self> {
        Self::new(
            config.api_base_url.clone(),
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    /// Create client from environment: KYC_API_URL (or API_URL).
    pub fn from_env() -> Result<Self> {
        let config = KycConfig::from_env()?;
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.context("Failed to send request")?;
        let response = ensure_success(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.client.post(&url).json(body);

        let response = request.send().await.context("Failed to send request")?;
        let response = ensure_success(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.build_url(path);
        let request = self.client.post(&url).multipart(form);

        let response = request.send().await.context("Failed to send request")?;
        let response = ensure_success(response).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// Raw client, shared with the upload strategies.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to create HTTP client")
}

/// Turn a non-2xx response into a typed [`KycError::Http`] inside `anyhow`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = error_detail(&error_text).unwrap_or_else(|| {
        if error_text.trim().is_empty() {
            format!("API request failed with status {}", status)
        } else {
            error_text
        }
    });

    Err(KycError::Http {
        status: status.as_u16(),
        message,
    }
    .into())
}

/// `detail` field of a JSON error body, when the backend sent one.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Recover a [`KycError`] from a client error, classifying transport failures.
pub fn into_kyc_error(err: anyhow::Error) -> KycError {
    if err.downcast_ref::<KycError>().is_some() {
        return match err.downcast::<KycError>() {
            Ok(kyc) => kyc,
            Err(err) => KycError::from(err),
        };
    }

    let transport = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .filter(|e| e.is_connect() || e.is_timeout() || e.is_request())
    });
    if let Some(e) = transport {
        return KycError::Transport(e.to_string());
    }

    if let Some(e) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .filter(|e| e.is_decode())
    {
        return KycError::Decode(e.to_string());
    }

    KycError::from(err)
}

// Re-export the types most callers need alongside the client.
pub use session::KycSession;
pub use upload::{UploadRouter, UploadTracker};

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(
            error_detail(r#"{"detail":"Case not found"}"#).as_deref(),
            Some("Case not found")
        );
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body"],"msg":"field required"}]}"#).as_deref(),
            Some(r#"[{"loc":["body"],"msg":"field required"}]"#)
        );
        assert_eq!(error_detail("Internal Server Error"), None);
        assert_eq!(error_detail(r#"{"message":"nope"}"#), None);
    }

    #[tokio::test]
    async fn test_non_success_carries_status_and_detail() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/kyc/progress/7")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"KYC case not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let err = client
            .get::<serde_json::Value>("/kyc/progress/7", &[])
            .await
            .unwrap_err();

        mock.assert_async().await;
        match into_kyc_error(err) {
            KycError::Http { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "KYC case not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1".to_string(), None).unwrap();
        let err = client
            .get::<serde_json::Value>("/health", &[])
            .await
            .unwrap_err();
        assert!(matches!(into_kyc_error(err), KycError::Transport(_)));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ApiClient::new("http://localhost:8000/".to_string(), None).unwrap();
        assert_eq!(client.build_url("/health"), "http://localhost:8000/health");
    }
}
