//! Upload service router
//!
//! Picks the upload strategy once, from configuration, and normalizes every
//! outcome into an [`UploadResponse`].

use anyhow::Result;
use kyc_core::models::{UploadFile, UploadRequest, UploadResponse};
use kyc_core::{KycConfig, UploadServiceKind};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::existing::ExistingUploadService;
use super::lambda::LambdaUploadService;
use super::traits::UploadStrategy;
use crate::build_http_client;

const TEST_CASE_ID: &str = "1";
const TEST_USER_ID: &str = "1";
const TEST_DOCUMENT_TYPE: &str = "test-document";

/// Which service is active and where each one lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub active_service: UploadServiceKind,
    pub new_service_url: String,
    pub existing_service_url: String,
    pub is_new_service: bool,
}

#[derive(Clone)]
pub struct UploadRouter {
    strategy: Arc<dyn UploadStrategy>,
    client: Client,
    health_url: String,
    info: ServiceInfo,
}

impl UploadRouter {
    pub fn from_config(config: &KycConfig) -> Result<Self> {
        let client = build_http_client(config.request_timeout_secs.map(Duration::from_secs))?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: &KycConfig, client: Client) -> Self {
        let strategy: Arc<dyn UploadStrategy> = match config.upload_service {
            UploadServiceKind::Existing => Arc::new(ExistingUploadService::new(
                client.clone(),
                &config.api_base_url,
            )),
            UploadServiceKind::New => Arc::new(LambdaUploadService::new(
                client.clone(),
                config.upload_api_url.clone(),
                config.default_user_id.clone(),
            )),
        };
        Self::with_strategy(config, client, strategy)
    }

    /// Route through a caller-provided strategy.
    pub fn with_strategy(
        config: &KycConfig,
        client: Client,
        strategy: Arc<dyn UploadStrategy>,
    ) -> Self {
        let info = ServiceInfo {
            active_service: strategy.kind(),
            new_service_url: config.upload_api_url.clone(),
            existing_service_url: format!(
                "{}/kyc/upload",
                config.api_base_url.trim_end_matches('/')
            ),
            is_new_service: strategy.kind() == UploadServiceKind::New,
        };

        Self {
            strategy,
            client,
            health_url: config.upload_health_url.clone(),
            info,
        }
    }

    pub fn kind(&self) -> UploadServiceKind {
        self.strategy.kind()
    }

    pub fn service_info(&self) -> &ServiceInfo {
        &self.info
    }

    /// Upload through the active service. Never fails: errors come back as
    /// `success: false` with a non-empty `error`.
    #[tracing::instrument(
        skip(self, request),
        fields(
            service = %self.strategy.kind(),
            case_id = %request.kyc_case_id,
            doc_type = %request.document_type,
            size_bytes = request.file.size()
        )
    )]
    pub async fn upload_file(&self, request: &UploadRequest) -> UploadResponse {
        tracing::debug!(endpoint = self.strategy.endpoint(), "Uploading document");

        match self.strategy.upload(request).await {
            Ok(response) if response.success => {
                tracing::info!(document_id = ?response.document_id, "Document uploaded");
                response
            }
            Ok(response) => {
                let message = response.error_message();
                tracing::warn!(error = %message, "Upload rejected by service");
                UploadResponse {
                    error: Some(message),
                    ..response
                }
            }
            Err(err) => {
                let message = format!("{:#}", err);
                tracing::warn!(error = %message, "Upload failed");
                UploadResponse::failure(message)
            }
        }
    }

    /// Send `file` through the active service as a smoke test, against case `1`
    /// with document type `test-document`.
    pub async fn test_upload(&self, file: UploadFile) -> UploadResponse {
        let request = UploadRequest {
            file,
            kyc_case_id: TEST_CASE_ID.to_string(),
            document_type: TEST_DOCUMENT_TYPE.to_string(),
            user_id: Some(TEST_USER_ID.to_string()),
        };
        self.upload_file(&request).await
    }

    /// Whether the new upload service answers its health check with a 2xx.
    pub async fn check_health(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "Upload service health check failed");
                false
            }
        }
    }
}
