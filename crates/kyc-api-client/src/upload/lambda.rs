//! Base64 JSON upload to the S3/Lambda service.

use anyhow::{Context, Result};
use async_trait::async_trait;
use kyc_core::models::{UploadRequest, UploadResponse};
use kyc_core::validation::parse_case_id;
use kyc_core::{KycError, UploadServiceKind};
use reqwest::Client;
use serde::Serialize;

use super::encoding::{clean_content_type, encode_file_base64};
use super::traits::UploadStrategy;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LambdaUploadPayload<'a> {
    file_buffer: String,
    original_filename: &'a str,
    content_type: &'a str,
    kyc_case_id: i64,
    doc_type: &'a str,
    user_id: i64,
}

pub struct LambdaUploadService {
    client: Client,
    upload_url: String,
    default_user_id: String,
}

impl LambdaUploadService {
    pub fn new(client: Client, upload_url: String, default_user_id: String) -> Self {
        Self {
            client,
            upload_url,
            default_user_id,
        }
    }
}

#[async_trait]
impl UploadStrategy for LambdaUploadService {
    fn kind(&self) -> UploadServiceKind {
        UploadServiceKind::New
    }

    fn endpoint(&self) -> &str {
        &self.upload_url
    }

    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let kyc_case_id = parse_case_id(&request.kyc_case_id)?;
        let user_id_text = request.user_id.as_deref().unwrap_or(&self.default_user_id);
        let user_id = user_id_text.trim().parse::<i64>().map_err(|_| {
            KycError::InvalidInput(format!("Invalid user ID: {}", user_id_text))
        })?;

        let file_buffer = encode_file_base64(&request.file.data)?;
        let payload = LambdaUploadPayload {
            file_buffer,
            original_filename: &request.file.filename,
            content_type: clean_content_type(&request.file.content_type),
            kyc_case_id,
            doc_type: &request.document_type,
            user_id,
        };

        tracing::debug!(
            base64_len = payload.file_buffer.len(),
            content_type = payload.content_type,
            "Prepared upload payload"
        );

        let response = self
            .client
            .post(&self.upload_url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send upload request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = if error_text.trim().is_empty() {
                format!("Upload failed: {}", status)
            } else {
                error_text
            };
            return Ok(UploadResponse::failure(message));
        }

        response
            .json::<UploadResponse>()
            .await
            .context("Failed to parse upload response as JSON")
    }
}
