//! Multipart upload to the main API (`POST /kyc/upload`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use kyc_core::models::{UploadRequest, UploadResponse};
use kyc_core::UploadServiceKind;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::traits::UploadStrategy;
use crate::error_detail;

pub struct ExistingUploadService {
    client: Client,
    upload_url: String,
}

impl ExistingUploadService {
    pub fn new(client: Client, api_base_url: &str) -> Self {
        Self {
            client,
            upload_url: format!("{}/kyc/upload", api_base_url.trim_end_matches('/')),
        }
    }

    fn build_form(request: &UploadRequest) -> Result<Form> {
        let mut part = Part::bytes(request.file.data.to_vec())
            .file_name(request.file.filename.clone());
        if !request.file.content_type.is_empty() {
            part = part
                .mime_str(&request.file.content_type)
                .context("Invalid content type")?;
        }

        Ok(Form::new()
            .part("file", part)
            .text("kyc_case_id", request.kyc_case_id.clone())
            .text("doc_type", request.document_type.clone()))
    }
}

#[async_trait]
impl UploadStrategy for ExistingUploadService {
    fn kind(&self) -> UploadServiceKind {
        UploadServiceKind::Existing
    }

    fn endpoint(&self) -> &str {
        &self.upload_url
    }

    async fn upload(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let form = Self::build_form(request)?;

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                error_detail(&error_text).unwrap_or_else(|| format!("Upload failed: {}", status));
            return Ok(UploadResponse::failure(message));
        }

        let body: UploadResponse = response
            .json()
            .await
            .context("Failed to parse upload response as JSON")?;

        // This backend only reports these four fields.
        Ok(UploadResponse {
            success: body.success,
            document_id: body.document_id,
            s3_url: body.s3_url,
            error: body.error,
            ..Default::default()
        })
    }
}
