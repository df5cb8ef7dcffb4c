use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

use super::step::StepId;
use crate::error::{KycError, KycResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Uploading,
    Success,
    Error,
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Success => write!(f, "success"),
            UploadStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSide {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Pdf,
    Video,
}

/// A single document upload position. Aadhar has one slot per side.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    AadharFront,
    AadharBack,
    Pancard,
    Passport,
    Photo,
    Selfie,
    Video,
}

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];
const IMAGE_OR_PDF_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];
const VIDEO_TYPES: &[&str] = &["video/webm", "video/mp4"];

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 7] = [
        DocumentSlot::AadharFront,
        DocumentSlot::AadharBack,
        DocumentSlot::Pancard,
        DocumentSlot::Passport,
        DocumentSlot::Photo,
        DocumentSlot::Selfie,
        DocumentSlot::Video,
    ];

    /// Document type string sent to the backend.
    pub fn doc_type(self) -> &'static str {
        match self {
            DocumentSlot::AadharFront => "aadhar_front",
            DocumentSlot::AadharBack => "aadhar_back",
            DocumentSlot::Pancard => "pancard",
            DocumentSlot::Passport => "passport",
            DocumentSlot::Photo => "photo",
            DocumentSlot::Selfie => "selfie",
            DocumentSlot::Video => "video",
        }
    }

    pub fn step(self) -> StepId {
        match self {
            DocumentSlot::AadharFront | DocumentSlot::AadharBack => StepId::Aadhar,
            DocumentSlot::Pancard => StepId::Pancard,
            DocumentSlot::Passport => StepId::Passport,
            DocumentSlot::Photo => StepId::Photo,
            DocumentSlot::Selfie => StepId::Selfie,
            DocumentSlot::Video => StepId::Video,
        }
    }

    pub fn side(self) -> Option<DocumentSide> {
        match self {
            DocumentSlot::AadharFront => Some(DocumentSide::Front),
            DocumentSlot::AadharBack => Some(DocumentSide::Back),
            _ => None,
        }
    }

    pub fn kind(self) -> FileKind {
        match self {
            DocumentSlot::Pancard | DocumentSlot::Passport => FileKind::Pdf,
            DocumentSlot::Video => FileKind::Video,
            _ => FileKind::Image,
        }
    }

    /// Content types accepted by the slot's file picker.
    pub fn accepted_content_types(self) -> &'static [&'static str] {
        match self {
            DocumentSlot::Pancard | DocumentSlot::Passport => IMAGE_OR_PDF_TYPES,
            DocumentSlot::Video => VIDEO_TYPES,
            DocumentSlot::AadharFront
            | DocumentSlot::AadharBack
            | DocumentSlot::Photo
            | DocumentSlot::Selfie => IMAGE_TYPES,
        }
    }

    pub fn accepts(self, content_type: &str) -> bool {
        let normalized = normalize_mime_type(content_type).to_lowercase();
        self.accepted_content_types()
            .iter()
            .any(|ct| normalized == *ct)
    }

    /// Slots that must all be uploaded before `step` can be completed.
    pub fn for_step(step: StepId) -> Vec<DocumentSlot> {
        Self::ALL
            .iter()
            .copied()
            .filter(|slot| slot.step() == step)
            .collect()
    }
}

impl Display for DocumentSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.doc_type())
    }
}

impl FromStr for DocumentSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "_");
        DocumentSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.doc_type() == normalized)
            .ok_or_else(|| anyhow::anyhow!("Invalid document slot: {}", s))
    }
}

/// Per-slot upload state for the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadState {
    pub kind: FileKind,
    pub file_name: Option<String>,
    pub preview: Option<String>,
    pub status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<DocumentSide>,
}

impl UploadState {
    pub fn empty(slot: DocumentSlot) -> Self {
        Self {
            kind: slot.kind(),
            file_name: None,
            preview: None,
            status: UploadStatus::Pending,
            error: None,
            side: slot.side(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == UploadStatus::Success
    }
}

/// A file selected for upload, held fully in memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl UploadFile {
    pub fn new(
        data: impl Into<Bytes>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }

    /// Read a local file, deriving the content type from its extension.
    pub fn from_path(path: &Path) -> KycResult<Self> {
        if path
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(KycError::InvalidInput(format!(
                "Invalid path: {}",
                path.display()
            )));
        }
        let data = std::fs::read(path).map_err(|e| {
            KycError::Encoding(format!("Failed to read file {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        let content_type = content_type_for_filename(&filename).to_string();

        Ok(Self::new(data, filename, content_type))
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Logical upload request, built fresh per attempt.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: UploadFile,
    pub kyc_case_id: String,
    pub document_type: String,
    pub user_id: Option<String>,
}

/// Upload result, normalized identically whichever service handled it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: false,
            error: Some(if message.is_empty() {
                "Upload failed".to_string()
            } else {
                message
            }),
            ..Default::default()
        }
    }

    /// Error text for a failed response, never empty.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "Upload failed".to_string())
    }
}

/// Normalize MIME type by stripping parameters (e.g. "video/webm;codecs=vp9" -> "video/webm").
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Map a filename extension to the content type the capture components produce.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}
