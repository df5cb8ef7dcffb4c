use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::step::StepId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendStepStatus {
    NotStarted,
    Pending,
    Completed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStep {
    pub id: String,
    pub status: BackendStepStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStatus {
    #[serde(default)]
    pub status: String,
}

impl SubmissionStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Case progress as reported by `GET /kyc/progress/{caseId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub current_step: String,
    #[serde(default)]
    pub steps: Vec<BackendStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_submitted: Option<SubmissionStatus>,
}

impl ProgressResponse {
    /// Current step translated to the client enumeration.
    pub fn current(&self) -> Option<StepId> {
        StepId::from_backend(&self.current_step)
    }

    /// Completed steps translated through the mapping table; unmapped ids are dropped.
    pub fn completed(&self) -> BTreeSet<StepId> {
        self.steps
            .iter()
            .filter(|step| step.status == BackendStepStatus::Completed)
            .filter_map(|step| StepId::from_backend(&step.id))
            .collect()
    }

    /// Whether the server reports the whole case as submitted.
    pub fn is_submitted(&self) -> bool {
        let listed = self.steps.iter().any(|step| {
            step.id == StepId::Submitted.backend_id() && step.status == BackendStepStatus::Completed
        });
        listed
            || self
                .kyc_submitted
                .as_ref()
                .is_some_and(SubmissionStatus::is_completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDocument {
    pub doc_type: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Case bundle from `GET /kyc/screen-data/{caseId}`, used to pre-populate review.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenData {
    #[serde(default)]
    pub case: serde_json::Value,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub documents: Vec<BackendDocument>,
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc_submitted: Option<SubmissionStatus>,
}

impl ScreenData {
    /// Submission status string, `"pending"` when the server omits it.
    pub fn submission_status(&self) -> &str {
        self.kyc_submitted
            .as_ref()
            .map(|s| s.status.as_str())
            .unwrap_or("pending")
    }

    pub fn is_submitted(&self) -> bool {
        self.submission_status() == "completed"
    }

    pub fn document_links(&self) -> DocumentLinks {
        DocumentLinks::from_documents(&self.documents)
    }
}

/// Stored file location per document, as shown on the review screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aadhar_front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aadhar_back: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pancard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selfie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl DocumentLinks {
    pub fn from_documents(documents: &[BackendDocument]) -> Self {
        let mut links = DocumentLinks::default();
        for doc in documents {
            let target = match doc.doc_type.as_str() {
                "aadhar_front" => &mut links.aadhar_front,
                "aadhar_back" => &mut links.aadhar_back,
                "pancard" => &mut links.pancard,
                "passport" => &mut links.passport,
                "photo" => &mut links.photo,
                "selfie" => &mut links.selfie,
                "video" => &mut links.video,
                _ => continue,
            };
            *target = doc.file_path.clone();
        }
        links
    }
}

/// Response of `POST /kyc/case` and `GET /kyc/case`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaseResponse {
    #[serde(default)]
    pub kyc_case_id: serde_json::Value,
}

impl CreateCaseResponse {
    /// Case id as a string, whether the server sent a number or a string.
    pub fn case_id(&self) -> Option<String> {
        match &self.kyc_case_id {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}
