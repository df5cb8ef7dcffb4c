//! Progress-sync glue between the step flow and the backend.
//!
//! [`KycSession`] owns one case: it validates input before any request, routes
//! uploads, records slot outcomes on the [`StepFlow`] and re-reads server progress
//! after every completed step so optimistic local marks are replaced by the
//! server's view.

use kyc_core::media::{validate_clip, ClipInfo, RecordingLimits};
use kyc_core::models::{
    DocumentLinks, DocumentSlot, RegistrationData, ReviewForm, RiskAssessment, RiskFactors,
    StepId, UploadFile, UploadRequest, UploadResponse,
};
use kyc_core::validation::parse_case_id;
use kyc_core::{ErrorMetadata, KycConfig, KycError, KycResult, StepFlow};
use serde::Serialize;
use std::time::Duration;
use validator::Validate;

use crate::upload::{UploadRouter, UploadTracker};
use crate::{into_kyc_error, ApiClient};

/// Review screen contents for a case.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub form: ReviewForm,
    pub documents: DocumentLinks,
    pub submission_status: String,
    pub read_only: bool,
}

pub struct KycSession {
    api: ApiClient,
    uploads: UploadTracker,
    flow: StepFlow,
    case_id: String,
    user_id: String,
    limits: RecordingLimits,
}

impl KycSession {
    pub fn new(api: ApiClient, uploads: UploadTracker, case_id: impl Into<String>) -> Self {
        Self {
            api,
            uploads,
            flow: StepFlow::new(),
            case_id: case_id.into(),
            user_id: KycConfig::default().default_user_id,
            limits: RecordingLimits::default(),
        }
    }

    pub fn from_config(config: &KycConfig, case_id: impl Into<String>) -> anyhow::Result<Self> {
        let api = ApiClient::from_config(config)?;
        let router = UploadRouter::with_client(config, api.client().clone());
        let mut session = Self::new(api, UploadTracker::new(router), case_id);
        session.user_id = config.default_user_id.clone();
        Ok(session)
    }

    pub fn with_recording_limits(mut self, limits: RecordingLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn flow(&self) -> &StepFlow {
        &self.flow
    }

    pub fn flow_mut(&mut self) -> &mut StepFlow {
        &mut self.flow
    }

    pub fn uploads(&self) -> &UploadTracker {
        &self.uploads
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Start a new case for `user_id` and return its id.
    pub async fn create_case(api: &ApiClient, user_id: &str) -> KycResult<String> {
        let created = api.create_case(user_id).await.map_err(into_kyc_error)?;
        created
            .case_id()
            .ok_or_else(|| KycError::Decode("Response did not contain kyc_case_id".to_string()))
    }

    /// Id of the case attached to the current user.
    pub async fn open_case(api: &ApiClient) -> KycResult<String> {
        let opened = api.open_case().await.map_err(into_kyc_error)?;
        opened
            .case_id()
            .ok_or_else(|| KycError::Decode("Response did not contain kyc_case_id".to_string()))
    }

    /// Pull server progress into the flow. On failure the flow keeps its state.
    #[tracing::instrument(skip(self), fields(case_id = %self.case_id))]
    pub async fn fetch_progress(&mut self) -> bool {
        match self.api.fetch_progress(&self.case_id).await {
            Ok(progress) => {
                self.flow.apply_progress(&progress);
                tracing::debug!(
                    current = %self.flow.current(),
                    completed = self.flow.completed().len(),
                    "Progress applied"
                );
                true
            }
            Err(err) => {
                tracing::warn!(error = %format!("{:#}", err), "Failed to fetch progress");
                false
            }
        }
    }

    #[tracing::instrument(skip(self, data), fields(case_id = %self.case_id))]
    pub async fn register(&mut self, data: &RegistrationData) -> KycResult<()> {
        data.validate()?;
        let kyc_case_id = parse_case_id(&self.case_id)?;

        self.api
            .register(data, kyc_case_id)
            .await
            .map_err(into_kyc_error)?;
        tracing::info!("Registration submitted");

        self.flow.complete_step(StepId::Registration)?;
        self.fetch_progress().await;
        Ok(())
    }

    /// Validate and upload one document slot.
    ///
    /// Input problems are returned as `Err` without touching the network. Upload
    /// failures come back as `Ok` with `success: false`; either way the slot
    /// records the outcome. The video slot only takes recordings, see
    /// [`KycSession::upload_recording`].
    pub async fn upload_document(
        &mut self,
        slot: DocumentSlot,
        file: UploadFile,
    ) -> KycResult<UploadResponse> {
        if slot == DocumentSlot::Video {
            return Err(KycError::InvalidInput(
                "Video must be uploaded as a recording".to_string(),
            ));
        }
        self.upload_slot(slot, file).await
    }

    #[tracing::instrument(
        skip(self, file),
        fields(case_id = %self.case_id, slot = %slot, filename = %file.filename)
    )]
    async fn upload_slot(
        &mut self,
        slot: DocumentSlot,
        file: UploadFile,
    ) -> KycResult<UploadResponse> {
        if self.flow.is_read_only() {
            return Err(KycError::ReadOnly);
        }
        if let Err(err) = self.check_upload(slot, &file) {
            self.flow.mark_failed(slot, err.client_message())?;
            return Err(err);
        }

        self.flow.select_file(slot, file.filename.clone(), None)?;
        self.flow.mark_uploading(slot)?;

        let request = UploadRequest {
            file,
            kyc_case_id: self.case_id.clone(),
            document_type: slot.doc_type().to_string(),
            user_id: Some(self.user_id.clone()),
        };
        let response = self.uploads.upload(&request).await;

        if response.success {
            self.flow.mark_uploaded(slot)?;
        } else {
            self.flow.mark_failed(slot, response.error_message())?;
        }
        Ok(response)
    }

    /// Upload a finished video recording. Recordings stopped before the minimum
    /// length never reach the upload service.
    pub async fn upload_recording(
        &mut self,
        elapsed: Duration,
        clip: &ClipInfo,
        file: UploadFile,
    ) -> KycResult<UploadResponse> {
        self.limits.check_stop(elapsed)?;
        validate_clip(clip, &self.limits)?;
        self.upload_slot(DocumentSlot::Video, file).await
    }

    /// Optimistically complete `step`, then re-read progress from the server.
    pub async fn complete_step(&mut self, step: StepId) -> KycResult<StepId> {
        self.flow.complete_step(step)?;
        self.fetch_progress().await;
        Ok(self.flow.current())
    }

    /// Load the review form, pre-populated from the case's stored details.
    #[tracing::instrument(skip(self), fields(case_id = %self.case_id))]
    pub async fn load_review(&mut self) -> KycResult<ReviewState> {
        let screen = self
            .api
            .fetch_screen_data(&self.case_id)
            .await
            .map_err(into_kyc_error)?;

        if screen.is_submitted() && !self.flow.is_submitted() {
            self.flow.confirm_submission();
        }

        let form = screen
            .details
            .as_ref()
            .map(ReviewForm::from_details)
            .unwrap_or_default();

        Ok(ReviewState {
            form,
            documents: screen.document_links(),
            submission_status: screen.submission_status().to_string(),
            read_only: screen.is_submitted() || self.flow.is_read_only(),
        })
    }

    #[tracing::instrument(skip(self, form), fields(case_id = %self.case_id))]
    pub async fn submit_review(&mut self, form: &ReviewForm) -> KycResult<()> {
        if self.flow.is_read_only() {
            return Err(KycError::ReadOnly);
        }
        form.validate()?;
        let kyc_case_id = parse_case_id(&self.case_id)?;

        self.api
            .submit_details(&form.to_payload(kyc_case_id))
            .await
            .map_err(into_kyc_error)?;
        tracing::info!("KYC details submitted");

        self.fetch_progress().await;
        self.flow.confirm_submission();
        Ok(())
    }

    pub async fn analyze_risk(&self) -> KycResult<RiskAssessment> {
        let screen = self
            .api
            .fetch_screen_data(&self.case_id)
            .await
            .map_err(into_kyc_error)?;
        let assessment = RiskAssessment::from(RiskFactors::from_screen_data(&screen));
        tracing::info!(
            case_id = %self.case_id,
            score = assessment.score,
            level = %assessment.level,
            "Risk analyzed"
        );
        Ok(assessment)
    }

    fn check_upload(&self, slot: DocumentSlot, file: &UploadFile) -> KycResult<()> {
        parse_case_id(&self.case_id)?;
        if !slot.accepts(&file.content_type) {
            return Err(KycError::UnsupportedFileType {
                slot: slot.to_string(),
                content_type: file.content_type.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::models::{Address, UploadStatus};
    use kyc_core::UploadServiceKind;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn session(server: &ServerGuard, case_id: &str) -> KycSession {
        let config = KycConfig {
            api_base_url: server.url(),
            upload_service: UploadServiceKind::Existing,
            ..Default::default()
        };
        KycSession::from_config(&config, case_id).unwrap()
    }

    fn jpeg(name: &str) -> UploadFile {
        UploadFile::new(b"jpeg".to_vec(), name, "image/jpeg")
    }

    fn progress_body(current: &str, completed: &[&str]) -> String {
        let steps: Vec<_> = completed
            .iter()
            .map(|id| json!({"id": id, "status": "completed"}))
            .collect();
        json!({"current_step": current, "steps": steps}).to_string()
    }

    fn review_form() -> ReviewForm {
        ReviewForm {
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            occupation: "Engineer".to_string(),
            source_of_funds: "salary".to_string(),
            annual_income: "800000".to_string(),
            address: Address {
                street: "1 Main St".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                pincode: "411001".to_string(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_non_numeric_case_id_never_uploads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/upload")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "abc");
        let err = session
            .upload_document(DocumentSlot::Photo, jpeg("photo.jpg"))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, KycError::InvalidCaseId(_)));
        let state = session.flow().upload(DocumentSlot::Photo);
        assert_eq!(state.status, UploadStatus::Error);
        assert_eq!(state.error.as_deref(), Some("Invalid KYC case ID"));
    }

    #[tokio::test]
    async fn test_wrong_file_type_is_rejected_locally() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/upload")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let video = UploadFile::new(b"v".to_vec(), "clip.webm", "video/webm");
        let err = session
            .upload_document(DocumentSlot::Pancard, video)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, KycError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn test_aadhar_uploads_then_complete_step_resyncs() {
        let mut server = Server::new_async().await;
        let upload = server
            .mock("POST", "/kyc/upload")
            .with_status(200)
            .with_body(r#"{"success": true, "documentId": 1}"#)
            .expect(2)
            .create_async()
            .await;
        let progress = server
            .mock("GET", "/kyc/progress/8")
            .with_status(200)
            .with_body(progress_body(
                "pan_upload",
                &["registration", "aadhar_upload"],
            ))
            .create_async()
            .await;

        let mut session = session(&server, "8");
        session.flow_mut().advance();

        session
            .upload_document(DocumentSlot::AadharFront, jpeg("front.jpg"))
            .await
            .unwrap();
        assert!(matches!(
            session.complete_step(StepId::Aadhar).await,
            Err(KycError::StepIncomplete(_))
        ));

        session
            .upload_document(DocumentSlot::AadharBack, jpeg("back.jpg"))
            .await
            .unwrap();
        let current = session.complete_step(StepId::Aadhar).await.unwrap();

        upload.assert_async().await;
        progress.assert_async().await;
        assert_eq!(current, StepId::Pancard);
        assert!(session.flow().is_complete(StepId::Registration));
        assert!(session.flow().is_complete(StepId::Aadhar));
    }

    #[tokio::test]
    async fn test_failed_upload_marks_slot_error() {
        let mut server = Server::new_async().await;
        let _upload = server
            .mock("POST", "/kyc/upload")
            .with_status(502)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let response = session
            .upload_document(DocumentSlot::Selfie, jpeg("selfie.jpg"))
            .await
            .unwrap();

        assert!(!response.success);
        let state = session.flow().upload(DocumentSlot::Selfie);
        assert_eq!(state.status, UploadStatus::Error);
        assert_eq!(state.error.as_deref(), Some("Upload failed: 502 Bad Gateway"));
        assert!(!session.flow().can_proceed(StepId::Selfie));
    }

    #[tokio::test]
    async fn test_progress_failure_keeps_local_state() {
        let mut server = Server::new_async().await;
        let _progress = server
            .mock("GET", "/kyc/progress/8")
            .with_status(500)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        session.flow_mut().advance();
        session.flow_mut().mark_complete(StepId::Registration);

        assert!(!session.fetch_progress().await);
        assert_eq!(session.flow().current(), StepId::Aadhar);
        assert!(session.flow().is_complete(StepId::Registration));
    }

    #[tokio::test]
    async fn test_short_recording_never_uploads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/upload")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let clip = ClipInfo {
            duration: Duration::from_secs(3),
            has_video_track: true,
            has_audio_track: true,
        };
        let file = UploadFile::new(b"v".to_vec(), "verification.webm", "video/webm");
        let err = session
            .upload_recording(Duration::from_secs(3), &clip, file)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert_eq!(err.client_message(), "Recording must be at least 5 seconds");
    }

    #[tokio::test]
    async fn test_video_slot_requires_recording() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/upload")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let file = UploadFile::new(b"v".to_vec(), "verification.webm", "video/webm");
        let err = session
            .upload_document(DocumentSlot::Video, file)
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, KycError::InvalidInput(_)));
        assert_eq!(
            session.flow().upload(DocumentSlot::Video).status,
            UploadStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_recording_within_limits_uploads() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/upload")
            .with_status(200)
            .with_body(r#"{"success": true, "documentId": 3}"#)
            .expect(1)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let clip = ClipInfo {
            duration: Duration::from_secs(7),
            has_video_track: true,
            has_audio_track: true,
        };
        let file = UploadFile::new(b"v".to_vec(), "verification.webm", "video/webm");
        let response = session
            .upload_recording(Duration::from_secs(7), &clip, file)
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(response.success);
        assert_eq!(
            session.flow().upload(DocumentSlot::Video).status,
            UploadStatus::Success
        );
    }

    #[tokio::test]
    async fn test_register_completes_registration() {
        let mut server = Server::new_async().await;
        let register = server
            .mock("POST", "/kyc/register")
            .match_body(Matcher::PartialJson(json!({"kyc_case_id": 8})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _progress = server
            .mock("GET", "/kyc/progress/8")
            .with_status(200)
            .with_body(progress_body("aadhar_upload", &["registration"]))
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let data = RegistrationData {
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            password: "Str0ng!pw".to_string(),
            ..Default::default()
        };
        session.register(&data).await.unwrap();

        register.assert_async().await;
        assert_eq!(session.flow().current(), StepId::Aadhar);
    }

    #[tokio::test]
    async fn test_invalid_registration_is_not_sent() {
        let mut server = Server::new_async().await;
        let register = server
            .mock("POST", "/kyc/register")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let data = RegistrationData {
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        let err = session.register(&data).await.unwrap_err();

        register.assert_async().await;
        assert!(matches!(err, KycError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submitted_case_loads_read_only_and_refuses_submit() {
        let mut server = Server::new_async().await;
        let _screen = server
            .mock("GET", "/kyc/screen-data/8")
            .with_status(200)
            .with_body(
                json!({
                    "case": {"id": 8},
                    "details": {"name": "Asha Rao", "address": "1 Main St, Pune, MH, 411001"},
                    "documents": [{"doc_type": "pancard", "file_path": "s3://k/p.jpg"}],
                    "kyc_submitted": {"status": "completed"}
                })
                .to_string(),
            )
            .create_async()
            .await;
        let details = server
            .mock("POST", "/kyc/details")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let review = session.load_review().await.unwrap();
        assert!(review.read_only);
        assert_eq!(review.form.name, "Asha Rao");
        assert_eq!(review.form.address.city, "Pune");
        assert_eq!(review.documents.pancard.as_deref(), Some("s3://k/p.jpg"));
        assert!(session.flow().is_submitted());

        let err = session.submit_review(&review_form()).await.unwrap_err();
        details.assert_async().await;
        assert!(matches!(err, KycError::ReadOnly));
    }

    #[tokio::test]
    async fn test_submit_review_confirms_submission() {
        let mut server = Server::new_async().await;
        let details = server
            .mock("POST", "/kyc/details")
            .match_body(Matcher::PartialJson(json!({
                "address": "1 Main St, Pune, MH, 411001",
                "kyc_case_id": 8
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let _progress = server
            .mock("GET", "/kyc/progress/8")
            .with_status(200)
            .with_body(progress_body("review", &["review"]))
            .create_async()
            .await;

        let mut session = session(&server, "8");
        session.submit_review(&review_form()).await.unwrap();

        details.assert_async().await;
        assert!(session.flow().is_submitted());
        assert!(session.flow().is_read_only());
    }

    #[tokio::test]
    async fn test_invalid_review_is_not_sent() {
        let mut server = Server::new_async().await;
        let details = server
            .mock("POST", "/kyc/details")
            .expect(0)
            .create_async()
            .await;

        let mut session = session(&server, "8");
        let form = ReviewForm {
            is_pep: true,
            ..review_form()
        };
        let err = session.submit_review(&form).await.unwrap_err();

        details.assert_async().await;
        assert!(err.to_string().contains("Please provide PEP details"));
    }

    #[tokio::test]
    async fn test_create_case_and_analyze_risk() {
        let mut server = Server::new_async().await;
        let _case = server
            .mock("POST", "/kyc/case")
            .with_status(200)
            .with_body(r#"{"kyc_case_id": 8}"#)
            .create_async()
            .await;
        let _screen = server
            .mock("GET", "/kyc/screen-data/8")
            .with_status(200)
            .with_body(
                json!({"details": {"is_pep": true, "annual_income": "5000000"}}).to_string(),
            )
            .create_async()
            .await;

        let api = ApiClient::new(server.url(), None).unwrap();
        let case_id = KycSession::create_case(&api, "1").await.unwrap();
        assert_eq!(case_id, "8");

        let session = session(&server, &case_id);
        let risk = session.analyze_risk().await.unwrap();
        assert!(risk.factors.pep_status);
        assert!(risk.factors.high_value_transaction);
    }
}
