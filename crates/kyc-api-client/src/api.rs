//! Domain methods for the KYC API client.
//!
//! Response types live in `kyc_core::models`; request bodies keep the backend's
//! snake_case field names.

use crate::ApiClient;
use anyhow::{Context, Result};
use kyc_core::models::{
    CreateCaseResponse, KycDetailsPayload, ProgressResponse, RegistrationData,
    RegistrationPayload, ScreenData,
};

impl ApiClient {
    /// Server-owned progress of a case.
    pub async fn fetch_progress(&self, case_id: &str) -> Result<ProgressResponse> {
        self.get(
            &format!("/kyc/progress/{}", urlencoding::encode(case_id)),
            &[],
        )
        .await
        .with_context(|| format!("Failed to fetch progress for case {}", case_id))
    }

    /// Case, details and documents bundle used by the review screen.
    pub async fn fetch_screen_data(&self, case_id: &str) -> Result<ScreenData> {
        self.get(
            &format!("/kyc/screen-data/{}", urlencoding::encode(case_id)),
            &[],
        )
        .await
        .with_context(|| format!("Failed to fetch screen data for case {}", case_id))
    }

    /// Submitted KYC details of a case, as stored by the backend.
    pub async fn fetch_details(&self, kyc_case_id: i64) -> Result<serde_json::Value> {
        self.get("/kyc/details", &[("kyc_case_id", kyc_case_id.to_string())])
            .await
            .context("Failed to fetch KYC details")
    }

    /// Start a new case for `user_id`.
    pub async fn create_case(&self, user_id: &str) -> Result<CreateCaseResponse> {
        let form = reqwest::multipart::Form::new().text("user_id", user_id.to_string());
        self.post_multipart("/kyc/case", form)
            .await
            .context("Failed to create KYC case")
    }

    /// Case attached to the current user, created server-side when missing.
    pub async fn open_case(&self) -> Result<CreateCaseResponse> {
        self.get("/kyc/case", &[])
            .await
            .context("Failed to open KYC case")
    }

    pub async fn register(
        &self,
        data: &RegistrationData,
        kyc_case_id: i64,
    ) -> Result<serde_json::Value> {
        let payload = RegistrationPayload { data, kyc_case_id };
        self.post_json("/kyc/register", &payload)
            .await
            .context("Failed to register user")
    }

    pub async fn submit_details(&self, payload: &KycDetailsPayload) -> Result<serde_json::Value> {
        self.post_json("/kyc/details", payload)
            .await
            .context("Failed to submit KYC details")
    }

    /// Liveness of the main API.
    pub async fn health(&self) -> Result<serde_json::Value> {
        self.get("/health", &[])
            .await
            .context("API health check failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::models::{ReviewForm, StepId};
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_progress_parses_response() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/kyc/progress/42")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "current_step": "photo_upload",
                    "steps": [
                        {"id": "registration", "status": "completed"},
                        {"id": "aadhar_upload", "status": "completed"},
                        {"id": "photo_upload", "status": "pending"}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let progress = client.fetch_progress("42").await.unwrap();

        mock.assert_async().await;
        assert_eq!(progress.current(), Some(StepId::Photo));
        assert_eq!(progress.completed().len(), 2);
    }

    #[tokio::test]
    async fn test_register_sends_case_id_with_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/register")
            .match_body(Matcher::PartialJson(json!({
                "email": "asha@example.com",
                "kyc_case_id": 5
            })))
            .with_status(200)
            .with_body(r#"{"message":"ok"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let data = RegistrationData {
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            password: "Str0ng!pw".to_string(),
            ..Default::default()
        };
        client.register(&data, 5).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_details_posts_snake_case() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/details")
            .match_body(Matcher::PartialJson(json!({
                "source_of_funds": "salary",
                "kyc_case_id": 3
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let form = ReviewForm {
            source_of_funds: "salary".to_string(),
            ..Default::default()
        };
        client.submit_details(&form.to_payload(3)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_details_uses_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/kyc/details")
            .match_query(Matcher::UrlEncoded("kyc_case_id".into(), "11".into()))
            .with_status(200)
            .with_body(r#"{"occupation":"Engineer"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let details = client.fetch_details(11).await.unwrap();
        mock.assert_async().await;
        assert_eq!(details["occupation"], "Engineer");
    }

    #[tokio::test]
    async fn test_create_case_returns_id() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/kyc/case")
            .match_body(Matcher::Regex("name=\"user_id\"".to_string()))
            .with_status(200)
            .with_body(r#"{"kyc_case_id": 99}"#)
            .create_async()
            .await;

        let client = ApiClient::new(server.url(), None).unwrap();
        let created = client.create_case("1").await.unwrap();
        mock.assert_async().await;
        assert_eq!(created.case_id().as_deref(), Some("99"));
    }
}
