use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::fields::{validate_email, validate_password, validate_phone};

/// User registration collected on the first wizard step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub security_questions: Vec<String>,
}

/// Body of `POST /kyc/register`: the registration fields plus the numeric case id.
#[derive(Debug, Serialize)]
pub struct RegistrationPayload<'a> {
    #[serde(flatten)]
    pub data: &'a RegistrationData,
    pub kyc_case_id: i64,
}
