use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation::fields::{validate_email, validate_phone};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
}

impl Address {
    /// Backend stores the address as one comma-joined string.
    pub fn to_line(&self) -> String {
        format!(
            "{}, {}, {}, {}",
            self.street, self.city, self.state, self.pincode
        )
    }

    pub fn from_line(line: &str) -> Self {
        let mut parts = line.split(',').map(|s| s.trim().to_string());
        Address {
            street: parts.next().unwrap_or_default(),
            city: parts.next().unwrap_or_default(),
            state: parts.next().unwrap_or_default(),
            pincode: parts.next().unwrap_or_default(),
        }
    }
}

/// Review form in the client's camelCase model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_pep_details", skip_on_field_errors = false))]
pub struct ReviewForm {
    // Populated from the uploaded documents
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: Address,
    pub father_name: String,
    pub aadhar_number: String,
    pub pan_number: String,

    // Entered by the customer
    #[validate(
        length(min = 1, message = "This field is required"),
        custom(function = "validate_email")
    )]
    pub email: String,
    #[validate(
        length(min = 1, message = "This field is required"),
        custom(function = "validate_phone")
    )]
    pub phone: String,
    pub alternate_phone: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub occupation: String,
    pub employer: String,
    pub business_type: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub source_of_funds: String,
    #[serde(alias = "isPEP")]
    pub is_pep: bool,
    pub pep_details: String,
    #[validate(length(min = 1, message = "This field is required"))]
    pub annual_income: String,
    pub purpose_of_account: String,
    pub nationality: String,
    pub marital_status: String,
    pub nominee_name: String,
    pub nominee_relation: String,
    pub nominee_contact: String,
}

/// Fields filled from document extraction; the customer never edits these.
pub const AUTO_POPULATED_FIELDS: &[&str] = &[
    "name",
    "dateOfBirth",
    "gender",
    "fatherName",
    "aadharNumber",
    "panNumber",
    "address",
];

fn validate_pep_details(form: &ReviewForm) -> Result<(), ValidationError> {
    if form.is_pep && form.pep_details.trim().is_empty() {
        return Err(ValidationError::new("pep_details")
            .with_message("Please provide PEP details".into()));
    }
    Ok(())
}

impl ReviewForm {
    /// Whether the customer may edit `field` in the current mode.
    pub fn is_editable(field: &str, read_only: bool) -> bool {
        !read_only && !AUTO_POPULATED_FIELDS.contains(&field)
    }

    /// Map to the backend's snake_case details body.
    pub fn to_payload(&self, kyc_case_id: i64) -> KycDetailsPayload {
        KycDetailsPayload {
            name: self.name.clone(),
            dob: self.date_of_birth.clone(),
            gender: self.gender.clone(),
            address: self.address.to_line(),
            father_name: self.father_name.clone(),
            aadhar_number: self.aadhar_number.clone(),
            pan_number: self.pan_number.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            alternate_phone: self.alternate_phone.clone(),
            occupation: self.occupation.clone(),
            employer: self.employer.clone(),
            business_type: self.business_type.clone(),
            source_of_funds: self.source_of_funds.clone(),
            is_pep: self.is_pep,
            pep_details: self.pep_details.clone(),
            annual_income: self.annual_income.clone(),
            purpose_of_account: self.purpose_of_account.clone(),
            nationality: self.nationality.clone(),
            marital_status: self.marital_status.clone(),
            nominee_name: self.nominee_name.clone(),
            nominee_relation: self.nominee_relation.clone(),
            nominee_contact: self.nominee_contact.clone(),
            kyc_case_id,
        }
    }

    /// Pre-populate from the backend's details object. Missing keys become empty.
    pub fn from_details(details: &serde_json::Value) -> Self {
        let text = |key: &str| {
            details
                .get(key)
                .and_then(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_default()
        };

        ReviewForm {
            name: text("name"),
            date_of_birth: text("dob"),
            gender: text("gender"),
            address: Address::from_line(&text("address")),
            father_name: text("father_name"),
            aadhar_number: text("aadhar_number"),
            pan_number: text("pan_number"),
            email: text("email"),
            phone: text("phone"),
            alternate_phone: text("alternate_phone"),
            occupation: text("occupation"),
            employer: text("employer"),
            business_type: text("business_type"),
            source_of_funds: text("source_of_funds"),
            is_pep: details
                .get("is_pep")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            pep_details: text("pep_details"),
            annual_income: text("annual_income"),
            purpose_of_account: text("purpose_of_account"),
            nationality: text("nationality"),
            marital_status: text("marital_status"),
            nominee_name: text("nominee_name"),
            nominee_relation: text("nominee_relation"),
            nominee_contact: text("nominee_contact"),
        }
    }
}

/// Body of `POST /kyc/details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycDetailsPayload {
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub address: String,
    pub father_name: String,
    pub aadhar_number: String,
    pub pan_number: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: String,
    pub occupation: String,
    pub employer: String,
    pub business_type: String,
    pub source_of_funds: String,
    pub is_pep: bool,
    pub pep_details: String,
    pub annual_income: String,
    pub purpose_of_account: String,
    pub nationality: String,
    pub marital_status: String,
    pub nominee_name: String,
    pub nominee_relation: String,
    pub nominee_contact: String,
    pub kyc_case_id: i64,
}
