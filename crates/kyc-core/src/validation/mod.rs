//! Validation modules

pub mod fields;

pub use fields::{is_valid_email, is_valid_password, is_valid_phone, parse_case_id};
