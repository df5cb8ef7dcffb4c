//! Field-level checks shared by registration, review and upload handling.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{KycError, KycResult};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid phone regex"));

static PASSWORD_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\d@$!%*?&]{8,}$").expect("valid password regex"));

const PASSWORD_SPECIALS: &str = "@$!%*?&";

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Ten digits, no separators.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// At least 8 characters with a lowercase letter, an uppercase letter, a digit
/// and one of `@$!%*?&`, using no other characters.
pub fn is_valid_password(password: &str) -> bool {
    PASSWORD_CHARSET_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

/// Parse a case id into the numeric form the backend expects. Only plain
/// positive integers are accepted; signs and zero are rejected.
pub fn parse_case_id(case_id: &str) -> KycResult<i64> {
    let trimmed = case_id.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KycError::InvalidCaseId(case_id.to_string()));
    }
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(KycError::InvalidCaseId(case_id.to_string())),
    }
}

pub(crate) fn validate_email(email: &str) -> Result<(), validator::ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("email").with_message("Invalid email address".into()))
    }
}

pub(crate) fn validate_phone(phone: &str) -> Result<(), validator::ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("phone").with_message("Invalid phone number".into()))
    }
}

pub(crate) fn validate_password(password: &str) -> Result<(), validator::ValidationError> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("password").with_message(
            "Password must be at least 8 characters and include upper and lower case letters, a number and a special character".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("user example@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("98765-43210"));
        assert!(!is_valid_phone("987654321"));
    }

    #[test]
    fn test_password() {
        assert!(is_valid_password("Secret1!"));
        assert!(!is_valid_password("secret1!"));
        assert!(!is_valid_password("SECRET1!"));
        assert!(!is_valid_password("Secret!!"));
        assert!(!is_valid_password("Secret12"));
        assert!(!is_valid_password("Sec1!"));
        assert!(!is_valid_password("Secret1!#"));
    }

    #[test]
    fn test_parse_case_id() {
        assert_eq!(parse_case_id("42").unwrap(), 42);
        assert_eq!(parse_case_id(" 7 ").unwrap(), 7);
        let err = parse_case_id("abc").unwrap_err();
        assert!(matches!(err, KycError::InvalidCaseId(ref id) if id == "abc"));
    }

    #[test]
    fn test_parse_case_id_rejects_signs_and_zero() {
        for input in ["-5", "+5", "0", "000", "", " ", "12abc", "1.5"] {
            assert!(
                matches!(parse_case_id(input), Err(KycError::InvalidCaseId(_))),
                "{:?} should be rejected",
                input
            );
        }
        assert_eq!(parse_case_id("007").unwrap(), 7);
    }
}
