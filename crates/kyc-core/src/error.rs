//! Error types module
//!
//! All failures of the KYC client are unified under [`KycError`]. Nothing here is
//! fatal: every variant is scoped to the user action that triggered it and is
//! reported back as a transient message, leaving the step flow untouched.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a failed upload
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "INVALID_CASE_ID")
    fn error_code(&self) -> &'static str;

    /// Whether the user can re-trigger the action (e.g. a "Try Again" button)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum KycError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid KYC case ID: {0}")]
    InvalidCaseId(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported file type for {slot}: {content_type}")]
    UnsupportedFileType { slot: String, content_type: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Recording too short: {elapsed_secs}s recorded, {min_secs}s required")]
    RecordingTooShort { elapsed_secs: u64, min_secs: u64 },

    #[error("Invalid recording: {0}")]
    InvalidRecording(String),

    #[error("Step {0} is not complete")]
    StepIncomplete(String),

    #[error("KYC case is already submitted and read-only")]
    ReadOnly,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for KycError {
    fn from(err: anyhow::Error) -> Self {
        KycError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for KycError {
    fn from(err: io::Error) -> Self {
        KycError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for KycError {
    fn from(err: serde_json::Error) -> Self {
        KycError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for KycError {
    fn from(err: validator::ValidationErrors) -> Self {
        KycError::Validation(err.to_string())
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn kyc_error_static_metadata(
    err: &KycError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        KycError::InvalidInput(_) => (
            "INVALID_INPUT",
            false,
            Some("Check the entered values and try again"),
            LogLevel::Debug,
        ),
        KycError::InvalidCaseId(_) => (
            "INVALID_CASE_ID",
            false,
            Some("Reopen the KYC link you were sent"),
            LogLevel::Debug,
        ),
        KycError::Validation(_) => (
            "VALIDATION_ERROR",
            false,
            Some("Correct the highlighted fields"),
            LogLevel::Debug,
        ),
        KycError::UnsupportedFileType { .. } => (
            "UNSUPPORTED_FILE_TYPE",
            false,
            Some("Choose a file in one of the supported formats"),
            LogLevel::Debug,
        ),
        KycError::Encoding(_) => (
            "ENCODING_ERROR",
            true,
            Some("Select the file again"),
            LogLevel::Warn,
        ),
        KycError::Http { .. } => (
            "HTTP_ERROR",
            true,
            Some("Try again"),
            LogLevel::Warn,
        ),
        KycError::Transport(_) => (
            "TRANSPORT_ERROR",
            true,
            Some("Check your connection and try again"),
            LogLevel::Warn,
        ),
        KycError::Decode(_) => (
            "DECODE_ERROR",
            true,
            Some("Try again"),
            LogLevel::Error,
        ),
        KycError::Media(_) => (
            "MEDIA_ERROR",
            true,
            Some("Allow camera and microphone access"),
            LogLevel::Warn,
        ),
        KycError::RecordingTooShort { .. } => (
            "RECORDING_TOO_SHORT",
            true,
            Some("Keep recording a little longer"),
            LogLevel::Debug,
        ),
        KycError::InvalidRecording(_) => (
            "INVALID_RECORDING",
            true,
            Some("Record the video again"),
            LogLevel::Debug,
        ),
        KycError::StepIncomplete(_) => (
            "STEP_INCOMPLETE",
            false,
            Some("Finish the uploads for this step first"),
            LogLevel::Debug,
        ),
        KycError::ReadOnly => ("READ_ONLY", false, None, LogLevel::Debug),
        KycError::Config(_) => (
            "CONFIG_ERROR",
            false,
            Some("Check the KYC_* environment variables"),
            LogLevel::Error,
        ),
        KycError::Internal(_) | KycError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl KycError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for KycError {
    fn error_code(&self) -> &'static str {
        kyc_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        kyc_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        kyc_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        kyc_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            KycError::InvalidInput(msg) => msg.clone(),
            KycError::InvalidCaseId(_) => "Invalid KYC case ID".to_string(),
            KycError::Validation(msg) => msg.clone(),
            KycError::UnsupportedFileType { slot, .. } => {
                format!("Unsupported file type for {}", slot)
            }
            KycError::Encoding(msg) => msg.clone(),
            KycError::Http { message, .. } => message.clone(),
            KycError::Transport(_) => "Network error. Please try again.".to_string(),
            KycError::Decode(_) => "Unexpected response from server".to_string(),
            KycError::Media(msg) => msg.clone(),
            KycError::RecordingTooShort { min_secs, .. } => {
                format!("Recording must be at least {} seconds", min_secs)
            }
            KycError::InvalidRecording(msg) => msg.clone(),
            KycError::StepIncomplete(step) => format!("Please complete the {} step first", step),
            KycError::ReadOnly => "KYC has already been submitted".to_string(),
            KycError::Config(msg) => msg.clone(),
            KycError::Internal(_) | KycError::InternalWithSource { .. } => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

pub type KycResult<T> = Result<T, KycError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_case_id_metadata() {
        let err = KycError::InvalidCaseId("abc".to_string());
        assert_eq!(err.error_code(), "INVALID_CASE_ID");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Invalid KYC case ID");
        assert_eq!(err.log_level(), LogLevel::Debug);
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_recording_too_short_message() {
        let err = KycError::RecordingTooShort {
            elapsed_secs: 3,
            min_secs: 5,
        };
        assert_eq!(err.client_message(), "Recording must be at least 5 seconds");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_http_error_passes_message_through() {
        let err = KycError::Http {
            status: 422,
            message: "Email already registered".to_string(),
        };
        assert_eq!(err.error_code(), "HTTP_ERROR");
        assert_eq!(err.client_message(), "Email already registered");
        assert_eq!(err.to_string(), "HTTP 422: Email already registered");
    }

    #[test]
    fn test_from_anyhow_keeps_source_chain() {
        let inner = anyhow::anyhow!("socket closed").context("Failed to send request");
        let err = KycError::from(inner);
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
        assert!(err.detailed_message().contains("Caused by"));
    }

    #[test]
    fn test_from_serde_json_error_is_decode() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = KycError::from(parse_err);
        assert!(matches!(err, KycError::Decode(_)));
    }
}
