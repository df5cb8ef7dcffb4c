//! Base64 payload preparation for the JSON upload service.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use kyc_core::models::normalize_mime_type;
use kyc_core::{KycError, KycResult};

/// Encode file bytes as bare base64. The bytes are always encoded as they are,
/// whatever they contain. Empty input is rejected.
pub fn encode_file_base64(data: &[u8]) -> KycResult<String> {
    if data.is_empty() {
        return Err(KycError::Encoding(
            "Failed to convert file to base64: no data found".to_string(),
        ));
    }
    Ok(STANDARD.encode(data))
}

/// Video content types lose their codec parameters; others pass through.
pub fn clean_content_type(content_type: &str) -> &str {
    if content_type.starts_with("video/") {
        normalize_mime_type(content_type)
    } else {
        content_type
    }
}
