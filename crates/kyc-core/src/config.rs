//! Configuration module
//!
//! Client configuration resolved from the environment (and `.env`), including the
//! main API location and which upload service backs document uploads.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_UPLOAD_API_URL: &str =
    "https://tbbnyplmp6.execute-api.us-east-2.amazonaws.com/dev/upload";
const DEFAULT_UPLOAD_HEALTH_URL: &str =
    "https://tbbnyplmp6.execute-api.us-east-2.amazonaws.com/dev/health";
const DEFAULT_USER_ID: &str = "1";

/// Which backend receives document uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadServiceKind {
    /// Multipart form upload to the main API
    #[default]
    Existing,
    /// Base64 JSON upload to the S3/Lambda service
    New,
}

impl Display for UploadServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadServiceKind::Existing => write!(f, "existing"),
            UploadServiceKind::New => write!(f, "new"),
        }
    }
}

impl FromStr for UploadServiceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "existing" => Ok(UploadServiceKind::Existing),
            "new" => Ok(UploadServiceKind::New),
            _ => Err(anyhow::anyhow!(
                "Invalid upload service: {}. Must be 'existing' or 'new'",
                s
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct KycConfig {
    pub api_base_url: String,
    pub upload_service: UploadServiceKind,
    pub upload_api_url: String,
    pub upload_health_url: String,
    pub default_user_id: String,
    pub request_timeout_secs: Option<u64>,
    pub environment: String,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            upload_service: UploadServiceKind::default(),
            upload_api_url: DEFAULT_UPLOAD_API_URL.to_string(),
            upload_health_url: DEFAULT_UPLOAD_HEALTH_URL.to_string(),
            default_user_id: DEFAULT_USER_ID.to_string(),
            request_timeout_secs: None,
            environment: "development".to_string(),
        }
    }
}

impl KycConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = get("KYC_API_URL")
            .or_else(|| get("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let upload_service = match get("KYC_UPLOAD_SERVICE") {
            Some(value) => value.parse::<UploadServiceKind>()?,
            None => UploadServiceKind::default(),
        };

        let request_timeout_secs = match get("KYC_REQUEST_TIMEOUT_SECS") {
            Some(value) => Some(value.trim().parse::<u64>().map_err(|_| {
                anyhow::anyhow!("KYC_REQUEST_TIMEOUT_SECS must be a whole number of seconds")
            })?),
            None => None,
        };

        let config = KycConfig {
            api_base_url,
            upload_service,
            upload_api_url: get("KYC_UPLOAD_API_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_API_URL.to_string()),
            upload_health_url: get("KYC_UPLOAD_HEALTH_URL")
                .unwrap_or_else(|| DEFAULT_UPLOAD_HEALTH_URL.to_string()),
            default_user_id: get("KYC_DEFAULT_USER_ID")
                .unwrap_or_else(|| DEFAULT_USER_ID.to_string()),
            request_timeout_secs,
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        for (name, url) in [
            ("KYC_API_URL", &self.api_base_url),
            ("KYC_UPLOAD_API_URL", &self.upload_api_url),
            ("KYC_UPLOAD_HEALTH_URL", &self.upload_health_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!(
                    "{} must be an http:// or https:// URL, got '{}'",
                    name,
                    url
                ));
            }
        }

        if self.default_user_id.parse::<i64>().is_err() {
            return Err(anyhow::anyhow!(
                "KYC_DEFAULT_USER_ID must be numeric, got '{}'",
                self.default_user_id
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!(
                "KYC_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Copy of this configuration routed to a different upload service.
    pub fn with_upload_service(mut self, service: UploadServiceKind) -> Self {
        self.upload_service = service;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = KycConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.upload_service, UploadServiceKind::Existing);
        assert!(config.upload_api_url.ends_with("/dev/upload"));
        assert!(config.upload_health_url.ends_with("/dev/health"));
        assert_eq!(config.default_user_id, "1");
        assert_eq!(config.request_timeout_secs, None);
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides_and_fallbacks() {
        let config = KycConfig::from_lookup(lookup(&[
            ("API_URL", "https://kyc.example.com/"),
            ("KYC_UPLOAD_SERVICE", "NEW"),
            ("KYC_REQUEST_TIMEOUT_SECS", "30"),
            ("APP_ENV", "prod"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://kyc.example.com");
        assert_eq!(config.upload_service, UploadServiceKind::New);
        assert_eq!(config.request_timeout_secs, Some(30));
        assert!(config.is_production());

        let config = KycConfig::from_lookup(lookup(&[
            ("KYC_API_URL", "http://primary"),
            ("API_URL", "http://secondary"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://primary");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(KycConfig::from_lookup(lookup(&[("KYC_UPLOAD_SERVICE", "legacy")])).is_err());
        assert!(KycConfig::from_lookup(lookup(&[("KYC_API_URL", "ftp://x")])).is_err());
        assert!(KycConfig::from_lookup(lookup(&[("KYC_DEFAULT_USER_ID", "abc")])).is_err());
        assert!(KycConfig::from_lookup(lookup(&[("KYC_REQUEST_TIMEOUT_SECS", "soon")])).is_err());
        assert!(KycConfig::from_lookup(lookup(&[("KYC_REQUEST_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_upload_service_round_trip_display() {
        for kind in [UploadServiceKind::Existing, UploadServiceKind::New] {
            assert_eq!(kind.to_string().parse::<UploadServiceKind>().unwrap(), kind);
        }
    }
}
