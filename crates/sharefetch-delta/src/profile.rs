//! Sharing profile files
//!
//! A profile is the JSON connection descriptor handed out by the data
//! provider:
//!
//! ```json
//! {
//!   "shareCredentialsVersion": 1,
//!   "endpoint": "https://sharing.example.com/delta-sharing/",
//!   "bearerToken": "<token>",
//!   "expirationTime": "2027-01-01T00:00:00.0Z"
//! }
//! ```
//!
//! Profiles are read from a local path, a `file://` URL or an `http(s)://` URL.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sharefetch_core::{Error, Result};

/// Highest `shareCredentialsVersion` this client understands
pub const CURRENT_SHARE_CREDENTIALS_VERSION: u32 = 1;

/// Parsed and validated sharing profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingProfile {
    pub share_credentials_version: u32,

    /// Base URL of the sharing server, without trailing slash after validation
    pub endpoint: String,

    pub bearer_token: Option<String>,

    /// RFC 3339 expiry of the bearer token
    #[serde(default)]
    pub expiration_time: Option<String>,
}

impl SharingProfile {
    /// Parses and validates a profile document
    pub fn from_json(content: &str) -> Result<Self> {
        let profile: SharingProfile = serde_json::from_str(content)
            .map_err(|e| Error::connection(format!("Invalid sharing profile: {e}")))?;
        profile.validate()
    }

    /// Reads a profile from a path or URL
    pub async fn load(source: &str, http: &reqwest::Client) -> Result<Self> {
        let content = if source.starts_with("http://") || source.starts_with("https://") {
            let response = http.get(source).send().await.map_err(|e| {
                Error::connection(format!("Failed to download profile {source}: {e}"))
            })?;
            if !response.status().is_success() {
                return Err(Error::connection(format!(
                    "Failed to download profile {source}: HTTP {}",
                    response.status()
                )));
            }
            response.text().await.map_err(|e| {
                Error::connection(format!("Failed to read profile {source}: {e}"))
            })?
        } else {
            let path = source.strip_prefix("file://").unwrap_or(source);
            std::fs::read_to_string(path).map_err(|e| {
                Error::connection(format!("Failed to read profile {source}: {e}"))
            })?
        };

        Self::from_json(&content)
    }

    fn validate(mut self) -> Result<Self> {
        if self.share_credentials_version > CURRENT_SHARE_CREDENTIALS_VERSION {
            return Err(Error::connection(format!(
                "shareCredentialsVersion {} is not supported (max {})",
                self.share_credentials_version, CURRENT_SHARE_CREDENTIALS_VERSION
            )));
        }

        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return Err(Error::connection("Sharing profile has an empty endpoint"));
        }
        self.endpoint = endpoint.to_string();

        if self.bearer_token.as_deref().map_or(true, str::is_empty) {
            return Err(Error::connection("Sharing profile has no bearerToken"));
        }

        Ok(self)
    }

    /// Parsed `expirationTime`, if present and well-formed
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|t| t <= now)
    }

    pub(crate) fn token(&self) -> &str {
        self.bearer_token.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const PROFILE: &str = r#"{
        "shareCredentialsVersion": 1,
        "endpoint": "https://sharing.example.com/delta-sharing/",
        "bearerToken": "token-123",
        "expirationTime": "2027-01-01T00:00:00Z"
    }"#;

    #[test]
    fn test_parse_profile_strips_trailing_slash() {
        let profile = SharingProfile::from_json(PROFILE).unwrap();
        assert_eq!(profile.endpoint, "https://sharing.example.com/delta-sharing");
        assert_eq!(profile.token(), "token-123");
    }

    #[test]
    fn test_expiration() {
        let profile = SharingProfile::from_json(PROFILE).unwrap();
        let before = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2027, 6, 1, 0, 0, 0).unwrap();
        assert!(!profile.is_expired(before));
        assert!(profile.is_expired(after));
    }

    #[test]
    fn test_missing_expiration_never_expires() {
        let profile = SharingProfile::from_json(
            r#"{"shareCredentialsVersion":1,"endpoint":"http://localhost","bearerToken":"t"}"#,
        )
        .unwrap();
        assert!(profile.expires_at().is_none());
        assert!(!profile.is_expired(Utc::now()));
    }

    #[test]
    fn test_rejects_unsupported_version() {
        let err = SharingProfile::from_json(
            r#"{"shareCredentialsVersion":2,"endpoint":"http://localhost","bearerToken":"t"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.to_string().contains("shareCredentialsVersion 2"));
    }

    #[test]
    fn test_rejects_missing_token_and_endpoint() {
        assert!(SharingProfile::from_json(
            r#"{"shareCredentialsVersion":1,"endpoint":"http://localhost"}"#
        )
        .is_err());
        assert!(SharingProfile::from_json(
            r#"{"shareCredentialsVersion":1,"endpoint":" / ","bearerToken":"t"}"#
        )
        .is_err());
        assert!(SharingProfile::from_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_load_from_file_and_file_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.share");
        std::fs::write(&path, PROFILE).unwrap();
        let http = reqwest::Client::new();

        let from_path = SharingProfile::load(path.to_str().unwrap(), &http)
            .await
            .unwrap();
        assert_eq!(from_path.token(), "token-123");

        let url = format!("file://{}", path.display());
        let from_url = SharingProfile::load(&url, &http).await.unwrap();
        assert_eq!(from_url.endpoint, from_path.endpoint);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_connection_error() {
        let http = reqwest::Client::new();
        let err = SharingProfile::load("/nonexistent/config.share", &http)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert!(err.to_string().contains("/nonexistent/config.share"));
    }
}
