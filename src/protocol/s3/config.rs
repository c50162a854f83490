//! Configuration types for S3 client

use super::error::{S3Error, S3Result};
use serde::{Deserialize, Serialize};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 client configuration
///
/// Credentials are always explicit; there is no fallback to the ambient AWS
/// credential chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS region (e.g., "us-east-1")
    pub region: String,

    /// Custom endpoint URL (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,

    /// AWS access key ID
    pub access_key: String,

    /// AWS secret access key
    #[serde(skip_serializing)]
    pub secret_key: String,

    /// Session token (for temporary credentials)
    #[serde(skip_serializing)]
    pub session_token: Option<String>,

    /// Path-style addressing (required for some S3-compatible services)
    pub force_path_style: bool,

    /// Per-operation timeout in seconds (None = SDK default, no deadline)
    pub timeout_seconds: Option<u64>,
}

impl S3Config {
    /// Create a new S3 config with required parameters
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: None,
            force_path_style: false,
            timeout_seconds: None,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> S3Result<()> {
        if self.access_key.trim().is_empty() {
            return Err(S3Error::InvalidConfig(
                "access key must not be empty".to_string(),
            ));
        }

        if self.secret_key.trim().is_empty() {
            return Err(S3Error::InvalidConfig(
                "secret key must not be empty".to_string(),
            ));
        }

        if self.region.trim().is_empty() {
            return Err(S3Error::InvalidConfig(
                "region must not be empty".to_string(),
            ));
        }

        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(S3Error::InvalidConfig(format!(
                    "endpoint must start with http:// or https://: {}",
                    endpoint
                )));
            }
        }

        if self.timeout_seconds == Some(0) {
            return Err(S3Error::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using custom endpoint (S3-compatible service)
    pub fn is_custom_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Reject bucket arguments that can never address a bucket.
///
/// Names that break the current DNS naming rules are only logged: buckets
/// created before those rules existed may still use them.
pub fn check_bucket_name(name: &str) -> S3Result<()> {
    if name.is_empty() {
        return Err(S3Error::InvalidBucketName(
            "Bucket name cannot be empty".to_string(),
        ));
    }

    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(S3Error::InvalidBucketName(name.to_string()));
    }

    if !is_valid_bucket_name(name) {
        tracing::warn!(bucket = name, "bucket name does not follow current S3 naming rules");
    }

    Ok(())
}

/// Validate S3 bucket name according to AWS rules
fn is_valid_bucket_name(name: &str) -> bool {
    let len = name.len();

    // Length check: 3-63 characters
    if !(3..=63).contains(&len) {
        return false;
    }

    // Must start and end with lowercase letter or number
    let edges_ok = |c: Option<char>| {
        c.map(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .unwrap_or(false)
    };
    if !edges_ok(name.chars().next()) || !edges_ok(name.chars().last()) {
        return false;
    }

    // Only lowercase letters, numbers, hyphens, and periods
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return false;
    }

    // Cannot have consecutive periods
    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    // Reserved prefix and suffix
    !name.starts_with("xn--") && !name.ends_with("-s3alias")
}
