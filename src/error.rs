/*!
 * Error types for s3pull
 */

use crate::protocol::s3::S3Error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PullError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Error)]
pub enum PullError {
    /// Configuration error (missing credentials, bad config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Remote storage call failed
    #[error(transparent)]
    Storage(#[from] S3Error),

    /// Local file or directory could not be created or opened
    #[error("Local I/O error on {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Streaming an object body into its local file failed
    #[error("Transfer of {key} failed: {source}")]
    Transfer {
        key: String,
        #[source]
        source: io::Error,
    },

    /// The worker pool lost jobs or workers
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PullError {
    /// Attach the local path to an I/O error
    pub fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        PullError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // Fatal errors: config, bad input, credentials rejected
            PullError::Config(_) | PullError::InvalidArgument(_) => EXIT_FATAL,
            PullError::Storage(e) if matches!(e.root(), S3Error::AccessDenied(_)) => EXIT_FATAL,
            PullError::Storage(S3Error::InvalidConfig(_)) => EXIT_FATAL,
            // Everything else aborted one operation
            _ => EXIT_PARTIAL,
        }
    }

    /// Error category, attached to error log events as the `category` field
    pub fn category(&self) -> ErrorCategory {
        match self {
            PullError::Config(_) => ErrorCategory::Configuration,
            PullError::InvalidArgument(_) => ErrorCategory::Validation,
            PullError::Storage(e) => match e.root() {
                S3Error::AccessDenied(_) => ErrorCategory::Security,
                S3Error::InvalidConfig(_) => ErrorCategory::Configuration,
                S3Error::InvalidBucketName(_) => ErrorCategory::Validation,
                _ => ErrorCategory::Network,
            },
            PullError::LocalIo { .. } | PullError::Io(_) => ErrorCategory::IoError,
            PullError::Transfer { .. } => ErrorCategory::Transfer,
            PullError::Pool(_) => ErrorCategory::Concurrency,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad user input
    Validation,
    /// Local I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
    /// Object body streaming errors
    Transfer,
    /// Worker pool errors
    Concurrency,
    /// Remote storage errors
    Network,
    /// Authentication/authorization errors
    Security,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Transfer => write!(f, "transfer"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Security => write!(f, "security"),
        }
    }
}

impl From<toml::de::Error> for PullError {
    fn from(err: toml::de::Error) -> Self {
        PullError::Config(format!("TOML parse error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PullError::Config("x".to_string()).exit_code(), EXIT_FATAL);
        assert_eq!(
            PullError::InvalidArgument("bad date".to_string()).exit_code(),
            EXIT_FATAL
        );
        assert_eq!(
            PullError::Storage(S3Error::Network("reset".to_string())).exit_code(),
            EXIT_PARTIAL
        );
        assert_eq!(PullError::Pool("lost".to_string()).exit_code(), EXIT_PARTIAL);
    }

    #[test]
    fn test_access_denied_is_fatal_through_context() {
        let err: PullError = S3Error::AccessDenied("nope".to_string())
            .context("Failed to list buckets")
            .into();
        assert_eq!(err.exit_code(), EXIT_FATAL);
        assert_eq!(err.category(), ErrorCategory::Security);
    }

    #[test]
    fn test_error_display() {
        let err = PullError::local_io(
            "/tmp/out/a.txt",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Local I/O error on /tmp/out/a.txt: denied");

        let err = PullError::Transfer {
            key: "logs/1".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionReset, "reset"),
        };
        assert_eq!(err.to_string(), "Transfer of logs/1 failed: reset");

        let err = PullError::Storage(S3Error::BucketNotFound("b".to_string()));
        assert_eq!(err.to_string(), "Bucket not found or not accessible: b");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            PullError::Config("x".to_string()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            PullError::Io(io::Error::other("x")).category(),
            ErrorCategory::IoError
        );
        assert_eq!(
            PullError::Storage(S3Error::Network("x".to_string())).category(),
            ErrorCategory::Network
        );
        assert_eq!(ErrorCategory::Concurrency.to_string(), "concurrency");
    }

    #[test]
    fn test_toml_error_conversion() {
        let err: PullError = toml::from_str::<toml::Table>("not = = toml")
            .unwrap_err()
            .into();
        assert!(matches!(err, PullError::Config(_)));
    }
}
