//! Error types for S3 operations

use std::io;
use thiserror::Error;

/// Result type alias for S3 operations
pub type S3Result<T> = Result<T, S3Error>;

/// Errors that can occur during S3 operations
#[derive(Error, Debug, Clone)]
pub enum S3Error {
    /// AWS SDK error
    #[error("AWS SDK error: {0}")]
    Sdk(String),

    /// S3 service error with specific error code
    #[error("S3 service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found or not accessible
    #[error("Bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid bucket name
    #[error("Invalid bucket name: {0}")]
    InvalidBucketName(String),

    /// Listing could not make progress
    #[error("Pagination error: {0}")]
    Pagination(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<S3Error>,
    },
}

impl S3Error {
    /// Add context to an error
    pub fn context<S: Into<String>>(self, context: S) -> Self {
        S3Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &S3Error {
        match self {
            S3Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the error means the addressed object or bucket does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            S3Error::NotFound { .. } | S3Error::BucketNotFound(_)
        )
    }
}

impl From<io::Error> for S3Error {
    fn from(err: io::Error) -> Self {
        S3Error::Io(err.to_string())
    }
}

/// Convert AWS SDK errors to S3Error
impl<E> From<aws_sdk_s3::error::SdkError<E>> for S3Error
where
    E: std::error::Error + 'static,
{
    fn from(error: aws_sdk_s3::error::SdkError<E>) -> Self {
        match error {
            aws_sdk_s3::error::SdkError::DispatchFailure(e) => {
                S3Error::Network(format!("Network dispatch failure: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ResponseError(e) => {
                S3Error::Network(format!("Response error: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::TimeoutError(_) => {
                S3Error::Network("Request timed out".to_string())
            }
            aws_sdk_s3::error::SdkError::ServiceError(e) => {
                classify_service_error(&format!("{:?}", e))
            }
            _ => S3Error::Sdk(format!("{:?}", error)),
        }
    }
}

/// Map the debug rendering of a service error onto a typed variant
pub(crate) fn classify_service_error(err_str: &str) -> S3Error {
    if err_str.contains("NoSuchKey") {
        S3Error::Service {
            code: "NoSuchKey".to_string(),
            message: "The specified key does not exist".to_string(),
        }
    } else if err_str.contains("NoSuchBucket") {
        S3Error::BucketNotFound("The specified bucket does not exist".to_string())
    } else if err_str.contains("AccessDenied") {
        S3Error::AccessDenied("Access denied to resource".to_string())
    } else if err_str.contains("InvalidAccessKeyId") || err_str.contains("SignatureDoesNotMatch")
    {
        S3Error::AccessDenied("Credentials were rejected".to_string())
    } else {
        S3Error::Service {
            code: "Unknown".to_string(),
            message: err_str.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context() {
        let base_error = S3Error::BucketNotFound("photos".to_string());
        let with_context = base_error.context("Failed to list");

        assert!(matches!(with_context, S3Error::WithContext { .. }));
        assert_eq!(
            with_context.to_string(),
            "Failed to list: Bucket not found or not accessible: photos"
        );
    }

    #[test]
    fn test_root_unwraps_nested_context() {
        let err = S3Error::NotFound {
            bucket: "b".to_string(),
            key: "k".to_string(),
        }
        .context("inner")
        .context("outer");

        assert!(matches!(err.root(), S3Error::NotFound { .. }));
        assert!(err.is_not_found());
        assert!(!S3Error::Network("reset".to_string()).is_not_found());
    }

    #[test]
    fn test_classify_service_error() {
        assert!(matches!(
            classify_service_error("ServiceError { NoSuchBucket }"),
            S3Error::BucketNotFound(_)
        ));
        assert!(matches!(
            classify_service_error("AccessDenied: nope"),
            S3Error::AccessDenied(_)
        ));
        assert!(matches!(
            classify_service_error("InvalidAccessKeyId"),
            S3Error::AccessDenied(_)
        ));

        match classify_service_error("NoSuchKey") {
            S3Error::Service { code, .. } => assert_eq!(code, "NoSuchKey"),
            other => panic!("unexpected {:?}", other),
        }

        match classify_service_error("SlowDown please") {
            S3Error::Service { code, message } => {
                assert_eq!(code, "Unknown");
                assert_eq!(message, "SlowDown please");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let s3_err: S3Error = io_err.into();
        assert!(matches!(s3_err, S3Error::Io(_)));
    }

    #[test]
    fn test_error_display_formats() {
        let err = S3Error::Network("connection lost".to_string());
        assert_eq!(format!("{}", err), "Network error: connection lost");

        let err = S3Error::Service {
            code: "SlowDown".to_string(),
            message: "rate limited".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "S3 service error (SlowDown): rate limited"
        );

        let err = S3Error::NotFound {
            bucket: "my-bucket".to_string(),
            key: "my-key".to_string(),
        };
        assert_eq!(format!("{}", err), "Object not found: my-bucket/my-key");

        let err = S3Error::Pagination("marker did not advance".to_string());
        assert_eq!(format!("{}", err), "Pagination error: marker did not advance");

        let err = S3Error::InvalidBucketName("bad!name".to_string());
        assert_eq!(format!("{}", err), "Invalid bucket name: bad!name");

        let err = S3Error::Sdk("some sdk error".to_string());
        assert_eq!(format!("{}", err), "AWS SDK error: some sdk error");
    }
}
