//! S3 client implementation

use super::config::S3Config;
use super::error::{S3Error, S3Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::time::Duration;

/// S3 client for interacting with AWS S3 and S3-compatible storage
///
/// Each instance owns its own SDK client. The bulk downloader builds one per
/// worker instead of cloning a shared one.
pub struct S3Client {
    /// AWS S3 client
    client: AwsS3Client,

    /// Client configuration
    config: S3Config,
}

impl S3Client {
    /// Create a new S3 client with the given configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use s3pull::protocol::s3::{S3Client, S3Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = S3Config::new("AKIA...", "secret");
    ///     let client = S3Client::new(config).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: S3Config) -> S3Result<Self> {
        config.validate()?;

        let client = Self::build_aws_client(&config).await?;

        Ok(Self { client, config })
    }

    /// Build the AWS SDK S3 client from configuration
    async fn build_aws_client(config: &S3Config) -> S3Result<AwsS3Client> {
        let region_provider = RegionProviderChain::first_try(Region::new(config.region.clone()));

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            config.session_token.clone(),
            None,
            "s3pull-explicit",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        // Required for MinIO, LocalStack
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        if let Some(seconds) = config.timeout_seconds {
            let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(seconds))
                .build();
            s3_config_builder = s3_config_builder.timeout_config(timeout_config);
        }

        Ok(AwsS3Client::from_conf(s3_config_builder.build()))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Get a reference to the underlying AWS S3 client
    pub fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }

    /// Test access to a bucket by issuing a HEAD request
    pub async fn test_bucket(&self, bucket: &str) -> S3Result<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                let text = e.to_string();
                if text.contains("404") || text.contains("NoSuchBucket") {
                    S3Error::BucketNotFound(bucket.to_string())
                } else if text.contains("403") || text.contains("AccessDenied") {
                    S3Error::AccessDenied(format!("Cannot access bucket: {}", bucket))
                } else {
                    S3Error::from(e)
                }
            })?;
        Ok(())
    }
}
