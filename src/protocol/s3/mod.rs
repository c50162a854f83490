//! Native S3 protocol implementation
//!
//! This module provides AWS S3 support using the official AWS SDK for Rust.
//! It supports standard S3 as well as S3-compatible services like MinIO.
//!
//! # Features
//!
//! - Pure Rust implementation using `aws-sdk-s3`
//! - Async operations with Tokio runtime
//! - Marker-based `ListObjects` paging
//! - Streaming object bodies, never buffered whole in memory
//! - Support for custom endpoints (MinIO, LocalStack, etc.)
//!
//! # Example
//!
//! ```no_run
//! use s3pull::protocol::s3::{S3Client, S3Config};
//! use s3pull::protocol::{ListPageRequest, ObjectStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = S3Config::new("AKIA...", "secret");
//!     let client = S3Client::new(config).await?;
//!
//!     let page = client
//!         .list_objects_page(&ListPageRequest {
//!             bucket: "my-bucket".to_string(),
//!             prefix: None,
//!             marker: None,
//!             max_keys: 1000,
//!         })
//!         .await?;
//!     println!("{} objects on the first page", page.entries.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod operations;
mod types;


pub use client::S3Client;
pub use config::{check_bucket_name, S3Config, DEFAULT_REGION};
pub use error::{S3Error, S3Result};
pub use types::{
    BucketInfo, BucketList, ListPageRequest, ObjectEntry, ObjectListing, ObjectPage,
    S3StorageClass,
};
