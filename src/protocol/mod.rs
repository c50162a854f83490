/*!
 * Object store abstraction
 *
 * The download engine talks to storage through [`ObjectStore`]. A
 * [`StoreProvider`] hands out sessions; every concurrent worker asks the
 * provider for its own session and never shares it.
 *
 * Implementations:
 * - [`s3`]: AWS S3 and S3-compatible services via `aws-sdk-s3`
 * - [`memory`]: in-memory buckets for tests and local experiments
 */

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use std::pin::Pin;
use tokio::io::AsyncRead;

pub use s3::{
    BucketInfo, BucketList, ListPageRequest, ObjectEntry, ObjectListing, ObjectPage, S3Error,
    S3Result, S3StorageClass,
};

/// Streaming body of a fetched object
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Remote capabilities used by the commands and the download engine
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List the buckets owned by the authenticated account
    async fn list_buckets(&self) -> S3Result<BucketList>;

    /// Fetch one page of a marker-based object listing
    async fn list_objects_page(&self, request: &ListPageRequest) -> S3Result<ObjectPage>;

    /// Open an object for streaming reads
    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody>;
}

/// Factory for exclusively-owned store sessions
#[async_trait]
pub trait StoreProvider: Send + Sync {
    type Store: ObjectStore + 'static;

    /// Open a new session
    async fn connect(&self) -> S3Result<Self::Store>;
}
