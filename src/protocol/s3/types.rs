//! Type definitions for S3 operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Snapshot of one object's metadata, as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object key (path within bucket)
    pub key: String,

    /// Object size in bytes. Zero-size entries are directory markers.
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: DateTime<Utc>,

    /// Storage class
    pub storage_class: Option<S3StorageClass>,

    /// Owner display name
    pub owner: Option<String>,
}

impl ObjectEntry {
    /// Zero-size "folder" placeholder
    pub fn is_directory_marker(&self) -> bool {
        self.size == 0
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Entries on this page, in key order
    pub entries: Vec<ObjectEntry>,

    /// Whether more pages follow
    pub is_truncated: bool,

    /// Marker supplied by the provider for the next page, if any
    pub next_marker: Option<String>,
}

/// Parameters of a single page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPageRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub marker: Option<String>,
    pub max_keys: i32,
}

/// The complete listing of a bucket (or of a prefix within it)
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    pub bucket: String,
    pub prefix: Option<String>,
    pub entries: Vec<ObjectEntry>,
}

impl ObjectListing {
    pub fn new(bucket: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix,
            entries: Vec::new(),
        }
    }

    /// Sum of all entry sizes
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A bucket visible to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    pub created: Option<DateTime<Utc>>,
}

/// Result of listing buckets
#[derive(Debug, Clone, Default)]
pub struct BucketList {
    /// Display name of the account owning the buckets
    pub owner: Option<String>,
    pub buckets: Vec<BucketInfo>,
}

/// S3 storage classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum S3StorageClass {
    /// Standard storage class
    #[default]
    Standard,

    /// Reduced redundancy (deprecated but still available)
    ReducedRedundancy,

    /// Infrequent access
    StandardIa,

    /// One zone infrequent access
    OnezoneIa,

    /// Intelligent tiering
    IntelligentTiering,

    /// Glacier instant retrieval
    GlacierInstantRetrieval,

    /// Glacier flexible retrieval
    GlacierFlexibleRetrieval,

    /// Glacier deep archive
    GlacierDeepArchive,
}

impl S3StorageClass {
    /// Parse the wire name used by listing responses
    pub fn from_name(name: &str) -> Self {
        match name {
            "STANDARD" => S3StorageClass::Standard,
            "REDUCED_REDUNDANCY" => S3StorageClass::ReducedRedundancy,
            "STANDARD_IA" => S3StorageClass::StandardIa,
            "ONEZONE_IA" => S3StorageClass::OnezoneIa,
            "INTELLIGENT_TIERING" => S3StorageClass::IntelligentTiering,
            "GLACIER_IR" => S3StorageClass::GlacierInstantRetrieval,
            "GLACIER" => S3StorageClass::GlacierFlexibleRetrieval,
            "DEEP_ARCHIVE" => S3StorageClass::GlacierDeepArchive,
            _ => S3StorageClass::Standard,
        }
    }
}

impl std::fmt::Display for S3StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            S3StorageClass::Standard => write!(f, "STANDARD"),
            S3StorageClass::ReducedRedundancy => write!(f, "REDUCED_REDUNDANCY"),
            S3StorageClass::StandardIa => write!(f, "STANDARD_IA"),
            S3StorageClass::OnezoneIa => write!(f, "ONEZONE_IA"),
            S3StorageClass::IntelligentTiering => write!(f, "INTELLIGENT_TIERING"),
            S3StorageClass::GlacierInstantRetrieval => write!(f, "GLACIER_IR"),
            S3StorageClass::GlacierFlexibleRetrieval => write!(f, "GLACIER"),
            S3StorageClass::GlacierDeepArchive => write!(f, "DEEP_ARCHIVE"),
        }
    }
}

/// Convert an SDK timestamp, falling back to the epoch for out-of-range values
pub(crate) fn to_utc(dt: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    SystemTime::try_from(*dt)
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, size: u64) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size,
            last_modified: DateTime::<Utc>::from(SystemTime::UNIX_EPOCH),
            storage_class: None,
            owner: None,
        }
    }

    #[test]
    fn test_storage_class_round_trips_through_display() {
        for class in [
            S3StorageClass::Standard,
            S3StorageClass::ReducedRedundancy,
            S3StorageClass::StandardIa,
            S3StorageClass::OnezoneIa,
            S3StorageClass::IntelligentTiering,
            S3StorageClass::GlacierInstantRetrieval,
            S3StorageClass::GlacierFlexibleRetrieval,
            S3StorageClass::GlacierDeepArchive,
        ] {
            assert_eq!(S3StorageClass::from_name(&class.to_string()), class);
        }
        assert_eq!(S3StorageClass::from_name("SOMETHING_NEW"), S3StorageClass::Standard);
    }

    #[test]
    fn test_listing_totals() {
        let mut listing = ObjectListing::new("bucket", None);
        assert!(listing.is_empty());

        listing.entries.push(entry("a", 10));
        listing.entries.push(entry("dir/", 0));
        listing.entries.push(entry("b", 32));

        assert_eq!(listing.len(), 3);
        assert_eq!(listing.total_size(), 42);
        assert!(listing.entries[1].is_directory_marker());
    }

    #[test]
    fn test_to_utc() {
        let dt = aws_sdk_s3::primitives::DateTime::from_secs(1_500_000_000);
        assert_eq!(to_utc(&dt).timestamp(), 1_500_000_000);
    }
}
