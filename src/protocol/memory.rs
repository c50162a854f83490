//! In-memory object store
//!
//! Holds buckets and objects in memory so the listing, download and scheduling
//! code can run without a network. Pagination quirks of real providers can be
//! switched on to exercise the paginator:
//!
//! - an inclusive marker (the marker key is served again at the top of the
//!   next page)
//! - a provider-side page cap lower than the requested `max_keys`
//! - an explicit `next_marker` in truncated responses
//!
//! Fetches can fail outright ([`MemoryStore::fail_key`]) or after part of the
//! body was streamed ([`MemoryStore::fail_body_after`]).
//!
//! # Example
//!
//! ```rust
//! use s3pull::protocol::memory::MemoryStore;
//! use chrono::Utc;
//!
//! let store = MemoryStore::new();
//! store.add_object("photos", "2024/cat.jpg", b"meow".to_vec(), Utc::now());
//! assert_eq!(store.object_count("photos"), 1);
//! ```

use super::{ObjectBody, ObjectStore, StoreProvider};
use crate::protocol::s3::{
    BucketInfo, BucketList, ListPageRequest, ObjectEntry, ObjectPage, S3Error, S3Result,
    S3StorageClass,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{self, Cursor};
use std::ops::Bound;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct MemoryBucket {
    created: DateTime<Utc>,
    objects: BTreeMap<String, MemoryObject>,
}

#[derive(Debug, Default)]
struct MemoryState {
    owner: Option<String>,
    buckets: BTreeMap<String, MemoryBucket>,
    inclusive_marker: bool,
    page_cap: Option<usize>,
    emit_next_marker: bool,
    failing_keys: HashSet<String>,
    broken_bodies: HashMap<String, usize>,
    list_requests: Vec<ListPageRequest>,
    fetches: usize,
    connections: usize,
}

/// Shared in-memory store
///
/// Clones share the same state, so a test can keep one handle for setup and
/// inspection while the engine connects as many sessions as it likes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve the marker key again at the start of every follow-up page
    pub fn with_inclusive_marker(self, inclusive: bool) -> Self {
        self.write().inclusive_marker = inclusive;
        self
    }

    /// Never return more than `cap` entries per page, whatever was requested
    pub fn with_page_cap(self, cap: usize) -> Self {
        self.write().page_cap = Some(cap);
        self
    }

    /// Fill `next_marker` in truncated responses
    pub fn with_next_marker(self, emit: bool) -> Self {
        self.write().emit_next_marker = emit;
        self
    }

    /// Set the account owner reported by bucket listings
    pub fn set_owner(&self, owner: impl Into<String>) {
        self.write().owner = Some(owner.into());
    }

    /// Create an empty bucket
    pub fn add_bucket(&self, bucket: &str) {
        self.write()
            .buckets
            .entry(bucket.to_string())
            .or_insert_with(|| MemoryBucket {
                created: Utc::now(),
                objects: BTreeMap::new(),
            });
    }

    /// Store an object, creating the bucket if needed
    pub fn add_object(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) {
        self.add_bucket(bucket);
        let mut state = self.write();
        if let Some(b) = state.buckets.get_mut(bucket) {
            b.objects.insert(
                key.to_string(),
                MemoryObject {
                    data: data.into(),
                    last_modified,
                },
            );
        }
    }

    /// Store a zero-size folder placeholder
    pub fn add_directory_marker(&self, bucket: &str, key: &str, last_modified: DateTime<Utc>) {
        self.add_object(bucket, key, Bytes::new(), last_modified);
    }

    /// Make every fetch of `key` fail with a network error
    pub fn fail_key(&self, key: &str) {
        self.write().failing_keys.insert(key.to_string());
    }

    /// Serve only the first `bytes` of `key`, then fail the read with a
    /// connection reset
    pub fn fail_body_after(&self, key: &str, bytes: usize) {
        self.write().broken_bodies.insert(key.to_string(), bytes);
    }

    /// Number of objects in a bucket
    pub fn object_count(&self, bucket: &str) -> usize {
        self.read()
            .buckets
            .get(bucket)
            .map(|b| b.objects.len())
            .unwrap_or(0)
    }

    /// Every page request seen so far, in order
    pub fn list_requests(&self) -> Vec<ListPageRequest> {
        self.read().list_requests.clone()
    }

    /// Number of `get_object` calls seen so far
    pub fn fetch_count(&self) -> usize {
        self.read().fetches
    }

    /// Number of sessions handed out by [`StoreProvider::connect`]
    pub fn connections(&self) -> usize {
        self.read().connections
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> S3Result<BucketList> {
        let state = self.read();
        Ok(BucketList {
            owner: state.owner.clone(),
            buckets: state
                .buckets
                .iter()
                .map(|(name, b)| BucketInfo {
                    name: name.clone(),
                    created: Some(b.created),
                })
                .collect(),
        })
    }

    async fn list_objects_page(&self, request: &ListPageRequest) -> S3Result<ObjectPage> {
        let mut state = self.write();
        state.list_requests.push(request.clone());

        let bucket = state
            .buckets
            .get(&request.bucket)
            .ok_or_else(|| S3Error::BucketNotFound(request.bucket.clone()))?;

        let lower = match &request.marker {
            Some(marker) if state.inclusive_marker => Bound::Included(marker.clone()),
            Some(marker) => Bound::Excluded(marker.clone()),
            None => Bound::Unbounded,
        };

        let mut limit = request.max_keys.max(1) as usize;
        if let Some(cap) = state.page_cap {
            limit = limit.min(cap.max(1));
        }

        let prefix = request.prefix.as_deref().unwrap_or("");
        let mut matching = bucket
            .objects
            .range::<String, _>((lower, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix));

        let entries: Vec<ObjectEntry> = matching
            .by_ref()
            .take(limit)
            .map(|(key, obj)| ObjectEntry {
                key: key.clone(),
                size: obj.data.len() as u64,
                last_modified: obj.last_modified,
                storage_class: Some(S3StorageClass::Standard),
                owner: state.owner.clone(),
            })
            .collect();
        let is_truncated = matching.next().is_some();

        let next_marker = if is_truncated && state.emit_next_marker {
            entries.last().map(|e| e.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            entries,
            is_truncated,
            next_marker,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody> {
        let mut state = self.write();
        state.fetches += 1;

        if state.failing_keys.contains(key) {
            return Err(S3Error::Network(format!("injected failure for {}", key)));
        }

        let data = state
            .buckets
            .get(bucket)
            .ok_or_else(|| S3Error::BucketNotFound(bucket.to_string()))?
            .objects
            .get(key)
            .ok_or_else(|| S3Error::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?
            .data
            .clone();

        if let Some(&cut) = state.broken_bodies.get(key) {
            let head = data.slice(..cut.min(data.len()));
            return Ok(Box::pin(Cursor::new(head).chain(ResetBody)));
        }

        Ok(Box::pin(Cursor::new(data)))
    }
}

/// Body tail whose every read fails
struct ResetBody;

impl AsyncRead for ResetBody {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset",
        )))
    }
}

#[async_trait]
impl StoreProvider for MemoryStore {
    type Store = MemoryStore;

    async fn connect(&self) -> S3Result<MemoryStore> {
        self.write().connections += 1;
        Ok(self.clone())
    }
}
