//! Marker-based pagination over a bucket listing

use std::collections::HashSet;

use tracing::debug;

use crate::protocol::{ListPageRequest, ObjectListing, ObjectStore, S3Error, S3Result};

/// Keys requested per page
pub const LIST_PAGE_SIZE: usize = 10_000;

/// List every object in `bucket` (optionally under `prefix`) into one listing
///
/// Follow-up pages start from the provider's `next_marker`, or from the last
/// key collected so far when the provider does not send one. Keys already
/// collected are dropped, so providers that serve the marker key again on the
/// next page produce no duplicates. `on_page` receives the number of entries
/// collected so far before every follow-up request.
///
/// Any failed page call aborts the whole listing.
pub async fn list_all_objects<S, F>(
    store: &S,
    bucket: &str,
    prefix: Option<&str>,
    page_size: usize,
    mut on_page: F,
) -> S3Result<ObjectListing>
where
    S: ObjectStore + ?Sized,
    F: FnMut(usize),
{
    let max_keys = i32::try_from(page_size).unwrap_or(i32::MAX).max(1);
    let mut listing = ObjectListing::new(bucket, prefix.map(str::to_string));
    let mut seen: HashSet<String> = HashSet::new();
    let mut marker: Option<String> = None;

    loop {
        let request = ListPageRequest {
            bucket: bucket.to_string(),
            prefix: listing.prefix.clone(),
            marker: marker.clone(),
            max_keys,
        };

        let page = store.list_objects_page(&request).await?;
        let served = page.entries.len();

        for entry in page.entries {
            if seen.insert(entry.key.clone()) {
                listing.entries.push(entry);
            }
        }

        debug!(
            bucket,
            served,
            total = listing.len(),
            truncated = page.is_truncated,
            "Listed page"
        );

        if !page.is_truncated {
            break;
        }

        let next = page
            .next_marker
            .filter(|m| !m.is_empty())
            .or_else(|| listing.entries.last().map(|e| e.key.clone()));

        match next {
            Some(next) if marker.as_deref() != Some(next.as_str()) => {
                on_page(listing.len());
                marker = Some(next);
            }
            _ => {
                return Err(S3Error::Pagination(format!(
                    "listing of {} did not advance past marker {:?}",
                    bucket, marker
                )));
            }
        }
    }

    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::memory::MemoryStore;
    use chrono::Utc;

    fn store_with_keys(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 1..=n {
            store.add_object("bkt", &format!("k{:03}", i), vec![1u8; i], Utc::now());
        }
        store
    }

    #[tokio::test]
    async fn test_single_page() {
        let store = store_with_keys(5);
        let mut pages = 0;
        let listing = list_all_objects(&store, "bkt", None, 100, |_| pages += 1)
            .await
            .unwrap();

        assert_eq!(listing.len(), 5);
        assert_eq!(pages, 0);
        assert_eq!(store.list_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_exclusive_marker_falls_back_to_last_key() {
        let store = store_with_keys(7);
        let mut progress = Vec::new();
        let listing = list_all_objects(&store, "bkt", None, 3, |n| progress.push(n))
            .await
            .unwrap();

        assert_eq!(listing.len(), 7);
        assert_eq!(progress, vec![3, 6]);

        let markers: Vec<_> = store
            .list_requests()
            .into_iter()
            .map(|r| r.marker)
            .collect();
        assert_eq!(
            markers,
            vec![None, Some("k003".to_string()), Some("k006".to_string())]
        );
    }

    #[tokio::test]
    async fn test_inclusive_marker_is_deduplicated() {
        let store = store_with_keys(7).with_inclusive_marker(true);
        let listing = list_all_objects(&store, "bkt", None, 3, |_| {})
            .await
            .unwrap();

        let keys: Vec<_> = listing.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["k001", "k002", "k003", "k004", "k005", "k006", "k007"]
        );
    }

    #[tokio::test]
    async fn test_provider_next_marker_is_preferred() {
        let store = store_with_keys(4).with_next_marker(true).with_page_cap(2);
        let listing = list_all_objects(&store, "bkt", None, 1000, |_| {})
            .await
            .unwrap();

        assert_eq!(listing.len(), 4);
        assert_eq!(
            store.list_requests()[1].marker.as_deref(),
            Some("k002")
        );
    }

    #[tokio::test]
    async fn test_prefix_is_sent_on_every_page() {
        let store = store_with_keys(3);
        store.add_object("bkt", "logs/a", b"a".to_vec(), Utc::now());
        store.add_object("bkt", "logs/b", b"b".to_vec(), Utc::now());

        let listing = list_all_objects(&store, "bkt", Some("logs/"), 1, |_| {})
            .await
            .unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing.prefix.as_deref(), Some("logs/"));
        assert!(store
            .list_requests()
            .iter()
            .all(|r| r.prefix.as_deref() == Some("logs/")));
    }

    #[tokio::test]
    async fn test_stalled_marker_is_an_error() {
        // One key per page with an inclusive marker never gets past the marker
        let store = store_with_keys(3).with_inclusive_marker(true);
        let err = list_all_objects(&store, "bkt", None, 1, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, S3Error::Pagination(_)));
    }

    #[tokio::test]
    async fn test_failed_page_aborts_listing() {
        let store = store_with_keys(3);
        let err = list_all_objects(&store, "missing", None, 10, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, S3Error::BucketNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let store = MemoryStore::new();
        store.add_bucket("empty");
        let listing = list_all_objects(&store, "empty", None, LIST_PAGE_SIZE, |_| {})
            .await
            .unwrap();

        assert!(listing.is_empty());
        assert_eq!(listing.total_size(), 0);
    }
}
