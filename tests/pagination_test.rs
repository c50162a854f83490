/*!
 * Integration tests for listing pagination
 *
 * Providers differ in how they continue a truncated listing. These tests run
 * the paginator against the in-memory store with the quirks switched on.
 */

use chrono::Utc;

use s3pull::core::{list_all_objects, LIST_PAGE_SIZE};
use s3pull::protocol::memory::MemoryStore;
use s3pull::protocol::S3Error;

fn bucket_with_keys(n: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now();
    for i in 1..=n {
        store.add_object("bkt", &format!("k{:05}", i), vec![0u8; 1], now);
    }
    store
}

#[tokio::test]
async fn test_inclusive_marker_across_provider_page_cap() {
    let store = bucket_with_keys(10_050)
        .with_page_cap(10_000)
        .with_inclusive_marker(true);

    let mut follow_ups = Vec::new();
    let listing = list_all_objects(&store, "bkt", None, LIST_PAGE_SIZE, |n| follow_ups.push(n))
        .await
        .unwrap();

    assert_eq!(listing.len(), 10_050);
    assert_eq!(listing.total_size(), 10_050);
    assert_eq!(follow_ups, vec![10_000]);

    let requests = store.list_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].marker, None);
    assert_eq!(requests[1].marker.as_deref(), Some("k10000"));

    let mut keys: Vec<_> = listing.entries.iter().map(|e| e.key.as_str()).collect();
    keys.dedup();
    assert_eq!(keys.len(), 10_050);
    assert_eq!(keys.first(), Some(&"k00001"));
    assert_eq!(keys.last(), Some(&"k10050"));
}

#[tokio::test]
async fn test_provider_next_marker_is_followed() {
    let store = bucket_with_keys(25).with_next_marker(true);

    let listing = list_all_objects(&store, "bkt", None, 10, |_| {})
        .await
        .unwrap();

    assert_eq!(listing.len(), 25);
    let markers: Vec<_> = store
        .list_requests()
        .into_iter()
        .map(|r| r.marker)
        .collect();
    assert_eq!(
        markers,
        vec![None, Some("k00010".to_string()), Some("k00020".to_string())]
    );
}

#[tokio::test]
async fn test_prefix_is_sent_on_every_page() {
    let store = bucket_with_keys(30);
    store.add_object("bkt", "other/1", b"x".to_vec(), Utc::now());

    let listing = list_all_objects(&store, "bkt", Some("k0001"), 4, |_| {})
        .await
        .unwrap();

    // k00010 ..= k00019
    assert_eq!(listing.len(), 10);
    assert_eq!(listing.prefix.as_deref(), Some("k0001"));
    assert!(store
        .list_requests()
        .iter()
        .all(|r| r.prefix.as_deref() == Some("k0001")));
}

#[tokio::test]
async fn test_stalled_marker_is_an_error() {
    // One key per page and the marker served again: no progress is possible
    let store = bucket_with_keys(3)
        .with_page_cap(1)
        .with_inclusive_marker(true);

    let err = list_all_objects(&store, "bkt", None, 100, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, S3Error::Pagination(_)));
    assert_eq!(store.list_requests().len(), 2);
}

#[tokio::test]
async fn test_empty_bucket() {
    let store = MemoryStore::new();
    store.add_bucket("empty");

    let listing = list_all_objects(&store, "empty", None, LIST_PAGE_SIZE, |_| {})
        .await
        .unwrap();

    assert!(listing.is_empty());
    assert_eq!(store.list_requests().len(), 1);
}
