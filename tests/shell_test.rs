/*!
 * Integration tests for the interactive shell
 *
 * The shell reads from any async buffered reader, so scripted input drives
 * it the same way a terminal would.
 */

use std::fs;

use chrono::Utc;
use tempfile::TempDir;

use s3pull::commands::{shell::run_shell, Session};
use s3pull::config::PullConfig;
use s3pull::protocol::memory::MemoryStore;

fn session(store: &MemoryStore) -> Session<MemoryStore> {
    Session::new(
        store.clone(),
        PullConfig {
            workers: 3,
            show_progress: false,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_scripted_session() {
    s3pull::logging::init_test_logging();

    let store = MemoryStore::new();
    let now = Utc::now();
    store.add_object("bkt", "notes/today.txt", b"remember".to_vec(), now);
    store.add_object("bkt", "notes/old.txt", b"forgotten".to_vec(), now);
    let dir = TempDir::new().unwrap();
    let single = dir.path().join("single.txt");
    let mirror = dir.path().join("mirror");

    let script = format!(
        "s3-bucket-ls\n\
         s3-object-ls bkt notes/\n\
         s3-object-dl bkt notes/today.txt \"{}\"\n\
         s3-bucket-dl bkt \"{}\" 2000-01-01\n\
         exit\n\
         s3-object-dl bkt notes/old.txt never-written.txt\n",
        single.display(),
        mirror.display()
    );

    run_shell(&session(&store), script.as_bytes()).await.unwrap();

    assert_eq!(fs::read(&single).unwrap(), b"remember");
    assert_eq!(
        fs::read(mirror.join("notes/old.txt")).unwrap(),
        b"forgotten"
    );
    // One fetch for the single download, two for the bucket
    assert_eq!(store.fetch_count(), 3);
}

#[tokio::test]
async fn test_errors_do_not_end_the_shell() {
    let store = MemoryStore::new();
    store.add_object("bkt", "k", b"v".to_vec(), Utc::now());
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("k");

    let script = format!(
        "s3-bucket-dl bkt /tmp/x 31-12-2017\n\
         s3-object-dl bkt missing-key somewhere\n\
         s3-object-ls\n\
         frobnicate\n\
         \n\
         s3-object-dl \"bkt\" k {}\n",
        target.display()
    );

    // Ends at end of input without an explicit exit
    run_shell(&session(&store), script.as_bytes()).await.unwrap();

    assert_eq!(fs::read(&target).unwrap(), b"v");
}

#[tokio::test]
async fn test_unclosed_quote_is_reported_and_skipped() {
    let store = MemoryStore::new();
    store.add_bucket("bkt");

    run_shell(&session(&store), &b"s3-object-ls \"bkt\nquit\n"[..])
        .await
        .unwrap();

    assert!(store.list_requests().is_empty());
}
