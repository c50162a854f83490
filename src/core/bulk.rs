/*!
 * Bulk bucket download
 *
 * A bucket listing is filtered into a [`DownloadPlan`], then the plan's jobs
 * are fanned out over a fixed pool of workers:
 *
 * ```text
 *  producer ──(async-channel, bounded)──► worker 0..N ──(mpsc)──► aggregator
 *  mkdir -p + enqueue                     own session each        progress + report
 * ```
 *
 * Closing the job queue tells workers to stop. Every dequeued job produces
 * exactly one [`Completion`], failed or not, and the aggregator checks the
 * completion count against the number of jobs enqueued.
 */

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::fs;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_PAGE_SIZE, DEFAULT_WORKERS};
use crate::core::download::download_object;
use crate::core::listing::list_all_objects;
use crate::error::{PullError, Result};
use crate::protocol::s3::check_bucket_name;
use crate::protocol::{ObjectListing, ObjectStore, StoreProvider};

/// What to download and where
#[derive(Debug, Clone)]
pub struct BulkRequest {
    pub bucket: String,
    pub local_dir: PathBuf,
    /// Only objects modified strictly after this instant are downloaded
    pub modified_after: DateTime<Utc>,
}

/// One object to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub bucket: String,
    pub key: String,
    pub local_path: PathBuf,
    /// Size reported by the listing
    pub size: u64,
    /// Filled in by the worker on success
    pub bytes_written: u64,
}

/// Eligible jobs plus what was left out
#[derive(Debug, Clone, Default)]
pub struct DownloadPlan {
    /// Jobs in listing order
    pub jobs: Vec<DownloadJob>,
    pub total_bytes: u64,
    /// Zero-size folder placeholders
    pub skipped_markers: usize,
    /// Entries not modified after the cutoff
    pub skipped_unchanged: usize,
    /// Keys that do not map to a path inside the target directory
    pub skipped_unsafe: usize,
}

impl DownloadPlan {
    /// Filter `listing` into jobs targeting `local_dir`
    ///
    /// An entry is eligible when it is not empty and was modified strictly
    /// after `modified_after`.
    pub fn build(listing: ObjectListing, local_dir: &Path, modified_after: DateTime<Utc>) -> Self {
        let mut plan = DownloadPlan::default();
        let bucket = listing.bucket;

        for entry in listing.entries {
            if entry.is_directory_marker() {
                plan.skipped_markers += 1;
                continue;
            }

            if entry.last_modified <= modified_after {
                plan.skipped_unchanged += 1;
                continue;
            }

            let Some(local_path) = local_path_for(local_dir, &entry.key) else {
                warn!(key = %entry.key, "Skipping key that does not map to a local path");
                plan.skipped_unsafe += 1;
                continue;
            };

            plan.total_bytes += entry.size;
            plan.jobs.push(DownloadJob {
                bucket: bucket.clone(),
                key: entry.key,
                local_path,
                size: entry.size,
                bytes_written: 0,
            });
        }

        plan
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Map an object key onto a path below `local_dir`
///
/// Keys are split on `/`; empty and `.` segments are ignored. Returns `None`
/// for keys with a `..` segment, a NUL byte, or without any usable segment.
/// On Windows a backslash is a separator, so keys containing one are
/// rejected there too.
pub fn local_path_for(local_dir: &Path, key: &str) -> Option<PathBuf> {
    let mut path = local_dir.to_path_buf();
    let mut segments = 0;

    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\0') || (cfg!(windows) && s.contains('\\')) => return None,
            s => {
                path.push(s);
                segments += 1;
            }
        }
    }

    (segments > 0).then_some(path)
}

/// Outcome of one job, sent from a worker to the aggregator
#[derive(Debug)]
pub struct Completion {
    pub job: DownloadJob,
    pub error: Option<PullError>,
}

/// Running totals of a bulk download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkProgress {
    pub total_files: usize,
    /// Successful and failed jobs
    pub completed_files: usize,
    pub failed_files: usize,
    pub bytes_done: u64,
    pub total_bytes: u64,
}

impl BulkProgress {
    pub fn new(total_files: usize, total_bytes: u64) -> Self {
        Self {
            total_files,
            total_bytes,
            ..Default::default()
        }
    }

    /// Whole percent of jobs completed; 100 when there is nothing to do
    pub fn percent(&self) -> u64 {
        if self.total_files == 0 {
            100
        } else {
            (self.completed_files as u64 * 100) / self.total_files as u64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed_files >= self.total_files
    }

    fn record_success(&mut self, bytes: u64) {
        self.completed_files += 1;
        self.bytes_done += bytes;
    }

    fn record_failure(&mut self) {
        self.completed_files += 1;
        self.failed_files += 1;
    }
}

/// A job that did not complete
#[derive(Debug)]
pub struct DownloadFailure {
    pub key: String,
    pub local_path: PathBuf,
    pub error: PullError,
}

/// Result of a bulk download
#[derive(Debug, Default)]
pub struct BulkDownloadReport {
    pub bucket: String,
    pub files_downloaded: usize,
    /// Bytes written by successful jobs
    pub bytes: u64,
    pub failures: Vec<DownloadFailure>,
    pub skipped_markers: usize,
    pub skipped_unchanged: usize,
    pub skipped_unsafe: usize,
    pub elapsed: Duration,
}

impl BulkDownloadReport {
    fn for_plan(bucket: &str, plan: &DownloadPlan) -> Self {
        Self {
            bucket: bucket.to_string(),
            skipped_markers: plan.skipped_markers,
            skipped_unchanged: plan.skipped_unchanged,
            skipped_unsafe: plan.skipped_unsafe,
            ..Default::default()
        }
    }

    /// True when no job failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn files_failed(&self) -> usize {
        self.failures.len()
    }
}

/// Hooks for progress display. Every hook runs on the task driving the download.
pub trait BulkObserver: Send {
    /// A listing page was truncated; `entries_so_far` are collected
    fn listing_page(&mut self, _entries_so_far: usize) {}

    /// Filtering finished
    fn planned(&mut self, _plan: &DownloadPlan) {}

    /// One job completed, successfully when `error` is `None`
    fn file_finished(
        &mut self,
        _job: &DownloadJob,
        _error: Option<&PullError>,
        _progress: &BulkProgress,
    ) {
    }

    /// The whole download finished
    fn finished(&mut self, _report: &BulkDownloadReport) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl BulkObserver for SilentObserver {}

/// Downloads a bucket's changed objects with a fixed pool of workers
pub struct BulkDownloader<P> {
    provider: P,
    workers: usize,
    page_size: usize,
}

impl<P: StoreProvider> BulkDownloader<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            workers: DEFAULT_WORKERS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the pool size (at least one)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the number of keys requested per listing page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run a bulk download without progress output
    pub async fn download_bucket_silent(&self, request: &BulkRequest) -> Result<BulkDownloadReport> {
        self.download_bucket(request, &mut SilentObserver).await
    }

    /// List the bucket, then download every eligible object
    ///
    /// Listing errors and job setup errors (target directories that cannot be
    /// created) are returned as `Err`. Failed downloads are collected in the
    /// report instead.
    pub async fn download_bucket(
        &self,
        request: &BulkRequest,
        observer: &mut dyn BulkObserver,
    ) -> Result<BulkDownloadReport> {
        let started = Instant::now();
        check_bucket_name(&request.bucket)?;

        let lister = self.provider.connect().await?;
        let listing = list_all_objects(&lister, &request.bucket, None, self.page_size, |n| {
            observer.listing_page(n)
        })
        .await?;
        drop(lister);

        let plan = DownloadPlan::build(listing, &request.local_dir, request.modified_after);
        info!(
            bucket = %request.bucket,
            files = plan.len(),
            bytes = plan.total_bytes,
            unchanged = plan.skipped_unchanged,
            markers = plan.skipped_markers,
            cutoff = %request.modified_after,
            "Planned bulk download"
        );
        observer.planned(&plan);

        let mut report = BulkDownloadReport::for_plan(&request.bucket, &plan);

        if !plan.is_empty() {
            self.run_pool(plan, observer, &mut report).await?;
        }

        report.elapsed = started.elapsed();
        observer.finished(&report);
        Ok(report)
    }

    async fn run_pool(
        &self,
        plan: DownloadPlan,
        observer: &mut dyn BulkObserver,
        report: &mut BulkDownloadReport,
    ) -> Result<()> {
        let mut sessions = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            sessions.push(self.provider.connect().await?);
        }

        let (job_tx, job_rx) = async_channel::bounded::<DownloadJob>(self.workers);
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        let handles: Vec<_> = sessions
            .into_iter()
            .enumerate()
            .map(|(id, store)| tokio::spawn(worker_loop(id, store, job_rx.clone(), done_tx.clone())))
            .collect();
        drop(job_rx);
        drop(done_tx);

        let mut progress = BulkProgress::new(plan.len(), plan.total_bytes);
        let producer = tokio::spawn(produce(plan.jobs, job_tx));

        // Ends once every worker has exited and dropped its sender
        while let Some(Completion { job, error }) = done_rx.recv().await {
            match error {
                None => {
                    progress.record_success(job.bytes_written);
                    report.files_downloaded += 1;
                    report.bytes += job.bytes_written;
                    observer.file_finished(&job, None, &progress);
                }
                Some(error) => {
                    progress.record_failure();
                    observer.file_finished(&job, Some(&error), &progress);
                    report.failures.push(DownloadFailure {
                        key: job.key,
                        local_path: job.local_path,
                        error,
                    });
                }
            }
        }

        let enqueued = producer
            .await
            .map_err(|e| PullError::Pool(format!("producer task failed: {}", e)))??;

        for joined in join_all(handles).await {
            joined.map_err(|e| PullError::Pool(format!("worker task failed: {}", e)))?;
        }

        if progress.completed_files != enqueued {
            return Err(PullError::Pool(format!(
                "{} jobs enqueued but {} completed",
                enqueued, progress.completed_files
            )));
        }

        Ok(())
    }
}

/// Create target directories and feed jobs to the pool in listing order
///
/// Dropping the sender at the end closes the queue.
async fn produce(jobs: Vec<DownloadJob>, queue: async_channel::Sender<DownloadJob>) -> Result<usize> {
    let mut created: HashSet<PathBuf> = HashSet::new();
    let mut enqueued = 0;

    for job in jobs {
        if let Some(parent) = job.local_path.parent() {
            if !created.contains(parent) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PullError::local_io(parent, e))?;
                created.insert(parent.to_path_buf());
            }
        }

        queue.send(job).await.map_err(|_| {
            PullError::Pool("all workers exited before the queue was drained".to_string())
        })?;
        enqueued += 1;
    }

    Ok(enqueued)
}

async fn worker_loop<S: ObjectStore>(
    id: usize,
    store: S,
    queue: async_channel::Receiver<DownloadJob>,
    done: mpsc::UnboundedSender<Completion>,
) {
    while let Ok(mut job) = queue.recv().await {
        let error = match download_object(&store, &job.bucket, &job.key, &job.local_path).await {
            Ok(written) => {
                job.bytes_written = written;
                None
            }
            Err(e) => {
                warn!(
                    worker = id,
                    key = %job.key,
                    category = %e.category(),
                    error = %e,
                    "Download failed"
                );
                Some(e)
            }
        };

        if done.send(Completion { job, error }).is_err() {
            break;
        }
    }

    debug!(worker = id, "Worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ObjectEntry;
    use chrono::Duration as ChronoDuration;

    fn entry(key: &str, size: u64, last_modified: DateTime<Utc>) -> ObjectEntry {
        ObjectEntry {
            key: key.to_string(),
            size,
            last_modified,
            storage_class: None,
            owner: None,
        }
    }

    #[test]
    fn test_local_path_mapping() {
        let root = Path::new("/data");
        assert_eq!(
            local_path_for(root, "a/b/c.txt"),
            Some(PathBuf::from("/data/a/b/c.txt"))
        );
        assert_eq!(
            local_path_for(root, "/a//./b"),
            Some(PathBuf::from("/data/a/b"))
        );
        assert_eq!(local_path_for(root, "a/../../etc/passwd"), None);
        assert_eq!(local_path_for(root, ".."), None);
        assert_eq!(local_path_for(root, "//"), None);
        assert_eq!(local_path_for(root, ""), None);
        assert_eq!(local_path_for(root, "a/b\0c"), None);
    }

    #[cfg(not(windows))]
    #[test]
    fn test_backslash_is_part_of_the_file_name() {
        let root = Path::new("/data");
        let path = local_path_for(root, "a\\b/c").unwrap();
        assert_eq!(path, PathBuf::from("/data/a\\b/c"));
        assert_eq!(path.parent(), Some(Path::new("/data/a\\b")));
        assert_eq!(local_path_for(root, "..\\x"), Some(PathBuf::from("/data/..\\x")));
    }

    #[test]
    fn test_plan_filters_markers_and_cutoff() {
        let cutoff = Utc::now();
        let before = cutoff - ChronoDuration::hours(1);
        let after = cutoff + ChronoDuration::hours(1);

        let mut listing = ObjectListing::new("bkt", None);
        listing.entries = vec![
            entry("new.txt", 10, after),
            entry("dir/", 0, after),
            entry("old.txt", 20, before),
            entry("exact.txt", 30, cutoff),
            entry("../escape", 40, after),
            entry("nested/new.bin", 5, after),
        ];

        let plan = DownloadPlan::build(listing, Path::new("/out"), cutoff);

        let keys: Vec<_> = plan.jobs.iter().map(|j| j.key.as_str()).collect();
        assert_eq!(keys, vec!["new.txt", "nested/new.bin"]);
        assert_eq!(plan.total_bytes, 15);
        assert_eq!(plan.skipped_markers, 1);
        assert_eq!(plan.skipped_unchanged, 2);
        assert_eq!(plan.skipped_unsafe, 1);
        assert_eq!(plan.jobs[1].local_path, PathBuf::from("/out/nested/new.bin"));
        assert!(plan.jobs.iter().all(|j| j.bucket == "bkt" && j.bytes_written == 0));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(BulkProgress::new(0, 0).percent(), 100);

        let mut progress = BulkProgress::new(3, 300);
        assert_eq!(progress.percent(), 0);
        progress.record_success(100);
        assert_eq!(progress.percent(), 33);
        progress.record_failure();
        assert_eq!(progress.percent(), 66);
        progress.record_success(100);
        assert_eq!(progress.percent(), 100);
        assert!(progress.is_complete());
        assert_eq!(progress.bytes_done, 200);
        assert_eq!(progress.failed_files, 1);
    }

    #[tokio::test]
    async fn test_producer_reports_unwritable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let (tx, rx) = async_channel::bounded(1);
        let job = DownloadJob {
            bucket: "b".to_string(),
            key: "file/k".to_string(),
            local_path: blocker.join("k"),
            size: 1,
            bytes_written: 0,
        };

        let err = produce(vec![job], tx).await.unwrap_err();
        assert!(matches!(err, PullError::LocalIo { .. }));
        assert!(rx.is_closed());
    }

    #[tokio::test]
    async fn test_producer_without_workers() {
        let (tx, rx) = async_channel::bounded::<DownloadJob>(1);
        drop(rx);

        let job = DownloadJob {
            bucket: "b".to_string(),
            key: "k".to_string(),
            local_path: std::env::temp_dir().join("s3pull-producer-test-k"),
            size: 1,
            bytes_written: 0,
        };

        assert!(matches!(
            produce(vec![job], tx).await,
            Err(PullError::Pool(_))
        ));
    }
}
