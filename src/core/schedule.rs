//! Repeating incremental backups

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::{Cadence, DEFAULT_BACKUP_INTERVAL_SECS};
use crate::core::bulk::{BulkDownloadReport, BulkDownloader, BulkRequest};
use crate::error::Result;
use crate::protocol::StoreProvider;

/// What happened in one backup cycle
#[derive(Debug)]
pub struct CycleOutcome {
    /// Cycle number, starting at 1
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    /// Cutoff this cycle downloaded against
    pub cutoff: DateTime<Utc>,
    pub elapsed: Duration,
    pub result: Result<BulkDownloadReport>,
}

/// Runs a bulk download over and over, each time only fetching what changed
/// since the previous cycle started
pub struct BackupScheduler<P> {
    downloader: BulkDownloader<P>,
    bucket: String,
    local_dir: PathBuf,
    cutoff: DateTime<Utc>,
    interval: Duration,
    cadence: Cadence,
    cycles: u64,
}

impl<P: StoreProvider> BackupScheduler<P> {
    pub fn new(
        downloader: BulkDownloader<P>,
        bucket: impl Into<String>,
        local_dir: impl Into<PathBuf>,
        since: DateTime<Utc>,
    ) -> Self {
        Self {
            downloader,
            bucket: bucket.into(),
            local_dir: local_dir.into(),
            cutoff: since,
            interval: Duration::from_secs(DEFAULT_BACKUP_INTERVAL_SECS),
            cadence: Cadence::default(),
            cycles: 0,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Cutoff the next cycle will use
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles
    }

    /// Run one backup, then move the cutoff to this cycle's start
    ///
    /// The cutoff advances even when the cycle failed.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let started_at = Utc::now();
        let clock = Instant::now();
        self.cycles += 1;

        let request = BulkRequest {
            bucket: self.bucket.clone(),
            local_dir: self.local_dir.clone(),
            modified_after: self.cutoff,
        };

        info!(
            cycle = self.cycles,
            bucket = %self.bucket,
            cutoff = %self.cutoff,
            "Starting backup"
        );

        let result = self.downloader.download_bucket_silent(&request).await;
        let elapsed = clock.elapsed();

        match &result {
            Ok(report) => {
                info!(
                    cycle = self.cycles,
                    bytes = report.bytes,
                    files = report.files_downloaded,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Backup finished: {} bytes",
                    report.bytes
                );
                for failure in &report.failures {
                    warn!(key = %failure.key, error = %failure.error, "Backup skipped object");
                }
            }
            Err(e) => error!(
                cycle = self.cycles,
                category = %e.category(),
                error = %e,
                "Backup failed"
            ),
        }

        let cutoff = std::mem::replace(&mut self.cutoff, started_at);

        CycleOutcome {
            cycle: self.cycles,
            started_at,
            cutoff,
            elapsed,
            result,
        }
    }

    /// Run cycles until `max_cycles` have run, or forever when `None`
    ///
    /// `on_cycle` sees every outcome. There is no sleep after the last cycle.
    pub async fn run<F>(&mut self, max_cycles: Option<u64>, mut on_cycle: F) -> u64
    where
        F: FnMut(&CycleOutcome),
    {
        let mut ran = 0;

        loop {
            let outcome = self.run_cycle().await;
            on_cycle(&outcome);
            ran += 1;

            if max_cycles.is_some_and(|max| ran >= max) {
                return ran;
            }

            let pause = self.cadence.sleep_after(outcome.elapsed, self.interval);
            info!(
                next_in_secs = pause.as_secs(),
                "Next backup scheduled"
            );
            tokio::time::sleep(pause).await;
        }
    }

    /// Back up forever
    pub async fn run_forever(&mut self) {
        self.run(None, |_| {}).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::epoch;
    use crate::protocol::memory::MemoryStore;

    #[tokio::test]
    async fn test_cutoff_advances_even_on_failure() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let mut scheduler = BackupScheduler::new(
            BulkDownloader::new(store).with_workers(2),
            "missing-bucket",
            dir.path(),
            epoch(),
        );

        let outcome = scheduler.run_cycle().await;

        assert!(outcome.result.is_err());
        assert_eq!(outcome.cutoff, epoch());
        assert_eq!(scheduler.cutoff(), outcome.started_at);
        assert_eq!(scheduler.cycles_run(), 1);
    }

    #[tokio::test]
    async fn test_bounded_run_does_not_sleep_after_last_cycle() {
        let store = MemoryStore::new();
        store.add_bucket("bkt");
        let dir = tempfile::tempdir().unwrap();
        let mut scheduler = BackupScheduler::new(
            BulkDownloader::new(store),
            "bkt",
            dir.path(),
            epoch(),
        )
        .with_interval(Duration::from_secs(3600))
        .with_cadence(Cadence::FixedRate);

        let mut seen = Vec::new();
        let ran = tokio::time::timeout(
            Duration::from_secs(5),
            scheduler.run(Some(1), |o| seen.push(o.cycle)),
        )
        .await
        .expect("a single bounded cycle must not sleep");

        assert_eq!(ran, 1);
        assert_eq!(seen, vec![1]);
    }
}
