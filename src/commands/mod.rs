/*!
 * User-visible commands
 *
 * A [`Session`] holds the resolved configuration and a store provider, and
 * implements every command shared by the subcommand CLI and the interactive
 * [`shell`]. Each command prints its own output and returns its result.
 */

pub mod shell;

use std::path::Path;
use std::time::Duration;

use tracing::info;

use crate::cli_progress::ConsoleProgress;
use crate::cli_style::{
    bucket_table, bulk_summary_table, listing_summary_table, listing_table, print_info,
    section_header,
};
use crate::config::{Cadence, PullConfig};
use crate::core::{
    download_object, list_all_objects, parse_cutoff_date, BackupScheduler, BulkDownloadReport,
    BulkDownloader, BulkRequest,
};
use crate::error::Result;
use crate::protocol::s3::check_bucket_name;
use crate::protocol::{BucketList, ObjectListing, ObjectStore, StoreProvider};

/// Options of the repeating backup command
#[derive(Debug, Clone)]
pub struct BackupOptions {
    pub interval: Duration,
    pub cadence: Cadence,
    /// Stop after this many cycles; run forever when `None`
    pub max_cycles: Option<u64>,
}

impl BackupOptions {
    pub fn from_config(config: &PullConfig) -> Self {
        Self {
            interval: config.backup_interval(),
            cadence: config.cadence,
            max_cycles: None,
        }
    }
}

/// Resolved settings plus the store provider every command talks through
pub struct Session<P> {
    provider: P,
    config: PullConfig,
}

impl<P> Session<P>
where
    P: StoreProvider + Clone,
{
    pub fn new(provider: P, config: PullConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &PullConfig {
        &self.config
    }

    /// Bulk downloader sized from the configuration
    pub fn downloader(&self) -> BulkDownloader<P> {
        BulkDownloader::new(self.provider.clone())
            .with_workers(self.config.workers)
            .with_page_size(self.config.page_size)
    }

    /// Print the caller's buckets
    pub async fn bucket_ls(&self) -> Result<BucketList> {
        println!("Listing buckets...");
        let store = self.provider.connect().await?;
        let list = store.list_buckets().await?;

        println!();
        if let Some(owner) = &list.owner {
            println!("Owner: {}", owner);
        }
        println!("{}", bucket_table(&list));
        println!();
        Ok(list)
    }

    /// Print every object in `bucket`, or only those under `prefix`
    pub async fn object_ls(&self, bucket: &str, prefix: Option<&str>) -> Result<ObjectListing> {
        check_bucket_name(bucket)?;
        match prefix {
            Some(_) => println!("Searching bucket files..."),
            None => println!("Listing bucket files..."),
        }

        let store = self.provider.connect().await?;
        let listing = list_all_objects(&store, bucket, prefix, self.config.page_size, |n| {
            println!("performing additional request... (got {} files so far)", n)
        })
        .await?;

        section_header("Listing");
        println!("{}", listing_summary_table(&listing));
        if !listing.is_empty() {
            println!("{}", listing_table(&listing));
        }
        println!();
        Ok(listing)
    }

    /// Download one object to `local_file`
    pub async fn object_dl(&self, bucket: &str, key: &str, local_file: &Path) -> Result<u64> {
        check_bucket_name(bucket)?;
        println!("Downloading file...");

        let store = self.provider.connect().await?;
        let written = download_object(&store, bucket, key, local_file).await?;

        println!("{} bytes written to {}", written, local_file.display());
        println!();
        Ok(written)
    }

    /// Download every object in `bucket` modified after the given date
    ///
    /// `quiet` turns off per-file output and prints only the summary.
    pub async fn bucket_dl(
        &self,
        bucket: &str,
        local_dir: &Path,
        modified_after: Option<&str>,
        quiet: bool,
    ) -> Result<BulkDownloadReport> {
        let request = BulkRequest {
            bucket: bucket.to_string(),
            local_dir: local_dir.to_path_buf(),
            modified_after: parse_cutoff_date(modified_after)?,
        };
        let downloader = self.downloader();

        if quiet {
            let report = downloader.download_bucket_silent(&request).await?;
            println!("{}", bulk_summary_table(&report));
            Ok(report)
        } else {
            let mut progress = ConsoleProgress::new(self.config.show_progress);
            downloader.download_bucket(&request, &mut progress).await
        }
    }

    /// Repeatedly back up `bucket` into `local_dir`, returning the cycles run
    pub async fn backup_bucket(
        &self,
        bucket: &str,
        local_dir: &Path,
        since: Option<&str>,
        options: &BackupOptions,
    ) -> Result<u64> {
        check_bucket_name(bucket)?;
        let since = parse_cutoff_date(since)?;

        print_info(&format!(
            "Backing up {} into {} every {}s, starting from {}",
            bucket,
            local_dir.display(),
            options.interval.as_secs(),
            since
        ));
        info!(bucket, cadence = ?options.cadence, "Starting backup scheduler");

        let mut scheduler = BackupScheduler::new(self.downloader(), bucket, local_dir, since)
            .with_interval(options.interval)
            .with_cadence(options.cadence);

        let cycles = scheduler
            .run(options.max_cycles, |outcome| {
                if let Ok(report) = &outcome.result {
                    println!("Downloaded {} bytes", report.bytes);
                }
            })
            .await;

        Ok(cycles)
    }
}
