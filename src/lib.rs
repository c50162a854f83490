/*!
 * s3pull - S3 bucket browser and incremental bucket downloader
 *
 * - Bucket and object listings with marker-based pagination
 * - Single object downloads streamed straight to disk
 * - Whole-bucket downloads over a fixed pool of workers, each with its own
 *   client session, filtered by modification time
 * - Repeating incremental backups
 */

pub mod cli_progress;
pub mod cli_style;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod protocol;

// Re-export commonly used types
pub use config::{Cadence, LogLevel, PullConfig};
pub use core::{
    download_object, list_all_objects, parse_cutoff_date, BackupScheduler, BulkDownloadReport,
    BulkDownloader, BulkRequest,
};
pub use error::{PullError, Result};
pub use protocol::{ObjectStore, StoreProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
