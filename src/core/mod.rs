/*!
 * Core download engine
 *
 * - [`listing`]: marker-based pagination into one logical listing
 * - [`download`]: stream a single object into a local file
 * - [`bulk`]: filter a listing and fan downloads out over a worker pool
 * - [`schedule`]: repeat bulk downloads as incremental backups
 */

pub mod bulk;
pub mod download;
pub mod listing;
pub mod schedule;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::time::SystemTime;

use crate::error::{PullError, Result};

pub use bulk::{
    BulkDownloadReport, BulkDownloader, BulkObserver, BulkProgress, BulkRequest, DownloadFailure,
    DownloadJob, DownloadPlan, SilentObserver,
};
pub use download::download_object;
pub use listing::{list_all_objects, LIST_PAGE_SIZE};
pub use schedule::{BackupScheduler, CycleOutcome};

/// Date format accepted for cutoffs
pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

/// The Unix epoch, used as the "everything" cutoff
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::from(SystemTime::UNIX_EPOCH)
}

/// Parse an optional `yyyy-mm-dd` cutoff as midnight UTC
///
/// No date means the Unix epoch, so every object counts as modified.
pub fn parse_cutoff_date(date: Option<&str>) -> Result<DateTime<Utc>> {
    let Some(date) = date else {
        return Ok(epoch());
    };

    let day = NaiveDate::parse_from_str(date.trim(), CUTOFF_DATE_FORMAT).map_err(|e| {
        PullError::InvalidArgument(format!(
            "invalid date '{}' (expected yyyy-mm-dd): {}",
            date, e
        ))
    })?;

    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PullError::InvalidArgument(format!("invalid date '{}'", date)))?;

    Ok(Utc.from_utc_datetime(&midnight))
}
