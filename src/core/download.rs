//! Single-object download

use std::path::Path;

use tokio::fs::{self, OpenOptions};
use tokio::io::{self, AsyncWriteExt};
use tracing::debug;

use crate::error::{PullError, Result};
use crate::protocol::ObjectStore;

/// Stream `bucket/key` into `local_path`, returning the number of bytes written
///
/// The remote fetch happens before anything local is touched. Missing parent
/// directories are created and an existing file is truncated. A failed copy may
/// leave a partial file behind.
pub async fn download_object<S>(
    store: &S,
    bucket: &str,
    key: &str,
    local_path: &Path,
) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    let mut body = store.get_object(bucket, key).await?;

    if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PullError::local_io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(local_path)
        .await
        .map_err(|e| PullError::local_io(local_path, e))?;

    let written = io::copy(&mut body, &mut file)
        .await
        .map_err(|source| PullError::Transfer {
            key: key.to_string(),
            source,
        })?;

    file.flush().await.map_err(|source| PullError::Transfer {
        key: key.to_string(),
        source,
    })?;

    debug!(bucket, key, bytes = written, path = %local_path.display(), "Downloaded object");
    Ok(written)
}
