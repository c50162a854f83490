//! Object store operations backed by the AWS SDK

use super::client::S3Client;
use super::config::S3Config;
use super::error::{S3Error, S3Result};
use super::types::{
    to_utc, BucketInfo, BucketList, ListPageRequest, ObjectEntry, ObjectPage, S3StorageClass,
};
use crate::protocol::{ObjectBody, ObjectStore, StoreProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::SystemTime;

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> S3Result<BucketList> {
        let response = self
            .aws_client()
            .list_buckets()
            .send()
            .await
            .map_err(|e| S3Error::from(e).context("Failed to list buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .filter_map(|bucket| {
                Some(BucketInfo {
                    name: bucket.name()?.to_string(),
                    created: bucket.creation_date().map(to_utc),
                })
            })
            .collect();

        let owner = response
            .owner()
            .and_then(|owner| owner.display_name())
            .map(str::to_string);

        Ok(BucketList { owner, buckets })
    }

    async fn list_objects_page(&self, request: &ListPageRequest) -> S3Result<ObjectPage> {
        let response = self
            .aws_client()
            .list_objects()
            .bucket(&request.bucket)
            .set_prefix(request.prefix.clone())
            .set_marker(request.marker.clone())
            .max_keys(request.max_keys)
            .send()
            .await
            .map_err(|e| {
                S3Error::from(e).context(format!("Failed to list objects in {}", request.bucket))
            })?;

        let entries = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let size = obj.size().unwrap_or(0).max(0) as u64;
                let last_modified = obj
                    .last_modified()
                    .map(to_utc)
                    .unwrap_or_else(|| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH));
                let storage_class = obj
                    .storage_class()
                    .map(|sc| S3StorageClass::from_name(sc.as_str()));
                let owner = obj
                    .owner()
                    .and_then(|o| o.display_name())
                    .map(str::to_string);

                Some(ObjectEntry {
                    key,
                    size,
                    last_modified,
                    storage_class,
                    owner,
                })
            })
            .collect();

        Ok(ObjectPage {
            entries,
            is_truncated: response.is_truncated().unwrap_or(false),
            next_marker: response.next_marker().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> S3Result<ObjectBody> {
        let response = self
            .aws_client()
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false)
                    || e.raw_response()
                        .map(|r| r.status().as_u16() == 404)
                        .unwrap_or(false);
                if missing {
                    S3Error::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    S3Error::from(e).context(format!("Failed to fetch {}/{}", bucket, key))
                }
            })?;

        Ok(Box::pin(response.body.into_async_read()))
    }
}

/// Each connection builds a fresh SDK client from the same settings
#[async_trait]
impl StoreProvider for S3Config {
    type Store = S3Client;

    async fn connect(&self) -> S3Result<S3Client> {
        S3Client::new(self.clone()).await
    }
}
