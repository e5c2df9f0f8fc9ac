//! AWS S3 backend

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use locus_core::config::S3Config;
use locus_core::{LocusError, Result};
use tokio::io::AsyncWriteExt;

use crate::ports::{ensure_parent_dirs, is_gpkg_key, ObjectStore, RemoteObject};

/// Lists and fetches `.gpkg` objects from one S3 bucket.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Resolve credentials and region, honoring an endpoint override for
    /// S3-compatible stores.
    pub async fn connect(config: &S3Config) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "locus-config",
            ));
        }

        let sdk_config = loader.load().await;
        Ok(Self {
            client: Client::new(&sdk_config),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|e| LocusError::storage("list", &self.bucket, e))?;

            for object in output.contents() {
                let Some(key) = object.key() else { continue };
                if !is_gpkg_key(key) {
                    continue;
                }
                objects.push(RemoteObject {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object
                        .last_modified()
                        .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
                    etag: object.e_tag().map(str::to_string),
                });
            }

            if output.is_truncated() == Some(true) {
                continuation = output.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        ensure_parent_dirs(local_path).await?;

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;

        let mut body = output.body;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| LocusError::storage("download", key, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| LocusError::storage("download", key, e))?;
        }
        file.flush()
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(LocusError::storage("exists", key, service_error))
                }
            }
        }
    }

    async fn reader(&self, key: &str) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| LocusError::storage("read", key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| LocusError::storage("read", key, e))?;

        Ok(data.into_bytes())
    }
}
