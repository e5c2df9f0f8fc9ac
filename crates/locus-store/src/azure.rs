//! Azure Blob Storage backend

use std::path::Path;

use async_trait::async_trait;
use azure_storage::StorageCredentials;
use azure_storage_blobs::prelude::{ClientBuilder, ContainerClient};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use locus_core::config::AzureConfig;
use locus_core::{LocusError, Result};

use crate::ports::{ensure_parent_dirs, is_gpkg_key, ObjectStore, RemoteObject};

/// Lists and fetches `.gpkg` blobs from one Azure container.
pub struct AzureStore {
    container: ContainerClient,
}

impl AzureStore {
    pub fn new(config: &AzureConfig) -> Result<Self> {
        let credentials = match &config.access_key {
            Some(key) => StorageCredentials::access_key(config.account.clone(), key.clone()),
            None => StorageCredentials::anonymous(),
        };

        let container = ClientBuilder::new(config.account.clone(), credentials)
            .container_client(config.container.clone());

        Ok(Self { container })
    }
}

#[async_trait]
impl ObjectStore for AzureStore {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();

        let mut pages = self.container.list_blobs().into_stream();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| LocusError::storage("list", "", e))?;
            for blob in page.blobs.blobs() {
                if !is_gpkg_key(&blob.name) {
                    continue;
                }
                objects.push(RemoteObject {
                    key: blob.name.clone(),
                    size: blob.properties.content_length,
                    last_modified: DateTime::<Utc>::from_timestamp(
                        blob.properties.last_modified.unix_timestamp(),
                        blob.properties.last_modified.nanosecond(),
                    ),
                    etag: Some(blob.properties.etag.to_string()),
                });
            }
        }

        Ok(objects)
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let bytes = self.reader(key).await?;
        ensure_parent_dirs(local_path).await?;
        tokio::fs::write(local_path, &bytes)
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.container
            .blob_client(key)
            .exists()
            .await
            .map_err(|e| LocusError::storage("exists", key, e))
    }

    async fn reader(&self, key: &str) -> Result<Bytes> {
        let content = self
            .container
            .blob_client(key)
            .get_content()
            .await
            .map_err(|e| LocusError::storage("read", key, e))?;
        Ok(Bytes::from(content))
    }
}
