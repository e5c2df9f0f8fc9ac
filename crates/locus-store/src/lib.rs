//! Locus Store - Object store backends for package discovery
//!
//! One `ObjectStore` trait over four backends: a local directory, an S3
//! bucket, an Azure Blob container, and a plain HTTP server publishing an
//! `index.txt` listing. Listings only ever surface `.gpkg` keys.

pub mod azure;
pub mod http;
pub mod local;
pub mod ports;
pub mod s3;

pub use ports::{is_gpkg_key, ObjectStore, RemoteObject};

use std::sync::Arc;

use locus_core::config::{StorageConfig, StorageKind};
use locus_core::Result;

/// Build the configured backend.
pub async fn make_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config.kind {
        StorageKind::Local => Arc::new(local::LocalStore::new(config.local_path.clone())),
        StorageKind::S3 => Arc::new(s3::S3Store::connect(&config.s3).await?),
        StorageKind::Azure => Arc::new(azure::AzureStore::new(&config.azure)?),
        StorageKind::Http => Arc::new(http::HttpStore::new(&config.http)?),
    };
    Ok(store)
}
