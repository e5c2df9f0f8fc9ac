//! Object store port

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use locus_core::Result;

/// Listing entry for one remote object
#[derive(Debug, Clone)]
pub struct RemoteObject {
    /// Backend-relative key, always ending in `.gpkg`
    pub key: String,

    /// Object size in bytes; zero when the backend cannot report it
    pub size: u64,

    pub last_modified: Option<DateTime<Utc>>,

    pub etag: Option<String>,
}

/// Abstract listing/download/read access to a package source.
///
/// Listings are finite and non-restartable; callers consume the returned
/// vector fully or drop it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Enumerate `.gpkg` objects. An empty backend yields an empty vector,
    /// never an error.
    async fn list(&self) -> Result<Vec<RemoteObject>>;

    /// Stream an object's bytes to `local_path`, creating parent
    /// directories. A no-op when source and destination resolve to the
    /// same absolute path.
    async fn download(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Whether the key currently exists in the backend.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Read the full object into memory.
    async fn reader(&self, key: &str) -> Result<Bytes>;
}

/// Only GeoPackage objects participate in discovery.
pub fn is_gpkg_key(key: &str) -> bool {
    key.to_ascii_lowercase().ends_with(".gpkg")
}

/// Create the parent directory chain for a download target.
pub(crate) async fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpkg_filter_is_case_insensitive_and_suffix_anchored() {
        assert!(is_gpkg_key("districts.gpkg"));
        assert!(is_gpkg_key("nested/path/zones.GPKG"));
        assert!(!is_gpkg_key("districts.gpkg.bak"));
        assert!(!is_gpkg_key("readme.txt"));
        assert!(!is_gpkg_key(""));
    }
}
