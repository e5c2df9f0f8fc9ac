//! Local filesystem backend

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use locus_core::{LocusError, Result};

use crate::ports::{ensure_parent_dirs, is_gpkg_key, ObjectStore, RemoteObject};

/// Serves `.gpkg` files from a directory tree.
///
/// Keys are paths relative to the root, with `/` separators.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn list(&self) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();

        // A missing or empty root is an empty listing, not an error.
        if !self.root.is_dir() {
            return Ok(objects);
        }

        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| LocusError::storage("list", dir.display().to_string(), e))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| LocusError::storage("list", dir.display().to_string(), e))?
            {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }

                let key = match path.strip_prefix(&self.root) {
                    Ok(rel) => rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/"),
                    Err(_) => continue,
                };
                if !is_gpkg_key(&key) {
                    continue;
                }

                let meta = entry
                    .metadata()
                    .await
                    .map_err(|e| LocusError::storage("list", key.clone(), e))?;
                let last_modified = meta
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Utc>::from(t));

                objects.push(RemoteObject {
                    key,
                    size: meta.len(),
                    last_modified,
                    etag: None,
                });
            }
        }

        Ok(objects)
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<()> {
        let source = self.resolve(key);

        // Loading in place: the served directory doubles as the cache.
        let same = match (source.canonicalize(), absolutize(local_path)) {
            (Ok(src), Some(dst)) => src == dst,
            _ => false,
        };
        if same {
            tracing::debug!(key, "source and destination are the same file, skipping copy");
            return Ok(());
        }

        ensure_parent_dirs(local_path).await?;
        tokio::fs::copy(&source, local_path)
            .await
            .map_err(|e| LocusError::storage("download", key, e))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.resolve(key)).await.unwrap_or(false))
    }

    async fn reader(&self, key: &str) -> Result<Bytes> {
        let bytes = tokio::fs::read(self.resolve(key))
            .await
            .map_err(|e| LocusError::storage("read", key, e))?;
        Ok(Bytes::from(bytes))
    }
}

/// Canonicalize where possible; fall back to the canonical parent joined
/// with the file name so not-yet-existing targets still compare.
fn absolutize(path: &Path) -> Option<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Some(canonical);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}
