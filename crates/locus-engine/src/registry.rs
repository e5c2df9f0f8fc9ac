//! Package registry
//!
//! The process-wide map from package identifier to `(package, status)`.
//! Exactly one reader-writer lock protects the map; entries are owned by the
//! registry and handed out as snapshots. Mutations hold the write lock only
//! for map edits — the I/O-heavy open, download, and index steps run outside
//! it, so queries issued during an in-flight load keep seeing the pre-load
//! ready set until the final status transition publishes atomically.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use locus_core::models::{package_id_from_path, Package, PackageStatus};
use locus_core::{LocusError, Result};
use locus_gpkg::GpkgRepository;
use locus_store::ObjectStore;

/// One registry entry: an opened package and where it is in its lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct PackageEntry {
    pub package: Package,
    pub status: PackageStatus,
}

/// What a reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncOutcome {
    pub added: usize,
    pub removed: usize,
}

pub struct Registry {
    entries: RwLock<HashMap<String, PackageEntry>>,
    repository: Arc<GpkgRepository>,
    store: Arc<dyn ObjectStore>,
    cache_dir: PathBuf,
    download_timeout: Duration,
    /// Serializes `sync` and `load_all` passes; scheduled and API-triggered
    /// runs cannot overlap.
    sync_op: Mutex<()>,
}

impl Registry {
    pub fn new(
        repository: Arc<GpkgRepository>,
        store: Arc<dyn ObjectStore>,
        cache_dir: PathBuf,
        download_timeout: Duration,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            repository,
            store,
            cache_dir,
            download_timeout,
            sync_op: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> Arc<GpkgRepository> {
        self.repository.clone()
    }

    /// Open a package file and publish it as `Ready`.
    ///
    /// A repeat load of an already-published identifier is idempotent and
    /// returns the existing entry. Per-layer index failures are logged and
    /// do not abort the load.
    pub async fn load_package(&self, path: &Path) -> Result<Package> {
        let id = package_id_from_path(path);
        if id.is_empty() {
            return Err(LocusError::ConfigInvalid {
                key: "package path".to_string(),
                reason: format!("no identifier derivable from '{}'", path.display()),
            });
        }

        let repository = self.repository.clone();
        let open_path = path.to_path_buf();
        let opened = tokio::task::spawn_blocking(move || repository.open(&open_path))
            .await
            .map_err(|e| LocusError::Database(format!("open task failed: {e}")))?;

        let package = match opened {
            Ok(package) => package,
            Err(e) => {
                let mut entries = self.entries.write().await;
                if let Some(entry) = entries.get_mut(&id) {
                    entry.status = PackageStatus::Error(e.to_string());
                }
                return Err(e);
            }
        };

        // Check-insert under the write lock: at most one entry per id. A
        // concurrent load of the same identifier yields to whichever call
        // inserted first.
        {
            let mut entries = self.entries.write().await;
            match entries.get(&id) {
                Some(existing) if !matches!(existing.status, PackageStatus::Error(_)) => {
                    return Ok(existing.package.clone());
                }
                _ => {}
            }
            entries.insert(
                id.clone(),
                PackageEntry {
                    package: package.clone(),
                    status: PackageStatus::Indexing,
                },
            );
        }

        for layer in &package.layers {
            let repository = self.repository.clone();
            let index_id = id.clone();
            let layer_name = layer.name.clone();
            let indexed = tokio::task::spawn_blocking(move || {
                repository.create_spatial_index(&index_id, &layer_name)
            })
            .await;

            match indexed {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(
                        package_id = %id,
                        layer = %layer.name,
                        error = %e,
                        "spatial index creation failed, layer will fall back to full scans"
                    );
                }
                Err(e) => {
                    tracing::warn!(package_id = %id, layer = %layer.name, error = %e, "index task failed");
                }
            }
        }

        // Publish the post-index snapshot atomically.
        let mut ready = self.repository.package(&id).unwrap_or(package);
        ready.indexed = true;
        ready.loaded_at = Utc::now();

        let mut entries = self.entries.write().await;
        entries.insert(
            id.clone(),
            PackageEntry {
                package: ready.clone(),
                status: PackageStatus::Ready,
            },
        );
        let (total, ready_count) = counts(&entries);
        tracing::info!(
            package_id = %id,
            layers = ready.layers.len(),
            packages_loaded = total,
            packages_ready = ready_count,
            "package ready"
        );

        Ok(ready)
    }

    /// Close and remove a package. Unknown identifiers are a no-op success.
    pub async fn unload_package(&self, id: &str) -> Result<()> {
        {
            let mut entries = self.entries.write().await;
            match entries.get_mut(id) {
                Some(entry) => entry.status = PackageStatus::Unloading,
                None => return Ok(()),
            }
        }

        let repository = self.repository.clone();
        let close_id = id.to_string();
        tokio::task::spawn_blocking(move || repository.close(&close_id))
            .await
            .map_err(|e| LocusError::Database(format!("close task failed: {e}")))??;

        self.entries.write().await.remove(id);
        tracing::info!(package_id = %id, "package unloaded");
        Ok(())
    }

    /// Download and load every listed object. One key's failure never
    /// aborts the batch; returns how many packages loaded.
    pub async fn load_all(&self) -> Result<usize> {
        let _op = self.sync_op.lock().await;

        let objects = self.store.list().await?;
        let mut loaded = 0;
        for object in objects {
            match self.fetch_and_load(&object.key).await {
                Ok(_) => loaded += 1,
                Err(e) => {
                    tracing::error!(key = %object.key, error = %e, "failed to load package");
                }
            }
        }
        Ok(loaded)
    }

    /// Reconcile the registry against the remote listing: load identifiers
    /// that appeared, unload identifiers that disappeared and delete their
    /// cache files.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let _op = self.sync_op.lock().await;

        let objects = self.store.list().await?;
        let remote_ids: HashSet<String> = objects
            .iter()
            .map(|o| package_id_from_path(&o.key))
            .collect();

        let loaded: HashSet<String> = self.entries.read().await.keys().cloned().collect();

        let mut outcome = SyncOutcome::default();

        for object in &objects {
            let id = package_id_from_path(&object.key);
            if loaded.contains(&id) {
                continue;
            }
            match self.fetch_and_load(&object.key).await {
                Ok(_) => outcome.added += 1,
                Err(e) => {
                    tracing::error!(key = %object.key, error = %e, "sync: failed to load new package");
                }
            }
        }

        // Capture id and cache path atomically before unloading.
        let stale: Vec<(String, PathBuf)> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|(id, _)| !remote_ids.contains(*id))
                .map(|(id, entry)| (id.clone(), entry.package.path.clone()))
                .collect()
        };

        for (id, path) in stale {
            if let Err(e) = self.unload_package(&id).await {
                tracing::error!(package_id = %id, error = %e, "sync: unload failed");
                continue;
            }
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(package_id = %id, error = %e, "sync: cache file removal failed");
                }
            }
            outcome.removed += 1;
        }

        tracing::info!(
            added = outcome.added,
            removed = outcome.removed,
            "sync completed"
        );
        Ok(outcome)
    }

    async fn fetch_and_load(&self, key: &str) -> Result<Package> {
        let local = self.cache_dir.join(key);
        tokio::time::timeout(self.download_timeout, self.store.download(key, &local))
            .await
            .map_err(|_| LocusError::storage("download", key, "timed out"))??;
        self.load_package(&local).await
    }

    /// Snapshot of one entry.
    pub async fn get(&self, id: &str) -> Option<PackageEntry> {
        self.entries.read().await.get(id).cloned()
    }

    /// Snapshot of every entry, ordered by identifier.
    pub async fn list(&self) -> Vec<PackageEntry> {
        let entries = self.entries.read().await;
        let mut list: Vec<PackageEntry> = entries.values().cloned().collect();
        list.sort_by(|a, b| a.package.id.cmp(&b.package.id));
        list
    }

    /// Identifiers visible to query fan-out.
    pub async fn ready_ids(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.status.is_ready())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub async fn is_ready(&self, id: &str) -> bool {
        self.entries
            .read()
            .await
            .get(id)
            .is_some_and(|entry| entry.status.is_ready())
    }

    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn ready_count(&self) -> usize {
        counts(&*self.entries.read().await).1
    }
}

fn counts(entries: &HashMap<String, PackageEntry>) -> (usize, usize) {
    let ready = entries.values().filter(|e| e.status.is_ready()).count();
    (entries.len(), ready)
}
