//! Filesystem watcher
//!
//! Watches configured directories for `.gpkg` changes and reconciles the
//! registry after a debounce window. Events land in a pending map keyed by
//! path; a 100 ms ticker flushes entries once they have been quiet for the
//! debounce window. The latest event per path wins, so a create arriving
//! after a pending delete results in a load, which covers quick
//! delete-and-recreate sequences.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use locus_core::models::package_id_from_path;
use locus_core::Result;

use crate::registry::Registry;

/// Flush ticker period; fine-grained relative to the debounce window.
const FLUSH_TICK: Duration = Duration::from_millis(100);

/// Delay before the single retry of a failed load, for files still being
/// written when the first open happens.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// What a flushed pending event asks the registry to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    /// Create or modify: (re)load the package
    Upsert,
    /// Delete: unload the package
    Remove,
}

/// Pending-events map with debounce semantics. Pure state machine, driven
/// by the watcher task.
#[derive(Debug, Default)]
pub struct DebounceBuffer {
    pending: HashMap<PathBuf, (PendingKind, Instant)>,
}

impl DebounceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; later events for the same path replace
    /// earlier ones and restart its debounce clock.
    pub fn record(&mut self, path: PathBuf, kind: PendingKind, now: Instant) {
        self.pending.insert(path, (kind, now));
    }

    /// Drain every entry that has been quiet for at least `window`.
    pub fn flush(&mut self, now: Instant, window: Duration) -> Vec<(PathBuf, PendingKind)> {
        let due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, at))| now.duration_since(*at) >= window)
            .map(|(path, _)| path.clone())
            .collect();

        due.into_iter()
            .filter_map(|path| {
                self.pending
                    .remove(&path)
                    .map(|(kind, _)| (path, kind))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Keeps the notify watcher and its driver task alive.
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    pub task: JoinHandle<()>,
}

pub struct Watcher {
    registry: Arc<Registry>,
    directories: Vec<PathBuf>,
    debounce: Duration,
}

impl Watcher {
    pub fn new(registry: Arc<Registry>, directories: Vec<PathBuf>, debounce: Duration) -> Self {
        Self {
            registry,
            directories,
            debounce,
        }
    }

    /// Subscribe to the directories and start the flush loop. The returned
    /// handle must be kept alive for events to keep flowing.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> Result<WatcherHandle> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })
        .map_err(|e| locus_core::LocusError::ConfigInvalid {
            key: "watcher".to_string(),
            reason: format!("failed to create filesystem watcher: {e}"),
        })?;

        for dir in &self.directories {
            if let Err(e) = watcher.watch(dir, RecursiveMode::Recursive) {
                tracing::warn!(directory = %dir.display(), error = %e, "cannot watch directory");
            } else {
                tracing::info!(directory = %dir.display(), "watching for package changes");
            }
        }

        let registry = self.registry;
        let debounce = self.debounce;

        let task = tokio::spawn(async move {
            let mut buffer = DebounceBuffer::new();
            let mut ticker = tokio::time::interval(FLUSH_TICK);

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        tracing::debug!("watcher shutting down");
                        break;
                    }
                    event = rx.recv() => {
                        match event {
                            Some(Ok(event)) => record_event(&mut buffer, event),
                            Some(Err(e)) => tracing::warn!(error = %e, "watch error"),
                            None => break,
                        }
                    }
                    _ = ticker.tick() => {
                        for (path, kind) in buffer.flush(Instant::now(), debounce) {
                            apply(&registry, &path, kind).await;
                        }
                    }
                }
            }
        });

        Ok(WatcherHandle {
            _watcher: watcher,
            task,
        })
    }
}

fn is_gpkg_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gpkg"))
}

fn record_event(buffer: &mut DebounceBuffer, event: Event) {
    let kind = match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => PendingKind::Upsert,
        EventKind::Remove(_) => PendingKind::Remove,
        _ => return,
    };

    let now = Instant::now();
    for path in event.paths {
        if is_gpkg_path(&path) {
            buffer.record(path, kind, now);
        }
    }
}

async fn apply(registry: &Registry, path: &Path, kind: PendingKind) {
    match kind {
        PendingKind::Upsert => {
            if let Err(first) = registry.load_package(path).await {
                // The file may still have been mid-write; try once more.
                tracing::warn!(
                    path = %path.display(),
                    error = %first,
                    "load failed, retrying once"
                );
                tokio::time::sleep(RETRY_DELAY).await;
                if let Err(e) = registry.load_package(path).await {
                    tracing::error!(path = %path.display(), error = %e, "load failed after retry");
                }
            }
        }
        PendingKind::Remove => {
            let id = package_id_from_path(path);
            if let Err(e) = registry.unload_package(&id).await {
                tracing::error!(package_id = %id, error = %e, "unload failed");
            }
        }
    }
}
