//! Scheduler cooldown and status surface tests. These run against an empty
//! local backend, so no SpatiaLite is needed.

mod common;

use std::sync::Arc;
use std::time::Duration;

use locus_core::config::SyncConfig;
use locus_core::LocusError;
use locus_engine::{Registry, SyncScheduler};
use locus_gpkg::GpkgRepository;
use locus_store::local::LocalStore;
use tempfile::TempDir;

fn empty_registry(store_dir: &TempDir, cache_dir: &TempDir) -> Arc<Registry> {
    Arc::new(Registry::new(
        Arc::new(GpkgRepository::new()),
        Arc::new(LocalStore::new(store_dir.path().to_path_buf())),
        cache_dir.path().to_path_buf(),
        Duration::from_secs(300),
    ))
}

#[tokio::test]
async fn first_trigger_passes_and_the_second_is_rate_limited() {
    let store_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let registry = empty_registry(&store_dir, &cache_dir);

    let scheduler = SyncScheduler::new(
        registry,
        &SyncConfig {
            enabled: false,
            interval_secs: 300,
            cooldown_secs: 30,
        },
    );

    let outcome = scheduler.trigger().await.unwrap();
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.removed, 0);

    match scheduler.trigger().await {
        Err(LocusError::RateLimited { retry_after_secs }) => {
            assert_eq!(retry_after_secs, 30);
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn triggers_pass_again_after_the_cooldown() {
    let store_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let registry = empty_registry(&store_dir, &cache_dir);

    let scheduler = SyncScheduler::new(
        registry,
        &SyncConfig {
            enabled: false,
            interval_secs: 300,
            cooldown_secs: 0,
        },
    );

    assert!(scheduler.trigger().await.is_ok());
    assert!(scheduler.trigger().await.is_ok());
}

#[tokio::test]
async fn status_reflects_the_last_run() {
    let store_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let registry = empty_registry(&store_dir, &cache_dir);

    let scheduler = SyncScheduler::new(registry, &SyncConfig::default());

    let before = scheduler.status().await;
    assert!(before.last_synced_at.is_none());
    assert!(before.last_result.is_none());

    scheduler.trigger().await.unwrap();

    let after = scheduler.status().await;
    assert!(after.last_synced_at.is_some());
    let result = after.last_result.expect("recorded outcome");
    assert_eq!(result.added, 0);
    assert_eq!(result.removed, 0);
}
