use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locus_api::router::create_router;
use locus_api::state::AppState;
use locus_core::config::{ServiceConfig, StorageKind};
use locus_engine::{QueryDefaults, QueryService, Registry, SyncScheduler, Watcher};
use locus_gpkg::{GpkgRepository, SridTransformer};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "locus_api=info,locus_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServiceConfig::resolve().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage = ?config.storage.kind,
        port = config.server.port,
        sync_enabled = config.sync.enabled,
        "Starting Locus"
    );

    let store = match locus_store::make_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to initialize the storage backend: {e}");
            tracing::error!(
                "Remediation:\n\
                1. Check storage.type and the backend credentials\n\
                2. For local storage, ensure storage.local_path exists\n\
                3. For remote storage, verify network access to the backend"
            );
            std::process::exit(1);
        }
    };

    // For local storage the served directory doubles as the cache, so
    // packages load in place instead of being copied.
    let cache_dir = match config.storage.kind {
        StorageKind::Local => config.storage.local_path.clone(),
        _ => config.storage.cache_dir.clone(),
    };

    let repository = Arc::new(GpkgRepository::new());
    let registry = Arc::new(Registry::new(
        repository,
        store,
        cache_dir,
        Duration::from_secs(config.download.timeout_secs),
    ));

    // The EPSG dictionary takes a few seconds to build; do it off the
    // runtime. Without SpatiaLite the service still starts, it just skips
    // layers whose SRID differs from the query's.
    let transformer = match tokio::task::spawn_blocking(SridTransformer::new).await {
        Ok(Ok(transformer)) => Some(Arc::new(transformer)),
        Ok(Err(e)) => {
            tracing::warn!("SRID transformation unavailable: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("SRID transformer init task failed: {e}");
            None
        }
    };

    match registry.load_all().await {
        Ok(loaded) => tracing::info!(packages = loaded, "initial load complete"),
        Err(e) => {
            // An empty registry is a valid state; keep serving and let the
            // reconcilers catch up.
            tracing::error!("Initial package load failed: {e}");
        }
    }

    let query_service = Arc::new(QueryService::new(
        registry.clone(),
        transformer,
        QueryDefaults::from(&config.query),
    ));
    let scheduler = SyncScheduler::new(registry.clone(), &config.sync);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let _sync_task = scheduler.spawn(shutdown_rx.clone());

    let _watcher_handle = if config.watcher.enabled {
        let mut directories = config.watcher.directories.clone();
        if directories.is_empty() && config.storage.kind == StorageKind::Local {
            directories.push(config.storage.local_path.clone());
        }

        if directories.is_empty() {
            None
        } else {
            let watcher = Watcher::new(
                registry.clone(),
                directories,
                Duration::from_millis(config.watcher.debounce_ms),
            );
            match watcher.spawn(shutdown_rx.clone()) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::error!("Failed to start the filesystem watcher: {e}");
                    None
                }
            }
        }
    } else {
        None
    };

    let state = AppState::new(
        registry,
        query_service,
        scheduler,
        config.storage.kind,
        config.query.default_srid,
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .unwrap();
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
