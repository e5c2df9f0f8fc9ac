use std::sync::Arc;

use locus_core::config::StorageKind;
use locus_engine::{QueryService, Registry, SyncScheduler};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub query_service: Arc<QueryService>,
    pub scheduler: Arc<SyncScheduler>,
    pub storage_kind: StorageKind,
    pub default_srid: i32,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        query_service: Arc<QueryService>,
        scheduler: Arc<SyncScheduler>,
        storage_kind: StorageKind,
        default_srid: i32,
    ) -> Self {
        Self {
            registry,
            query_service,
            scheduler,
            storage_kind,
            default_srid,
        }
    }
}
