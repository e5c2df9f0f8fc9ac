use chrono::{DateTime, Utc};
use serde::Serialize;

use locus_core::models::{Layer, License, PackageStatus};
use locus_engine::{PackageEntry, SyncStatus};

/// One row of `GET /api/v1/packages`.
#[derive(Debug, Clone, Serialize)]
pub struct PackageSummary {
    pub id: String,
    pub name: String,
    pub size_bytes: u64,
    pub layer_count: usize,
    pub indexed: bool,
    pub status: PackageStatus,
    pub loaded_at: DateTime<Utc>,
}

impl From<&PackageEntry> for PackageSummary {
    fn from(entry: &PackageEntry) -> Self {
        Self {
            id: entry.package.id.clone(),
            name: entry.package.name.clone(),
            size_bytes: entry.package.size_bytes,
            layer_count: entry.package.layers.len(),
            indexed: entry.package.indexed,
            status: entry.status.clone(),
            loaded_at: entry.package.loaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageListResponse {
    pub packages: Vec<PackageSummary>,
    pub count: usize,
}

/// Full entry of `GET /api/v1/packages/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct PackageDetail {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size_bytes: u64,
    pub layers: Vec<Layer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    pub indexed: bool,
    pub status: PackageStatus,
    pub loaded_at: DateTime<Utc>,
}

impl From<&PackageEntry> for PackageDetail {
    fn from(entry: &PackageEntry) -> Self {
        let package = &entry.package;
        Self {
            id: package.id.clone(),
            name: package.name.clone(),
            path: package.path.display().to_string(),
            size_bytes: package.size_bytes,
            layers: package.layers.clone(),
            metadata: package.metadata.clone(),
            license: Some(package.license.clone()).filter(|l| !l.is_empty()),
            indexed: package.indexed,
            status: entry.status.clone(),
            loaded_at: package.loaded_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayersResponse {
    pub package_id: String,
    pub layers: Vec<Layer>,
}

/// Body of `POST /api/v1/sync`.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub packages_added: usize,
    pub packages_removed: usize,
    pub packages_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthComponents {
    pub storage: ComponentHealth,
}

/// Body of the detailed `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub ready: bool,
    pub packages_loaded: usize,
    pub packages_ready: usize,
    pub components: HealthComponents,
    pub sync: SyncStatus,
}
