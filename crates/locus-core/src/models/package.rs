//! Package models and lifecycle status

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::layer::Layer;

/// Derive the stable package identifier from a file path or object key.
///
/// The identifier is the base name with its final extension stripped:
/// `data/districts.gpkg` becomes `districts`, `a.backup.gpkg` becomes
/// `a.backup`. Total over all inputs; the empty path and a bare `.gpkg`
/// both derive the empty identifier.
pub fn package_id_from_path(path: impl AsRef<Path>) -> String {
    let name = path
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.rsplit_once('.') {
        Some((stem, _ext)) => stem.to_string(),
        None => name,
    }
}

/// License record attached to a package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    pub url: String,
    pub attribution: String,
}

impl License {
    /// A package without license metadata carries the empty record.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.url.is_empty() && self.attribution.is_empty()
    }
}

/// Lifecycle status of a registry entry.
///
/// Only `Ready` packages are visible to query fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "cause", rename_all = "snake_case")]
pub enum PackageStatus {
    Loading,
    Indexing,
    Ready,
    Error(String),
    Unloading,
}

impl PackageStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// An opened GeoPackage.
///
/// Published `Ready` entries are immutable snapshots; the registry replaces
/// the whole value on lifecycle transitions rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Stable identifier, unique per registry
    pub id: String,

    /// Display name
    pub name: String,

    /// Local file path of the opened database
    pub path: PathBuf,

    /// File size in bytes
    pub size_bytes: u64,

    /// Feature layers, in declaration order
    pub layers: Vec<Layer>,

    /// Free-text metadata from `gpkg_metadata`, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// License record; empty when the package carries none
    pub license: License,

    /// Whether every layer has been through spatial index creation
    pub indexed: bool,

    /// When the package reached the registry
    pub loaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_derivation_strips_directory_and_final_extension() {
        assert_eq!(package_id_from_path("data/districts.gpkg"), "districts");
        assert_eq!(package_id_from_path("/abs/path/zones.gpkg"), "zones");
        assert_eq!(package_id_from_path("plain"), "plain");
    }

    #[test]
    fn id_derivation_edge_cases() {
        assert_eq!(package_id_from_path(""), "");
        assert_eq!(package_id_from_path(".gpkg"), "");
        assert_eq!(package_id_from_path("a.backup.gpkg"), "a.backup");
    }

    #[test]
    fn missing_license_is_the_empty_record() {
        assert!(License::empty().is_empty());
        let license = License {
            name: "ODbL".to_string(),
            url: "https://opendatacommons.org/licenses/odbl/".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
        };
        assert!(!license.is_empty());
    }
}
