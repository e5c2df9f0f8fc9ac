//! Integration tests for the GeoPackage repository against generated
//! fixture files.

mod common;

use locus_core::models::{Coordinate, GeometryType};
use locus_gpkg::{GpkgRepository, QueryOptions};
use tempfile::TempDir;

#[test]
fn close_of_an_unknown_identifier_is_a_noop() {
    let repo = GpkgRepository::new();
    assert!(repo.close("never-opened").is_ok());
}

#[test]
fn open_of_a_missing_file_fails() {
    let repo = GpkgRepository::new();
    let dir = TempDir::new().unwrap();
    assert!(repo.open(&dir.path().join("absent.gpkg")).is_err());
}

#[test]
fn open_introspects_layers() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    let package = repo.open(&path).unwrap();

    assert_eq!(package.id, "districts");
    assert_eq!(package.layers.len(), 1);

    let layer = &package.layers[0];
    assert_eq!(layer.name, "districts");
    assert_eq!(layer.geometry_column, "geom");
    assert_eq!(layer.geometry_type, GeometryType::Polygon);
    assert_eq!(layer.srid, 4326);
    assert_eq!(layer.feature_count, 1);
    assert!(!layer.has_index);

    let extent = layer.extent.expect("declared extent");
    assert_eq!(extent.min_x, 13.0);
    assert_eq!(extent.max_y, 52.7);
}

#[test]
fn reopening_an_open_package_returns_the_existing_snapshot() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    let first = repo.open(&path).unwrap();
    let second = repo.open(&path).unwrap();

    assert_eq!(first.loaded_at, second.loaded_at);
    assert_eq!(repo.ids(), vec!["districts".to_string()]);
}

#[test]
fn spatial_index_creation_is_idempotent() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    repo.open(&path).unwrap();

    assert!(!repo.has_spatial_index("districts", "districts").unwrap());
    repo.create_spatial_index("districts", "districts").unwrap();
    assert!(repo.has_spatial_index("districts", "districts").unwrap());

    // the second call must succeed and leave the same observable state
    repo.create_spatial_index("districts", "districts").unwrap();
    assert!(repo.has_spatial_index("districts", "districts").unwrap());

    // the index persists inside the file, so a fresh open sees it
    repo.close("districts").unwrap();
    let reopened = repo.open(&path).unwrap();
    assert!(reopened.layers[0].has_index);
}

#[test]
fn point_query_hits_inside_and_misses_outside() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    repo.open(&path).unwrap();

    // full-scan path first, before any index exists
    let inside = Coordinate::lonlat(13.405, 52.52);
    let outside = Coordinate::lonlat(0.0, 0.0);
    let opts = QueryOptions::default();

    let hits = repo.query_point("districts", "districts", inside, &opts).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].properties["name"], "Mitte");
    assert_eq!(hits[0].properties["population"], 384172);

    let misses = repo.query_point("districts", "districts", outside, &opts).unwrap();
    assert!(misses.is_empty());

    // same answers through the R-tree path
    repo.create_spatial_index("districts", "districts").unwrap();

    let hits = repo.query_point("districts", "districts", inside, &opts).unwrap();
    assert_eq!(hits.len(), 1);
    let misses = repo.query_point("districts", "districts", outside, &opts).unwrap();
    assert!(misses.is_empty());
}

#[test]
fn geometry_is_attached_only_when_requested() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    repo.open(&path).unwrap();

    let inside = Coordinate::lonlat(13.405, 52.52);

    let bare = repo
        .query_point("districts", "districts", inside, &QueryOptions::default())
        .unwrap();
    assert!(bare[0].geometry.is_none());

    let with_geometry = repo
        .query_point(
            "districts",
            "districts",
            inside,
            &QueryOptions {
                with_geometry: true,
                ..Default::default()
            },
        )
        .unwrap();
    let geometry = with_geometry[0].geometry.as_ref().expect("wkt geometry");
    assert_eq!(geometry.geometry_type, "POLYGON");
    assert!(geometry.wkt.starts_with("POLYGON"));
}

#[test]
fn row_limit_truncates_the_scan() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    repo.open(&path).unwrap();

    let inside = Coordinate::lonlat(13.405, 52.52);
    let capped = repo
        .query_point(
            "districts",
            "districts",
            inside,
            &QueryOptions {
                limit: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(capped.is_empty());
}

#[test]
fn unknown_layer_is_a_lookup_error() {
    require_spatialite!();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("districts.gpkg");
    common::write_district_gpkg(&path);

    let repo = GpkgRepository::new();
    repo.open(&path).unwrap();

    let coord = Coordinate::lonlat(13.405, 52.52);
    let result = repo.query_point("districts", "nope", coord, &QueryOptions::default());
    assert!(result.is_err());
}
