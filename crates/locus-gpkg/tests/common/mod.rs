//! Test fixtures: minimal GeoPackage files written with plain rusqlite.
#![allow(dead_code)]

use std::path::Path;

use rusqlite::Connection;

/// Closed ring for the Berlin-ish test district used across the suite.
pub const DISTRICT_RING: &[(f64, f64)] = &[
    (13.0, 52.3),
    (13.8, 52.3),
    (13.8, 52.7),
    (13.0, 52.7),
    (13.0, 52.3),
];

/// Encode a polygon as a GeoPackage geometry blob: the 8-byte GPB header
/// (magic, version, little-endian flags, SRID) followed by little-endian WKB.
pub fn gpkg_polygon_blob(srid: i32, ring: &[(f64, f64)]) -> Vec<u8> {
    let mut blob = vec![0x47u8, 0x50, 0x00, 0x01];
    blob.extend_from_slice(&srid.to_le_bytes());

    // WKB polygon, one ring
    blob.push(0x01);
    blob.extend_from_slice(&3u32.to_le_bytes());
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&(ring.len() as u32).to_le_bytes());
    for (x, y) in ring {
        blob.extend_from_slice(&x.to_le_bytes());
        blob.extend_from_slice(&y.to_le_bytes());
    }

    blob
}

/// Write a GeoPackage with one polygon layer `districts` in SRID 4326
/// containing a single feature (`name = "Mitte"`, `population = 384172`).
pub fn write_district_gpkg(path: &Path) {
    let conn = Connection::open(path).expect("create fixture database");

    conn.execute_batch(
        "
CREATE TABLE gpkg_contents (
  table_name TEXT NOT NULL PRIMARY KEY,
  data_type TEXT NOT NULL,
  identifier TEXT UNIQUE,
  description TEXT DEFAULT '',
  last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
  min_x DOUBLE,
  min_y DOUBLE,
  max_x DOUBLE,
  max_y DOUBLE,
  srs_id INTEGER
);
CREATE TABLE gpkg_geometry_columns (
  table_name TEXT NOT NULL,
  column_name TEXT NOT NULL,
  geometry_type_name TEXT NOT NULL,
  srs_id INTEGER NOT NULL,
  z TINYINT NOT NULL,
  m TINYINT NOT NULL,
  CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name)
);
CREATE TABLE districts (
  fid INTEGER PRIMARY KEY AUTOINCREMENT,
  geom BLOB,
  name TEXT,
  population INTEGER
);
",
    )
    .expect("create fixture schema");

    conn.execute(
        "INSERT INTO gpkg_contents
           (table_name, data_type, identifier, description, min_x, min_y, max_x, max_y, srs_id)
         VALUES ('districts', 'features', 'districts', 'administrative districts',
                 13.0, 52.3, 13.8, 52.7, 4326)",
        [],
    )
    .expect("insert gpkg_contents row");

    conn.execute(
        "INSERT INTO gpkg_geometry_columns
           (table_name, column_name, geometry_type_name, srs_id, z, m)
         VALUES ('districts', 'geom', 'POLYGON', 4326, 0, 0)",
        [],
    )
    .expect("insert gpkg_geometry_columns row");

    conn.execute(
        "INSERT INTO districts (geom, name, population) VALUES (?1, 'Mitte', 384172)",
        [gpkg_polygon_blob(4326, DISTRICT_RING)],
    )
    .expect("insert district feature");
}

/// Skip helper for tests that need the real SpatiaLite extension.
#[macro_export]
macro_rules! require_spatialite {
    () => {
        if !locus_gpkg::spatialite::available() {
            eprintln!("skipping: mod_spatialite is not installed on this host");
            return;
        }
    };
}
