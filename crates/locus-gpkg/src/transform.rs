//! SRID transformation
//!
//! Conversion runs through an in-memory SpatiaLite database whose EPSG
//! dictionary is initialized once at startup with `InitSpatialMetaDataFull`,
//! so the dataset files themselves need no SRS table. The single connection
//! sits behind a mutex; SQLite statements are not reentrant.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use locus_core::models::Coordinate;
use locus_core::{LocusError, Result};

use crate::spatialite;

pub struct SridTransformer {
    conn: Mutex<Connection>,
}

impl SridTransformer {
    /// Acquire the reference database. Expensive; call once at startup and
    /// share the transformer.
    pub fn new() -> Result<Self> {
        let conn = spatialite::open_reference_db()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Convert `coord` into `target_srid`. Identity when the SRIDs already
    /// match.
    pub fn transform(&self, coord: Coordinate, target_srid: i32) -> Result<Coordinate> {
        if coord.srid == target_srid {
            return Ok(coord);
        }

        let conn = self.lock();
        let result = conn.query_row(
            "SELECT ST_X(p), ST_Y(p) FROM (SELECT ST_Transform(MakePoint(?1, ?2, ?3), ?4) AS p)",
            rusqlite::params![coord.x, coord.y, coord.srid, target_srid],
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                ))
            },
        );

        match result {
            Ok((Some(x), Some(y))) => Ok(Coordinate {
                x,
                y,
                z: coord.z,
                srid: target_srid,
            }),
            // SpatiaLite answers NULL when either SRID is unknown to it.
            Ok(_) => Err(LocusError::UnsupportedSrid {
                from: coord.srid,
                to: target_srid,
            }),
            Err(e) => Err(LocusError::TransformFailed {
                from: coord.srid,
                to: target_srid,
                reason: e.to_string(),
            }),
        }
    }

    /// Whether both codes exist in the reference-system table.
    pub fn is_supported(&self, source_srid: i32, target_srid: i32) -> bool {
        let conn = self.lock();
        let present = |srid: i32| {
            conn.query_row(
                "SELECT COUNT(*) FROM spatial_ref_sys WHERE srid = ?1",
                [srid],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .unwrap_or(false)
        };
        present(source_srid) && present(target_srid)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
