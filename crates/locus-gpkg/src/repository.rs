//! GeoPackage repository
//!
//! Owns one database handle per open package, keyed by package identifier.
//! The handle map sits behind a reader-writer lock so query-time lookups do
//! not serialize; each connection sits behind its own mutex because SQLite
//! statements are not reentrant. All methods are blocking; async callers run
//! them under `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use chrono::Utc;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};

use locus_core::models::{
    package_id_from_path, Coordinate, Extent, Feature, FeatureGeometry, GeometryType, Layer,
    License, Package,
};
use locus_core::{LocusError, Result};

use crate::spatialite;
use crate::sql;

/// Per-query knobs threaded down from the query service.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Wall-clock deadline; checked before dispatch and at each row.
    pub deadline: Option<Instant>,

    /// Stop scanning once this many features have been collected.
    pub limit: Option<usize>,

    /// Attach the WKT geometry to each returned feature.
    pub with_geometry: bool,
}

struct HandleInner {
    conn: Connection,
    package: Package,
}

/// Thread-safe map of open package handles.
pub struct GpkgRepository {
    handles: RwLock<HashMap<String, Arc<Mutex<HandleInner>>>>,
}

impl Default for GpkgRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl GpkgRepository {
    pub fn new() -> Self {
        Self {
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Open a GeoPackage, load SpatiaLite, and introspect its layers.
    ///
    /// Re-opening an identifier that is already open returns the existing
    /// snapshot instead of a second handle.
    pub fn open(&self, path: &Path) -> Result<Package> {
        let id = package_id_from_path(path);

        if let Some(existing) = self.package(&id) {
            return Ok(existing);
        }

        let size_bytes = std::fs::metadata(path)?.len();

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LocusError::Database(format!("open {}: {e}", path.display())))?;

        let version = spatialite::load(&conn)?;
        tracing::debug!(package_id = %id, spatialite = %version, "opened GeoPackage");

        let layers = introspect_layers(&conn)?;
        let metadata = read_metadata(&conn);

        let package = Package {
            id: id.clone(),
            name: id.clone(),
            path: path.to_path_buf(),
            size_bytes,
            layers,
            metadata,
            license: License::empty(),
            indexed: false,
            loaded_at: Utc::now(),
        };

        let mut handles = write_guard(&self.handles);
        if let Some(existing) = handles.get(&id) {
            // Lost the race to a concurrent open; keep the first handle.
            return Ok(lock_guard(existing).package.clone());
        }
        handles.insert(
            id,
            Arc::new(Mutex::new(HandleInner {
                conn,
                package: package.clone(),
            })),
        );

        Ok(package)
    }

    /// Snapshot of an open package.
    pub fn package(&self, id: &str) -> Option<Package> {
        let handles = read_guard(&self.handles);
        handles.get(id).map(|h| lock_guard(h).package.clone())
    }

    /// Identifiers of every open package.
    pub fn ids(&self) -> Vec<String> {
        read_guard(&self.handles).keys().cloned().collect()
    }

    /// Whether the layer's GeoPackage R-tree exists.
    pub fn has_spatial_index(&self, id: &str, layer_name: &str) -> Result<bool> {
        let handle = self.handle(id)?;
        let inner = lock_guard(&handle);
        let layer = find_layer(&inner.package, layer_name)?;
        table_exists(&inner.conn, &layer.rtree_name())
    }

    /// Create and populate the layer's R-tree. Idempotent: an existing
    /// index is success. A populate failure drops the empty R-tree again.
    pub fn create_spatial_index(&self, id: &str, layer_name: &str) -> Result<()> {
        let handle = self.handle(id)?;
        let mut inner = lock_guard(&handle);
        let layer = find_layer(&inner.package, layer_name)?;
        let table = layer.name.clone();
        let geom_column = layer.geometry_column.clone();
        let rtree = layer.rtree_name();

        if table_exists(&inner.conn, &rtree)? {
            mark_indexed(&mut inner.package, layer_name);
            return Ok(());
        }

        inner
            .conn
            .execute_batch(&sql::rtree_create_sql(&table, &geom_column))
            .map_err(|e| index_error(id, layer_name, format!("create rtree: {e}")))?;

        match inner
            .conn
            .execute(&sql::rtree_populate_sql(&table, &geom_column), [])
        {
            Ok(rows) => {
                tracing::debug!(
                    package_id = %id,
                    layer = %layer_name,
                    rows,
                    "spatial index populated"
                );
            }
            Err(e) => {
                if let Err(drop_err) = inner
                    .conn
                    .execute_batch(&sql::rtree_drop_sql(&table, &geom_column))
                {
                    tracing::warn!(
                        package_id = %id,
                        layer = %layer_name,
                        error = %drop_err,
                        "failed to drop partially built rtree"
                    );
                }
                return Err(index_error(id, layer_name, format!("populate rtree: {e}")));
            }
        }

        mark_indexed(&mut inner.package, layer_name);
        Ok(())
    }

    /// Point-in-polygon query against one layer. The coordinate must
    /// already be expressed in the layer's SRID.
    pub fn query_point(
        &self,
        id: &str,
        layer_name: &str,
        coord: Coordinate,
        opts: &QueryOptions,
    ) -> Result<Vec<Feature>> {
        let handle = self.handle(id)?;
        let inner = lock_guard(&handle);
        let layer = find_layer(&inner.package, layer_name)?;

        if deadline_passed(opts) {
            return Err(query_error(id, layer_name, "deadline exceeded before dispatch"));
        }

        let polygonal = layer.geometry_type.is_polygonal();
        let has_rtree = table_exists(&inner.conn, &layer.rtree_name())?;
        let sql = if has_rtree {
            sql::point_query_rtree_sql(&layer.name, &layer.geometry_column, polygonal)
        } else {
            sql::point_query_scan_sql(&layer.name, &layer.geometry_column, polygonal)
        };

        let mut stmt = inner
            .conn
            .prepare(&sql)
            .map_err(|e| query_error(id, layer_name, format!("prepare: {e}")))?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|n| n.to_string()).collect();

        let mut rows = stmt
            .query(rusqlite::params![coord.x, coord.y])
            .map_err(|e| query_error(id, layer_name, format!("query: {e}")))?;

        let mut features = Vec::new();
        loop {
            if opts.limit.is_some_and(|limit| features.len() >= limit) {
                break;
            }
            if deadline_passed(opts) {
                tracing::warn!(
                    package_id = %id,
                    layer = %layer_name,
                    collected = features.len(),
                    "deadline exceeded during row scan, returning partial result"
                );
                break;
            }

            let row = match rows
                .next()
                .map_err(|e| query_error(id, layer_name, format!("scan: {e}")))?
            {
                Some(row) => row,
                None => break,
            };

            let mut feature_id = 0i64;
            let mut wkt: Option<String> = None;
            let mut properties = Map::new();

            for (idx, name) in column_names.iter().enumerate() {
                let value = row
                    .get_ref(idx)
                    .map_err(|e| query_error(id, layer_name, format!("column {name}: {e}")))?;

                if name == &layer.geometry_column {
                    continue;
                }
                if name == "geom_wkt" {
                    if let ValueRef::Text(text) = value {
                        wkt = Some(String::from_utf8_lossy(text).into_owned());
                    }
                    continue;
                }
                if name == "fid" {
                    if let ValueRef::Integer(i) = value {
                        feature_id = i;
                    }
                }
                if let Some(json) = json_value(value) {
                    properties.insert(name.clone(), json);
                }
            }

            features.push(Feature {
                id: feature_id,
                layer: layer.name.clone(),
                properties,
                geometry: match (opts.with_geometry, wkt) {
                    (true, Some(wkt)) => Some(FeatureGeometry::from_wkt(wkt)),
                    _ => None,
                },
            });
        }

        Ok(features)
    }

    /// Close a package handle. Closing an unknown identifier is a no-op.
    pub fn close(&self, id: &str) -> Result<()> {
        let removed = write_guard(&self.handles).remove(id);
        if removed.is_some() {
            tracing::debug!(package_id = %id, "closed GeoPackage handle");
        }
        Ok(())
    }

    fn handle(&self, id: &str) -> Result<Arc<Mutex<HandleInner>>> {
        read_guard(&self.handles)
            .get(id)
            .cloned()
            .ok_or_else(|| LocusError::PackageNotFound { id: id.to_string() })
    }
}

fn deadline_passed(opts: &QueryOptions) -> bool {
    opts.deadline.is_some_and(|d| Instant::now() >= d)
}

fn find_layer(package: &Package, layer_name: &str) -> Result<Layer> {
    package
        .layers
        .iter()
        .find(|l| l.name == layer_name)
        .cloned()
        .ok_or_else(|| LocusError::LayerNotFound {
            package: package.id.clone(),
            layer: layer_name.to_string(),
        })
}

fn mark_indexed(package: &mut Package, layer_name: &str) {
    if let Some(layer) = package.layers.iter_mut().find(|l| l.name == layer_name) {
        layer.has_index = true;
    }
}

fn index_error(package: &str, layer: &str, reason: String) -> LocusError {
    LocusError::Index {
        package: package.to_string(),
        layer: layer.to_string(),
        reason,
    }
}

fn query_error(package: &str, layer: &str, reason: impl Into<String>) -> LocusError {
    LocusError::Query {
        package: package.to_string(),
        layer: layer.to_string(),
        reason: reason.into(),
    }
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    conn.query_row(sql::SQL_TABLE_EXISTS, [name], |row| row.get::<_, i64>(0))
        .map(|count| count > 0)
        .map_err(|e| LocusError::Database(format!("probe table {name}: {e}")))
}

fn introspect_layers(conn: &Connection) -> Result<Vec<Layer>> {
    let mut stmt = conn
        .prepare(sql::SQL_LIST_FEATURE_LAYERS)
        .map_err(|e| LocusError::Database(format!("introspect layers: {e}")))?;

    let raw: Vec<(String, Option<String>, String, String, i32, [Option<f64>; 4])> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
            ))
        })
        .map_err(|e| LocusError::Database(format!("introspect layers: {e}")))?
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| LocusError::Database(format!("introspect layers: {e}")))?;

    let mut layers = Vec::with_capacity(raw.len());
    for (name, description, geometry_column, type_name, srid, bounds) in raw {
        // Counting is best-effort; a broken table still lists.
        let feature_count = conn
            .query_row(&sql::sql_count(&name), [], |row| row.get::<_, i64>(0))
            .unwrap_or_else(|e| {
                tracing::debug!(layer = %name, error = %e, "feature count failed");
                0
            })
            .max(0) as u64;

        let extent = match bounds {
            [Some(min_x), Some(min_y), Some(max_x), Some(max_y)] => {
                Extent::from_bounds(min_x, min_y, max_x, max_y)
            }
            _ => None,
        };

        let mut layer = Layer {
            name,
            description: description.filter(|d| !d.is_empty()),
            geometry_column,
            geometry_type: GeometryType::parse(&type_name),
            srid,
            has_index: false,
            feature_count,
            extent,
        };
        layer.has_index = table_exists(conn, &layer.rtree_name())?;
        layers.push(layer);
    }

    Ok(layers)
}

/// Free-text metadata; the table is optional and absence is a non-error.
fn read_metadata(conn: &Connection) -> Option<String> {
    let mut stmt = conn.prepare(sql::SQL_METADATA).ok()?;
    let rows: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .ok()?
        .filter_map(|r| r.ok())
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(rows.join("\n"))
    }
}

/// The driver already hands back the concrete JSON-able kinds; blobs are
/// other geometry columns and stay out of the property bag.
fn json_value(value: ValueRef<'_>) -> Option<Value> {
    match value {
        ValueRef::Null => Some(Value::Null),
        ValueRef::Integer(i) => Some(Value::from(i)),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map(Value::Number),
        ValueRef::Text(text) => Some(Value::from(String::from_utf8_lossy(text).into_owned())),
        ValueRef::Blob(_) => None,
    }
}

fn read_guard<'a, T>(lock: &'a RwLock<T>) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_guard<'a, T>(lock: &'a RwLock<T>) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock_guard<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
