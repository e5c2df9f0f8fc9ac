// cf. https://www.geopackage.org/spec140/index.html

//! SQL statements for GeoPackage introspection, indexing, and point queries.
//!
//! Identifiers are always double-quoted; layer and column names come from
//! `gpkg_contents`/`gpkg_geometry_columns` and may contain anything.

/// Feature layers with their geometry column metadata and declared extent.
pub(crate) const SQL_LIST_FEATURE_LAYERS: &str = "
SELECT c.table_name, c.description, g.column_name, g.geometry_type_name, g.srs_id,
       c.min_x, c.min_y, c.max_x, c.max_y
FROM gpkg_contents c
JOIN gpkg_geometry_columns g ON g.table_name = c.table_name
WHERE c.data_type = 'features'
ORDER BY c.table_name
";

/// Probe for a table or virtual table by name.
pub(crate) const SQL_TABLE_EXISTS: &str =
    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1";

/// Free-text metadata rows; the table is optional in the GeoPackage spec.
pub(crate) const SQL_METADATA: &str = "SELECT metadata FROM gpkg_metadata";

pub(crate) fn sql_count(table: &str) -> String {
    format!(r#"SELECT COUNT(*) FROM "{table}""#)
}

pub(crate) fn rtree_table_name(table: &str, geom_column: &str) -> String {
    format!("rtree_{table}_{geom_column}")
}

// The SpatiaLite built-in CreateSpatialIndex() wants a geometry_columns
// table that GeoPackage files do not have, so the R-tree is constructed
// directly.
pub(crate) fn rtree_create_sql(table: &str, geom_column: &str) -> String {
    format!(
        r#"CREATE VIRTUAL TABLE "{rtree}" USING rtree(id, minx, maxx, miny, maxy)"#,
        rtree = rtree_table_name(table, geom_column),
    )
}

pub(crate) fn rtree_drop_sql(table: &str, geom_column: &str) -> String {
    format!(
        r#"DROP TABLE IF EXISTS "{rtree}""#,
        rtree = rtree_table_name(table, geom_column),
    )
}

/// Populate the R-tree from every non-null geometry in the layer.
pub(crate) fn rtree_populate_sql(table: &str, geom_column: &str) -> String {
    format!(
        r#"INSERT INTO "{rtree}"
SELECT "fid",
       MbrMinX(CastAutomagic("{c}")), MbrMaxX(CastAutomagic("{c}")),
       MbrMinY(CastAutomagic("{c}")), MbrMaxY(CastAutomagic("{c}"))
FROM "{t}" WHERE "{c}" IS NOT NULL"#,
        rtree = rtree_table_name(table, geom_column),
        t = table,
        c = geom_column,
    )
}

/// Point query through the R-tree: bounding-box pre-filter on the index,
/// exact containment refinement only for polygonal layers.
pub(crate) fn point_query_rtree_sql(table: &str, geom_column: &str, polygonal: bool) -> String {
    let refine = if polygonal {
        format!(
            r#" AND ST_Contains(CastAutomagic(t."{c}"), MakePoint(?1, ?2))"#,
            c = geom_column
        )
    } else {
        String::new()
    };

    format!(
        r#"SELECT t.*, AsText(CastAutomagic(t."{c}")) AS geom_wkt
FROM "{t}" t
JOIN "{rtree}" r ON t."fid" = r.id
WHERE r.minx <= ?1 AND r.maxx >= ?1 AND r.miny <= ?2 AND r.maxy >= ?2{refine}"#,
        t = table,
        c = geom_column,
        rtree = rtree_table_name(table, geom_column),
    )
}

/// Fallback full scan for layers without an R-tree.
pub(crate) fn point_query_scan_sql(table: &str, geom_column: &str, polygonal: bool) -> String {
    let predicate = if polygonal {
        "ST_Contains"
    } else {
        "MbrContains"
    };

    format!(
        r#"SELECT t.*, AsText(CastAutomagic(t."{c}")) AS geom_wkt
FROM "{t}" t
WHERE {predicate}(CastAutomagic(t."{c}"), MakePoint(?1, ?2))"#,
        t = table,
        c = geom_column,
    )
}
