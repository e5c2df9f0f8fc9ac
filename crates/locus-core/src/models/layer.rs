//! Layer models

use serde::{Deserialize, Serialize};

/// Geometry type tag as declared in `gpkg_geometry_columns`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    /// Anything this service does not recognize; queried with bounding-box
    /// containment only
    Unknown,
}

impl GeometryType {
    /// Parse a GeoPackage geometry type name, case-insensitively.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" => Self::MultiLineString,
            "MULTIPOLYGON" => Self::MultiPolygon,
            "GEOMETRYCOLLECTION" | "GEOMETRY" => Self::GeometryCollection,
            _ => Self::Unknown,
        }
    }

    /// Polygonal layers get an exact `ST_Contains` refinement on top of the
    /// bounding-box pre-filter; everything else stops at the bounding box.
    pub fn is_polygonal(&self) -> bool {
        matches!(self, Self::Polygon | Self::MultiPolygon)
    }
}

/// Bounding box of a layer, in the layer's own SRID
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// GeoPackage writers that never computed an extent leave all four
    /// bounds at zero; treat that as "no extent".
    pub fn from_bounds(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<Self> {
        if min_x == 0.0 && min_y == 0.0 && max_x == 0.0 && max_y == 0.0 {
            return None;
        }
        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }
}

/// One feature table inside a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// SQL table name
    pub name: String,

    /// Human-readable description from `gpkg_contents`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Geometry column name
    pub geometry_column: String,

    /// Declared geometry type
    pub geometry_type: GeometryType,

    /// EPSG code of the layer's reference system
    pub srid: i32,

    /// Whether the GeoPackage R-tree for this layer exists
    pub has_index: bool,

    /// Row count at introspection time (zero when counting failed)
    pub feature_count: u64,

    /// Declared bounding box, if the package carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
}

impl Layer {
    /// Name of the GeoPackage R-tree virtual table for this layer.
    pub fn rtree_name(&self) -> String {
        format!("rtree_{}_{}", self.name, self.geometry_column)
    }
}
