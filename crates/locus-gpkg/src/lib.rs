//! Locus GPKG - GeoPackage repository and SRID transformation
//!
//! Opens GeoPackage files through rusqlite with the SpatiaLite loadable
//! extension, introspects their feature layers, maintains the per-layer
//! R-tree indexes, and executes bounded-time point queries. Also hosts the
//! coordinate transformer backed by an in-memory SpatiaLite EPSG dictionary.

pub mod repository;
pub mod spatialite;
pub mod sql;
pub mod transform;

pub use repository::{GpkgRepository, QueryOptions};
pub use transform::SridTransformer;
