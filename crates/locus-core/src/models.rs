//! Core domain models

pub mod coordinate;
pub mod feature;
pub mod layer;
pub mod package;

pub use coordinate::Coordinate;
pub use feature::{Feature, FeatureGeometry};
pub use layer::{Extent, GeometryType, Layer};
pub use package::{package_id_from_path, License, Package, PackageStatus};
