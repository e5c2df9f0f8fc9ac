//! Integration tests for the SRID transformer.

mod common;

use locus_core::models::Coordinate;
use locus_gpkg::SridTransformer;

#[test]
fn identity_transformation_returns_the_input() {
    require_spatialite!();

    let transformer = SridTransformer::new().unwrap();
    let coord = Coordinate::lonlat(13.405, 52.52);
    let same = transformer.transform(coord, 4326).unwrap();
    assert_eq!(same, coord);
}

#[test]
fn wgs84_to_web_mercator_lands_in_the_expected_range() {
    require_spatialite!();

    let transformer = SridTransformer::new().unwrap();
    let berlin = Coordinate::lonlat(13.405, 52.52);
    let projected = transformer.transform(berlin, 3857).unwrap();

    assert_eq!(projected.srid, 3857);
    assert!((1_490_000.0..1_495_000.0).contains(&projected.x), "x = {}", projected.x);
    assert!((6_860_000.0..6_930_000.0).contains(&projected.y), "y = {}", projected.y);
}

#[test]
fn unknown_srids_are_unsupported() {
    require_spatialite!();

    let transformer = SridTransformer::new().unwrap();
    assert!(transformer.is_supported(4326, 3857));
    assert!(!transformer.is_supported(4326, 99_999_999));

    let bogus = Coordinate::new(1.0, 1.0, 99_999_999);
    assert!(transformer.transform(bogus, 4326).is_err());
}
