//! Coordinate value object

use serde::{Deserialize, Serialize};

use crate::error::{LocusError, Result};

/// SRID of WGS 84 lon/lat, the service-wide default.
pub const WGS84: i32 = 4326;

/// A coordinate in a named spatial reference system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,

    pub y: f64,

    /// Optional elevation; carried through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,

    /// EPSG code of the reference system the x/y values are expressed in
    pub srid: i32,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, srid: i32) -> Self {
        Self {
            x,
            y,
            z: None,
            srid,
        }
    }

    /// Lon/lat shorthand for WGS 84 coordinates
    pub fn lonlat(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, WGS84)
    }

    /// Validate the coordinate against its reference system.
    ///
    /// WGS 84 coordinates must fall inside lon [-180, 180] and lat [-90, 90].
    /// Other SRIDs carry no range check.
    pub fn validate(&self) -> Result<()> {
        if self.srid != WGS84 {
            return Ok(());
        }

        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(self.invalid("coordinate values must be finite"));
        }

        if self.x < -180.0 || self.x > 180.0 {
            return Err(self.invalid("longitude outside [-180, 180]"));
        }

        if self.y < -90.0 || self.y > 90.0 {
            return Err(self.invalid("latitude outside [-90, 90]"));
        }

        Ok(())
    }

    fn invalid(&self, reason: &str) -> LocusError {
        LocusError::InvalidCoordinate {
            x: self.x,
            y: self.y,
            srid: self.srid,
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wgs84_bounds_are_enforced() {
        assert!(Coordinate::lonlat(13.405, 52.52).validate().is_ok());
        assert!(Coordinate::lonlat(-180.0, -90.0).validate().is_ok());
        assert!(Coordinate::lonlat(180.0, 90.0).validate().is_ok());

        assert!(Coordinate::lonlat(180.1, 0.0).validate().is_err());
        assert!(Coordinate::lonlat(0.0, 91.0).validate().is_err());
        assert!(Coordinate::lonlat(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn other_srids_skip_the_range_check() {
        let web_mercator = Coordinate::new(1_489_199.0, 6_894_008.0, 3857);
        assert!(web_mercator.validate().is_ok());
    }
}
