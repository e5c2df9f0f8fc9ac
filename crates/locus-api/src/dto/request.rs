use serde::Deserialize;

use locus_core::models::Coordinate;

use crate::error::ApiError;

/// Query string of `GET /api/v1/query`.
///
/// Either `lon`+`lat` (WGS 84 shorthand) or `x`+`y` with an optional `srid`
/// must be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    pub lon: Option<f64>,
    pub lat: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub srid: Option<i32>,
    /// Comma-separated property allow-list
    pub properties: Option<String>,
}

impl QueryParams {
    /// Resolve the coordinate, or explain which parameters are missing.
    pub fn coordinate(&self, default_srid: i32) -> Result<Coordinate, ApiError> {
        let (x, y) = match (self.lon, self.lat, self.x, self.y) {
            (Some(lon), Some(lat), _, _) => (lon, lat),
            (_, _, Some(x), Some(y)) => (x, y),
            _ => {
                return Err(ApiError::bad_request(
                    "either lon+lat or x+y query parameters are required",
                ))
            }
        };

        Ok(Coordinate::new(x, y, self.srid.unwrap_or(default_srid)))
    }

    pub fn property_list(&self) -> Option<Vec<String>> {
        let raw = self.properties.as_deref()?;
        let list: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        if list.is_empty() {
            None
        } else {
            Some(list)
        }
    }
}
