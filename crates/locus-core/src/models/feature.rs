//! Feature results returned by point queries

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Geometry of a matched feature, as WKT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    /// Type tag, e.g. `POLYGON` or `MULTIPOLYGON`
    #[serde(rename = "type")]
    pub geometry_type: String,

    pub wkt: String,
}

impl FeatureGeometry {
    /// Build from a WKT string; the type tag is the substring preceding the
    /// first `(`.
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let geometry_type = wkt
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_uppercase();
        Self { geometry_type, wkt }
    }
}

/// One feature matched by a point query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Value of the canonical `fid` column
    pub id: i64,

    /// Layer the feature came from
    pub layer: String,

    /// Property bag; values are strings, integers, floats, or null as the
    /// database driver returned them
    pub properties: Map<String, Value>,

    /// Present only when geometry output is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<FeatureGeometry>,
}

impl Feature {
    /// Keep only the allow-listed property keys.
    pub fn project_properties(&mut self, allowed: &[String]) {
        let dropped: Vec<String> = self
            .properties
            .keys()
            .filter(|key| !allowed.iter().any(|a| a == *key))
            .cloned()
            .collect();
        for key in dropped {
            self.properties.remove(&key);
        }
    }
}
