//! Error types for Locus

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocusError {
    // Lookup errors
    #[error("Package not found: {id}")]
    PackageNotFound { id: String },

    #[error("Layer '{layer}' not found in package '{package}'")]
    LayerNotFound { package: String, layer: String },

    // Input errors
    #[error("Invalid coordinate ({x}, {y}) for SRID {srid}: {reason}")]
    InvalidCoordinate {
        x: f64,
        y: f64,
        srid: i32,
        reason: String,
    },

    // Transformation errors
    #[error("Unsupported SRID transformation from {from} to {to}")]
    UnsupportedSrid { from: i32, to: i32 },

    #[error("SRID transformation from {from} to {to} failed: {reason}")]
    TransformFailed {
        from: i32,
        to: i32,
        reason: String,
    },

    // Rate limiting
    #[error("Sync already triggered recently, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // Storage errors
    #[error("Storage {operation} failed for '{key}': {cause}")]
    Storage {
        operation: String,
        key: String,
        cause: String,
    },

    // Spatial index errors
    #[error("Spatial index failed for layer '{layer}' in package '{package}': {reason}")]
    Index {
        package: String,
        layer: String,
        reason: String,
    },

    // Query errors
    #[error("Query failed for layer '{layer}' in package '{package}': {reason}")]
    Query {
        package: String,
        layer: String,
        reason: String,
    },

    // SpatiaLite extension errors
    #[error("SpatiaLite unavailable: {0}")]
    Spatialite(String),

    // Database errors without a package context
    #[error("Database error: {0}")]
    Database(String),

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LocusError {
    /// Helper for wrapping backend failures with their storage context.
    pub fn storage(
        operation: impl Into<String>,
        key: impl Into<String>,
        cause: impl std::fmt::Display,
    ) -> Self {
        Self::Storage {
            operation: operation.into(),
            key: key.into(),
            cause: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LocusError>;
