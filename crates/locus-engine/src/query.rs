//! Query fan-out service
//!
//! Translates one point query into per-layer repository calls across every
//! ready package, transforming the coordinate into each layer's SRID on the
//! way. Per-layer and per-package failures are logged and absorbed so a
//! single broken dataset never takes down the whole response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use locus_core::config::QueryConfig;
use locus_core::models::{Coordinate, Feature, License};
use locus_core::{LocusError, Result};
use locus_gpkg::{QueryOptions, SridTransformer};

use crate::registry::Registry;

/// Server-wide query knobs.
#[derive(Debug, Clone, Copy)]
pub struct QueryDefaults {
    pub default_srid: i32,
    pub max_features: usize,
    pub with_geometry: bool,
}

impl From<&QueryConfig> for QueryDefaults {
    fn from(config: &QueryConfig) -> Self {
        Self {
            default_srid: config.default_srid,
            max_features: config.max_features,
            with_geometry: config.with_geometry,
        }
    }
}

/// One point query as the transport hands it over.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub coordinate: Coordinate,

    /// Property allow-list; `None` returns everything
    pub properties: Option<Vec<String>>,

    /// Restrict the fan-out to a single package
    pub package_id: Option<String>,

    /// Wall-clock budget for the whole request
    pub timeout: Option<Duration>,
}

/// Features matched within one package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageResult {
    pub package_id: String,
    pub package_name: String,
    pub features: Vec<Feature>,
    pub feature_count: usize,
    pub query_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub coordinate: Coordinate,
    /// Insertion order of non-empty package results
    pub results: Vec<PackageResult>,
    pub total_features: usize,
    pub processing_time_ms: u64,
}

pub struct QueryService {
    registry: Arc<Registry>,
    transformer: Option<Arc<SridTransformer>>,
    defaults: QueryDefaults,
}

impl QueryService {
    /// `transformer` is optional: without one, layers in a foreign SRID are
    /// skipped with a warning instead of failing the request.
    pub fn new(
        registry: Arc<Registry>,
        transformer: Option<Arc<SridTransformer>>,
        defaults: QueryDefaults,
    ) -> Self {
        Self {
            registry,
            transformer,
            defaults,
        }
    }

    pub async fn execute(&self, request: QueryRequest) -> Result<QueryResponse> {
        let started = Instant::now();
        request.coordinate.validate()?;
        let deadline = request.timeout.map(|t| started + t);

        let candidates = match &request.package_id {
            Some(id) => {
                if !self.registry.is_ready(id).await {
                    return Err(LocusError::PackageNotFound { id: id.clone() });
                }
                vec![id.clone()]
            }
            None => self.registry.ready_ids().await,
        };

        let mut results = Vec::new();
        let mut total_features = 0usize;

        for id in candidates {
            let package_started = Instant::now();
            match self
                .query_package(&id, &request, deadline, total_features)
                .await
            {
                Ok((features, name, license)) => {
                    total_features += features.len();
                    if !features.is_empty() {
                        results.push(PackageResult {
                            package_id: id,
                            package_name: name,
                            feature_count: features.len(),
                            features,
                            query_time_ms: package_started.elapsed().as_millis() as u64,
                            license: Some(license).filter(|l| !l.is_empty()),
                        });
                    }
                }
                Err(e) => {
                    tracing::error!(package_id = %id, error = %e, "package query failed");
                }
            }

            if total_features >= self.defaults.max_features {
                break;
            }
        }

        Ok(QueryResponse {
            coordinate: request.coordinate,
            results,
            total_features,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn query_package(
        &self,
        id: &str,
        request: &QueryRequest,
        deadline: Option<Instant>,
        already_collected: usize,
    ) -> Result<(Vec<Feature>, String, License)> {
        let entry = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| LocusError::PackageNotFound { id: id.to_string() })?;

        let repository = self.registry.repository();
        let mut collected: Vec<Feature> = Vec::new();

        for layer in &entry.package.layers {
            let remaining = self
                .defaults
                .max_features
                .saturating_sub(already_collected + collected.len());
            if remaining == 0 {
                break;
            }

            let coordinate = match self
                .layer_coordinate(request.coordinate, layer.srid, id, &layer.name)
                .await
            {
                Some(coordinate) => coordinate,
                None => continue,
            };

            let opts = QueryOptions {
                deadline,
                limit: Some(remaining),
                with_geometry: self.defaults.with_geometry,
            };
            let repo = repository.clone();
            let query_id = id.to_string();
            let layer_name = layer.name.clone();
            let features = tokio::task::spawn_blocking(move || {
                repo.query_point(&query_id, &layer_name, coordinate, &opts)
            })
            .await
            .map_err(|e| LocusError::Database(format!("query task failed: {e}")))??;

            for mut feature in features {
                if let Some(allowed) = &request.properties {
                    feature.project_properties(allowed);
                }
                collected.push(feature);
            }
        }

        Ok((collected, entry.package.name, entry.package.license))
    }

    /// Express the query coordinate in the layer's SRID, or `None` when the
    /// layer must be skipped.
    async fn layer_coordinate(
        &self,
        coordinate: Coordinate,
        layer_srid: i32,
        package_id: &str,
        layer_name: &str,
    ) -> Option<Coordinate> {
        if coordinate.srid == layer_srid {
            return Some(coordinate);
        }

        let Some(transformer) = &self.transformer else {
            tracing::warn!(
                package_id,
                layer = layer_name,
                layer_srid,
                "no transformer available, skipping layer in foreign SRID"
            );
            return None;
        };

        let transformer = transformer.clone();
        let transformed =
            tokio::task::spawn_blocking(move || transformer.transform(coordinate, layer_srid))
                .await;

        match transformed {
            Ok(Ok(coordinate)) => Some(coordinate),
            Ok(Err(e)) => {
                tracing::warn!(
                    package_id,
                    layer = layer_name,
                    layer_srid,
                    error = %e,
                    "coordinate transformation failed, skipping layer"
                );
                None
            }
            Err(e) => {
                tracing::warn!(package_id, layer = layer_name, error = %e, "transform task failed");
                None
            }
        }
    }
}
