//! Layered service configuration
//!
//! Values resolve in precedence order: defaults, then the optional TOML file,
//! then `LOCUS_*` environment variables. Unparseable environment values are
//! logged and ignored rather than failing startup.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LocusError, Result};

/// Which object store backend serves the package set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    S3,
    Azure,
    Http,
}

impl StorageKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            "azure" => Ok(Self::Azure),
            "http" => Ok(Self::Http),
            other => Err(LocusError::ConfigInvalid {
                key: "storage.type".to_string(),
                reason: format!("unknown storage type '{other}', expected local|s3|azure|http"),
            }),
        }
    }
}

/// Storage backend selection and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub kind: StorageKind,

    /// Directory served by the local backend
    pub local_path: PathBuf,

    /// Writable directory for downloaded packages (remote backends)
    pub cache_dir: PathBuf,

    pub s3: S3Config,
    pub azure: AzureConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub account: String,
    pub container: String,
    pub access_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub base_url: String,
    /// Plain-text listing of `.gpkg` keys relative to `base_url`
    pub index_file: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            index_file: "index.txt".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Local,
            local_path: PathBuf::from("./data"),
            cache_dir: PathBuf::from("./data"),
            s3: S3Config::default(),
            azure: AzureConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Remote-sync reconciliation schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    /// Minimum spacing between API-triggered syncs
    pub cooldown_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 300,
            cooldown_secs: 30,
        }
    }
}

/// Filesystem watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub enabled: bool,
    pub directories: Vec<PathBuf>,
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directories: Vec::new(),
            debounce_ms: 500,
        }
    }
}

/// Query fan-out knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_srid: i32,
    pub max_features: usize,
    pub with_geometry: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_srid: 4326,
            max_features: 1000,
            with_geometry: false,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Download limits for remote packages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub watcher: WatcherConfig,
    pub query: QueryConfig,
    pub server: ServerConfig,
    pub download: DownloadConfig,
}

impl ServiceConfig {
    /// Load configuration from a TOML file, layered over the defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| LocusError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("failed to read config file: {e}"),
        })?;

        let config: ServiceConfig =
            toml::from_str(&content).map_err(|e| LocusError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("failed to parse TOML: {e}"),
            })?;

        Ok(config)
    }

    /// Apply `LOCUS_*` environment overrides on top of the current values.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(kind) = env::var("LOCUS_STORAGE_TYPE") {
            match StorageKind::parse(&kind) {
                Ok(kind) => self.storage.kind = kind,
                Err(e) => tracing::warn!("ignoring LOCUS_STORAGE_TYPE: {e}"),
            }
        }
        if let Ok(path) = env::var("LOCUS_STORAGE_LOCAL_PATH") {
            self.storage.local_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("LOCUS_STORAGE_CACHE_DIR") {
            self.storage.cache_dir = PathBuf::from(path);
        }
        if let Ok(bucket) = env::var("LOCUS_S3_BUCKET") {
            self.storage.s3.bucket = bucket;
        }
        if let Ok(region) = env::var("LOCUS_S3_REGION") {
            self.storage.s3.region = region;
        }
        if let Ok(endpoint) = env::var("LOCUS_S3_ENDPOINT") {
            self.storage.s3.endpoint = Some(endpoint);
        }
        if let Ok(account) = env::var("LOCUS_AZURE_ACCOUNT") {
            self.storage.azure.account = account;
        }
        if let Ok(container) = env::var("LOCUS_AZURE_CONTAINER") {
            self.storage.azure.container = container;
        }
        if let Ok(key) = env::var("LOCUS_AZURE_ACCESS_KEY") {
            self.storage.azure.access_key = Some(key);
        }
        if let Ok(url) = env::var("LOCUS_HTTP_BASE_URL") {
            self.storage.http.base_url = url;
        }
        if let Ok(index) = env::var("LOCUS_HTTP_INDEX_FILE") {
            self.storage.http.index_file = index;
        }

        self.env_bool("LOCUS_SYNC_ENABLED", |c, v| c.sync.enabled = v);
        self.env_u64("LOCUS_SYNC_INTERVAL_SECS", |c, v| c.sync.interval_secs = v);
        self.env_bool("LOCUS_WATCHER_ENABLED", |c, v| c.watcher.enabled = v);
        self.env_u64("LOCUS_WATCHER_DEBOUNCE_MS", |c, v| c.watcher.debounce_ms = v);
        if let Ok(dirs) = env::var("LOCUS_WATCHER_DIRECTORIES") {
            self.watcher.directories = dirs.split(',').map(PathBuf::from).collect();
        }

        if let Ok(srid) = env::var("LOCUS_QUERY_DEFAULT_SRID") {
            match srid.parse::<i32>() {
                Ok(srid) => self.query.default_srid = srid,
                Err(_) => tracing::warn!(
                    "Invalid LOCUS_QUERY_DEFAULT_SRID value '{srid}': expected integer EPSG code"
                ),
            }
        }
        if let Ok(max) = env::var("LOCUS_QUERY_MAX_FEATURES") {
            match max.parse::<usize>() {
                Ok(max) if max > 0 => self.query.max_features = max,
                _ => tracing::warn!(
                    "Invalid LOCUS_QUERY_MAX_FEATURES value '{max}': expected positive integer"
                ),
            }
        }
        self.env_bool("LOCUS_QUERY_WITH_GEOMETRY", |c, v| {
            c.query.with_geometry = v
        });

        if let Ok(port) = env::var("LOCUS_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Invalid LOCUS_PORT value '{port}'"),
            }
        }
        self.env_u64("LOCUS_DOWNLOAD_TIMEOUT_SECS", |c, v| {
            c.download.timeout_secs = v
        });

        self
    }

    /// Resolve the full configuration: defaults, then the optional file named
    /// by `LOCUS_CONFIG`, then environment overrides.
    pub fn resolve() -> Result<Self> {
        let base = match env::var("LOCUS_CONFIG") {
            Ok(path) => Self::load_from_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(base.load_from_env())
    }

    /// Reject configurations the storage factory cannot act on.
    pub fn validate(&self) -> Result<()> {
        match self.storage.kind {
            StorageKind::S3 if self.storage.s3.bucket.is_empty() => {
                Err(LocusError::ConfigMissing {
                    key: "storage.s3.bucket".to_string(),
                })
            }
            StorageKind::Azure
                if self.storage.azure.account.is_empty()
                    || self.storage.azure.container.is_empty() =>
            {
                Err(LocusError::ConfigMissing {
                    key: "storage.azure.account/container".to_string(),
                })
            }
            StorageKind::Http if self.storage.http.base_url.is_empty() => {
                Err(LocusError::ConfigMissing {
                    key: "storage.http.base_url".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn env_bool(&mut self, key: &str, apply: impl FnOnce(&mut Self, bool)) {
        if let Ok(value) = env::var(key) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => apply(self, true),
                "0" | "false" | "no" | "off" => apply(self, false),
                _ => tracing::warn!("Invalid boolean for {key}: '{value}'"),
            }
        }
    }

    fn env_u64(&mut self, key: &str, apply: impl FnOnce(&mut Self, u64)) {
        if let Ok(value) = env::var(key) {
            match value.parse::<u64>() {
                Ok(parsed) => apply(self, parsed),
                Err(_) => tracing::warn!("Invalid integer for {key}: '{value}'"),
            }
        }
    }
}
